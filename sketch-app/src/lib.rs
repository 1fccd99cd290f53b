//! # Sketch Ink WASM Application
//!
//! Browser host for the ink engine: a [`CanvasSurface`] over a 2D canvas
//! context, and a [`SketchApp`] that JavaScript feeds DOM pointer events.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! wasm-pack build --target web sketch-app
//! ```
//!
//! Then wire it up in JavaScript:
//! ```javascript
//! import init, { SketchApp } from './pkg/sketch_app.js';
//!
//! await init();
//! const app = new SketchApp('sketchCanvas');
//! app.bindStatus('pointerStatus', 'pointsStatus');
//!
//! for (const type of ['pointerdown', 'pointermove', 'pointerup',
//!                     'pointercancel', 'pointerleave']) {
//!     canvas.addEventListener(type, (e) => app.handlePointer(e));
//! }
//! new ResizeObserver(() => app.resize()).observe(canvas);
//! undoButton.onclick = () => app.undo();
//! clearButton.onclick = () => app.clear();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use sketch_core::{
    Color, Diagnostics, DrawingSurface, PathCommand, PathStyle, PenConfig, PointerEventKind,
    PointerType, Rect, SketchConfig, SketchError, SketchResult, SketchSession, StrokePath,
};
use sketch_renderer::MaskRenderer;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, Window};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("Sketch Ink WASM initialized");
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Drawing surface over an `HtmlCanvasElement` and its 2D context.
pub struct CanvasSurface {
    window: Window,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Wrap a canvas element.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no window or the 2D context is unavailable.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| JsValue::from_str("Failed to get 2D context"))?
            .ok_or_else(|| JsValue::from_str("2D context not available"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| JsValue::from_str("Failed to cast to 2D context"))?;
        Ok(Self {
            window,
            canvas,
            ctx,
        })
    }

    /// The wrapped canvas element.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl DrawingSurface for CanvasSurface {
    #[allow(clippy::cast_possible_truncation)]
    fn bounding_rect(&self) -> Rect {
        let rect = self.canvas.get_bounding_client_rect();
        Rect {
            left: rect.left() as f32,
            top: rect.top() as f32,
            width: rect.width() as f32,
            height: rect.height() as f32,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn device_ratio(&self) -> f32 {
        self.window.device_pixel_ratio() as f32
    }

    fn set_backing_size(&mut self, width: u32, height: u32) -> SketchResult<()> {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        Ok(())
    }

    fn set_scale(&mut self, ratio: f32) {
        let r = f64::from(ratio);
        if let Err(err) = self.ctx.set_transform(r, 0.0, 0.0, r, 0.0, 0.0) {
            tracing::warn!("setTransform failed: {:?}", err);
        }
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
    }

    fn stroke_path(&mut self, path: &StrokePath, style: &PathStyle) {
        self.ctx.set_stroke_style_str(&style.color.to_hex());
        self.ctx.set_line_width(f64::from(style.width));
        self.ctx.set_line_cap(style.cap.as_str());
        self.ctx.set_line_join(style.join.as_str());

        self.ctx.begin_path();
        for command in path.commands() {
            match *command {
                PathCommand::MoveTo { x, y } => self.ctx.move_to(f64::from(x), f64::from(y)),
                PathCommand::QuadTo { cx, cy, x, y } => self.ctx.quadratic_curve_to(
                    f64::from(cx),
                    f64::from(cy),
                    f64::from(x),
                    f64::from(y),
                ),
                PathCommand::LineTo { x, y } => self.ctx.line_to(f64::from(x), f64::from(y)),
            }
        }
        self.ctx.stroke();
    }

    fn capture_pointer(&mut self, pointer_id: i32) -> SketchResult<()> {
        self.canvas
            .set_pointer_capture(pointer_id)
            .map_err(|err| SketchError::PointerCapture {
                pointer_id,
                reason: format!("{err:?}"),
            })
    }

    fn release_pointer(&mut self, pointer_id: i32) {
        if self.canvas.has_pointer_capture(pointer_id) {
            if let Err(err) = self.canvas.release_pointer_capture(pointer_id) {
                tracing::debug!("releasePointerCapture({pointer_id}) failed: {:?}", err);
            }
        }
    }

    fn to_data_url(&self) -> SketchResult<String> {
        self.canvas
            .to_data_url()
            .map_err(|err| SketchError::Export(format!("{err:?}")))
    }
}

/// Convert a DOM pointer event. Returns `None` for non-pointer event types.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn convert_pointer_event(event: &web_sys::PointerEvent) -> Option<sketch_core::PointerEvent> {
    let kind = PointerEventKind::from_dom(&event.type_())?;
    Some(
        sketch_core::PointerEvent::new(
            kind,
            event.client_x() as f32,
            event.client_y() as f32,
            event.time_stamp(),
        )
        .with_pointer(event.pointer_id(), PointerType::from_dom(&event.pointer_type()))
        .with_pressure(event.pressure()),
    )
}

/// The sketch widget for WASM.
#[wasm_bindgen]
pub struct SketchApp {
    session: SketchSession<CanvasSurface>,
    mask_margin: f32,
}

#[wasm_bindgen]
impl SketchApp {
    /// Create a sketch attached to the canvas element with the given ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas element is not found or 2D context fails.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<SketchApp, JsValue> {
        Self::with_config(canvas_id, "{}")
    }

    /// Create a sketch with a JSON configuration
    /// (`{"pen":{"width":4,"color":"#111"},"mask_margin":8}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas is missing or the configuration is invalid.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(canvas_id: &str, config_json: &str) -> Result<SketchApp, JsValue> {
        let config = SketchConfig::from_json(config_json).map_err(js_error)?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("Canvas element '{canvas_id}' not found")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("Element is not a canvas"))?;

        Self::from_canvas(canvas, config)
    }

    /// Feed a DOM pointer event. Returns whether the session handled it;
    /// handled events have their default action prevented.
    ///
    /// # Errors
    ///
    /// Returns an error if pointer capture fails on pointerdown.
    #[wasm_bindgen(js_name = handlePointer)]
    pub fn handle_pointer(&mut self, event: &web_sys::PointerEvent) -> Result<bool, JsValue> {
        let Some(converted) = convert_pointer_event(event) else {
            tracing::trace!("Ignoring DOM event '{}'", event.type_());
            return Ok(false);
        };
        let handled = self
            .session
            .handle_pointer(&converted)
            .map_err(js_error)?
            .is_handled();
        if handled {
            event.prevent_default();
        }
        Ok(handled)
    }

    /// Re-read the canvas layout and device ratio, then repaint.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas cannot be resized.
    pub fn resize(&mut self) -> Result<(), JsValue> {
        self.session.resize().map_err(js_error)
    }

    /// Remove the most recent stroke.
    pub fn undo(&mut self) {
        self.session.undo();
    }

    /// Remove all strokes.
    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// Change the pen for subsequent strokes.
    ///
    /// # Errors
    ///
    /// Returns an error if the width is not positive or the colour is not hex.
    #[wasm_bindgen(js_name = setPen)]
    pub fn set_pen(&mut self, width: f32, color: &str) -> Result<(), JsValue> {
        let color: Color = color.parse().map_err(js_error)?;
        let pen = PenConfig::new(width, color).map_err(js_error)?;
        self.session.set_pen(pen).map_err(js_error)
    }

    /// Encode the canvas as a PNG data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas refuses to export (e.g. it is tainted).
    #[wasm_bindgen(js_name = toDataUrl)]
    pub fn to_data_url(&self) -> Result<String, JsValue> {
        self.session.export_data_url().map_err(js_error)
    }

    /// Encode an edit mask matching the canvas as a PNG data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the mask cannot be rendered or encoded.
    #[wasm_bindgen(js_name = maskDataUrl)]
    pub fn mask_data_url(&self) -> Result<String, JsValue> {
        let controller = self.session.controller();
        MaskRenderer::new(self.mask_margin)
            .render_data_url(
                self.session.store(),
                controller.backing_size(),
                controller.device_ratio(),
            )
            .map_err(js_error)
    }

    /// Serialize the strokes as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    #[wasm_bindgen(js_name = strokesJson)]
    pub fn strokes_json(&self) -> Result<String, JsValue> {
        self.session.store().to_json().map_err(js_error)
    }

    /// Mirror diagnostics into two elements after every redraw.
    ///
    /// # Errors
    ///
    /// Returns an error if either element is missing.
    #[wasm_bindgen(js_name = bindStatus)]
    pub fn bind_status(&mut self, pointer_id: &str, points_id: &str) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("No document object"))?;
        let find = |id: &str| {
            document
                .get_element_by_id(id)
                .ok_or_else(|| JsValue::from_str(&format!("Element '{id}' not found")))
        };
        let pointer_el: Element = find(pointer_id)?;
        let points_el: Element = find(points_id)?;

        let write = move |d: &Diagnostics| {
            pointer_el.set_text_content(Some(&d.pointer_status()));
            points_el.set_text_content(Some(&d.total_points.to_string()));
        };
        write(&self.session.diagnostics());
        self.session.set_diagnostics_sink(write);
        Ok(())
    }

    /// Last pointer event summary, or `-`.
    #[wasm_bindgen(js_name = pointerStatus)]
    #[must_use]
    pub fn pointer_status(&self) -> String {
        self.session.diagnostics().pointer_status()
    }

    /// Total points across all strokes.
    #[wasm_bindgen(js_name = totalPoints)]
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.session.store().total_points()
    }

    /// Number of strokes.
    #[wasm_bindgen(js_name = strokeCount)]
    #[must_use]
    pub fn stroke_count(&self) -> usize {
        self.session.store().len()
    }

    /// Whether a gesture is in progress.
    #[wasm_bindgen(js_name = isDrawing)]
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.session.store().is_drawing()
    }

    /// Full diagnostics line.
    #[must_use]
    pub fn diagnostics(&self) -> String {
        self.session.diagnostics().to_string()
    }
}

impl SketchApp {
    /// Create a sketch on an existing canvas element.
    ///
    /// # Errors
    ///
    /// Returns an error if the 2D context is unavailable or the initial
    /// resize fails.
    pub fn from_canvas(canvas: HtmlCanvasElement, config: SketchConfig) -> Result<Self, JsValue> {
        let surface = CanvasSurface::new(canvas)?;
        let session = SketchSession::new(surface, config).map_err(js_error)?;
        tracing::debug!(
            "Sketch attached, backing {:?}",
            session.controller().backing_size()
        );
        Ok(Self {
            session,
            mask_margin: config.mask_margin,
        })
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &SketchSession<CanvasSurface> {
        &self.session
    }
}

/// Library version.
#[wasm_bindgen]
#[must_use]
pub fn version() -> String {
    sketch_core::VERSION.to_string()
}
