//! Headless raster surface backed by a tiny-skia pixmap.
//!
//! Used for server-side export, replay and pixel-level tests. Layout size
//! and device ratio are set by the owner instead of being read from a
//! window system.

use sketch_core::{
    Color, DrawingSurface, LineCap, LineJoin, PathCommand, PathStyle, Rect, SketchError,
    SketchResult, StrokePath,
};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::{export, RenderError, RenderResult};

/// Rasterization options.
#[derive(Debug, Clone, Copy)]
pub struct RasterConfig {
    /// Enable anti-aliasing.
    pub anti_aliasing: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            anti_aliasing: true,
        }
    }
}

/// CPU raster surface.
pub struct RasterSurface {
    pixmap: Pixmap,
    rect: Rect,
    device_ratio: f32,
    transform: Transform,
    config: RasterConfig,
    captured: Option<i32>,
}

impl RasterSurface {
    /// Create a surface laid out at `width` x `height` logical pixels.
    ///
    /// The backing pixmap is 1x1 until the surface controller resizes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial pixmap cannot be allocated.
    pub fn new(width: f32, height: f32, device_ratio: f32) -> RenderResult<Self> {
        Self::with_config(width, height, device_ratio, RasterConfig::default())
    }

    /// Create a surface with explicit rasterization options.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial pixmap cannot be allocated.
    pub fn with_config(
        width: f32,
        height: f32,
        device_ratio: f32,
        config: RasterConfig,
    ) -> RenderResult<Self> {
        let pixmap = Pixmap::new(1, 1)
            .ok_or_else(|| RenderError::Surface("Failed to create pixmap".to_string()))?;
        Ok(Self {
            pixmap,
            rect: Rect::from_size(width, height),
            device_ratio,
            transform: Transform::identity(),
            config,
            captured: None,
        })
    }

    /// Change the logical layout rectangle. Takes effect on the next resize.
    pub fn set_layout(&mut self, rect: Rect) {
        self.rect = rect;
    }

    /// Change the device ratio. Takes effect on the next resize.
    pub fn set_device_ratio(&mut self, ratio: f32) {
        self.device_ratio = ratio;
    }

    /// Backing pixels.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Backing width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Backing height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Pointer currently captured, if any.
    #[must_use]
    pub fn captured_pointer(&self) -> Option<i32> {
        self.captured
    }

    /// Encode the backing pixels as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = self.config.anti_aliasing;
        paint
    }

    /// Fill the cap shape of a path that never leaves its start point.
    ///
    /// Zero-length strokes are dropped by the stroker, so the cap is drawn
    /// explicitly the way a 2D canvas does.
    fn fill_dot(&mut self, x: f32, y: f32, style: &PathStyle) {
        let radius = style.width / 2.0;
        let shape = match style.cap {
            LineCap::Round => PathBuilder::from_circle(x, y, radius),
            LineCap::Square => {
                tiny_skia::Rect::from_xywh(x - radius, y - radius, style.width, style.width)
                    .map(PathBuilder::from_rect)
            }
            LineCap::Butt => None,
        };
        if let Some(shape) = shape {
            let paint = self.paint(style.color);
            self.pixmap
                .fill_path(&shape, &paint, FillRule::Winding, self.transform, None);
        }
    }
}

fn to_skia_path(path: &StrokePath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for command in path.commands() {
        match *command {
            PathCommand::MoveTo { x, y } => builder.move_to(x, y),
            PathCommand::QuadTo { cx, cy, x, y } => builder.quad_to(cx, cy, x, y),
            PathCommand::LineTo { x, y } => builder.line_to(x, y),
        }
    }
    builder.finish()
}

fn skia_cap(cap: LineCap) -> tiny_skia::LineCap {
    match cap {
        LineCap::Butt => tiny_skia::LineCap::Butt,
        LineCap::Round => tiny_skia::LineCap::Round,
        LineCap::Square => tiny_skia::LineCap::Square,
    }
}

fn skia_join(join: LineJoin) -> tiny_skia::LineJoin {
    match join {
        LineJoin::Miter => tiny_skia::LineJoin::Miter,
        LineJoin::Round => tiny_skia::LineJoin::Round,
        LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
    }
}

impl DrawingSurface for RasterSurface {
    fn bounding_rect(&self) -> Rect {
        self.rect
    }

    fn device_ratio(&self) -> f32 {
        self.device_ratio
    }

    fn set_backing_size(&mut self, width: u32, height: u32) -> SketchResult<()> {
        self.pixmap = Pixmap::new(width, height).ok_or_else(|| {
            SketchError::Surface(format!("Failed to allocate {width}x{height} pixmap"))
        })?;
        tracing::debug!("Raster surface reallocated to {}x{}", width, height);
        Ok(())
    }

    fn set_scale(&mut self, ratio: f32) {
        self.transform = Transform::from_scale(ratio, ratio);
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn stroke_path(&mut self, path: &StrokePath, style: &PathStyle) {
        if let Some((x, y)) = path.as_dot() {
            self.fill_dot(x, y, style);
            return;
        }

        let Some(skia_path) = to_skia_path(path) else {
            tracing::trace!("Skipping empty path");
            return;
        };
        let paint = self.paint(style.color);
        let stroke = tiny_skia::Stroke {
            width: style.width,
            line_cap: skia_cap(style.cap),
            line_join: skia_join(style.join),
            ..tiny_skia::Stroke::default()
        };
        self.pixmap
            .stroke_path(&skia_path, &paint, &stroke, self.transform, None);
    }

    fn capture_pointer(&mut self, pointer_id: i32) -> SketchResult<()> {
        self.captured = Some(pointer_id);
        Ok(())
    }

    fn release_pointer(&mut self, pointer_id: i32) {
        if self.captured == Some(pointer_id) {
            self.captured = None;
        }
    }

    fn to_data_url(&self) -> SketchResult<String> {
        let png = self.encode_png()?;
        Ok(export::data_url(&png, export::ExportFormat::Png))
    }
}
