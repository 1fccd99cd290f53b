//! Drawing surface abstraction and the controller that keeps its backing
//! resolution in step with layout size and device pixel density.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, EventSummary};
use crate::{render, Color, SketchError, SketchResult, StrokeStore};

/// Axis-aligned rectangle in logical (CSS pixel) units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge relative to the viewport.
    pub left: f32,
    /// Top edge relative to the viewport.
    pub top: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Rectangle at the viewport origin.
    #[must_use]
    pub fn from_size(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }
}

/// One drawing command of a stroke path, in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    /// Start a subpath.
    MoveTo {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },
    /// Quadratic Bézier from the current point.
    QuadTo {
        /// Control point X.
        cx: f32,
        /// Control point Y.
        cy: f32,
        /// End point X.
        x: f32,
        /// End point Y.
        y: f32,
    },
    /// Straight segment from the current point.
    LineTo {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },
}

/// An open path ready to be stroked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokePath {
    commands: Vec<PathCommand>,
}

impl StrokePath {
    /// Start a path at `(x, y)`.
    #[must_use]
    pub fn begin(x: f32, y: f32) -> Self {
        Self {
            commands: vec![PathCommand::MoveTo { x, y }],
        }
    }

    /// Append a quadratic segment.
    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.commands.push(PathCommand::QuadTo { cx, cy, x, y });
    }

    /// Append a straight segment.
    pub fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::LineTo { x, y });
    }

    /// Commands in order.
    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Number of quadratic segments.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::QuadTo { .. }))
            .count()
    }

    /// Number of straight segments.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::LineTo { .. }))
            .count()
    }

    /// The point of a path that never leaves its start, if this is one.
    ///
    /// Stroked with round caps such a path is a dot.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn as_dot(&self) -> Option<(f32, f32)> {
        let (&first, rest) = self.commands.split_first()?;
        let PathCommand::MoveTo { x, y } = first else {
            return None;
        };
        let stays = rest.iter().all(|c| match *c {
            PathCommand::LineTo { x: lx, y: ly } => lx == x && ly == y,
            PathCommand::QuadTo { cx, cy, x: qx, y: qy } => {
                cx == x && cy == y && qx == x && qy == y
            }
            PathCommand::MoveTo { .. } => false,
        });
        (stays && !rest.is_empty()).then_some((x, y))
    }
}

/// Line cap style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    /// Flat end at the endpoint.
    Butt,
    /// Semicircular end.
    #[default]
    Round,
    /// Square end extending half the width.
    Square,
}

impl LineCap {
    /// Canvas `lineCap` keyword.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

/// Line join style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    /// Sharp corner.
    Miter,
    /// Rounded corner.
    #[default]
    Round,
    /// Cut corner.
    Bevel,
}

impl LineJoin {
    /// Canvas `lineJoin` keyword.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Miter => "miter",
            Self::Round => "round",
            Self::Bevel => "bevel",
        }
    }
}

/// Paint parameters for stroking a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    /// Width in logical units.
    pub width: f32,
    /// Stroke colour.
    pub color: Color,
    /// Cap style.
    pub cap: LineCap,
    /// Join style.
    pub join: LineJoin,
}

/// Minimal capability set the engine needs from a raster backend.
///
/// Drawing commands are given in logical units; the backend applies the
/// scale installed by [`DrawingSurface::set_scale`].
pub trait DrawingSurface {
    /// Current bounding rectangle of the surface in logical units.
    fn bounding_rect(&self) -> Rect;

    /// Device pixels per logical pixel as reported by the host.
    fn device_ratio(&self) -> f32;

    /// Reallocate the backing store. Discards existing pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot allocate the surface.
    fn set_backing_size(&mut self, width: u32, height: u32) -> SketchResult<()>;

    /// Replace the current transform with a uniform scale.
    fn set_scale(&mut self, ratio: f32);

    /// Clear every backing pixel to transparent.
    fn clear(&mut self);

    /// Stroke `path` with `style`.
    fn stroke_path(&mut self, path: &StrokePath, style: &PathStyle);

    /// Route all further events of `pointer_id` to this surface.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::PointerCapture`] if the host refuses.
    fn capture_pointer(&mut self, pointer_id: i32) -> SketchResult<()>;

    /// Release a capture taken by [`DrawingSurface::capture_pointer`].
    fn release_pointer(&mut self, _pointer_id: i32) {}

    /// Encode the current pixels as an image data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot encode its contents.
    fn to_data_url(&self) -> SketchResult<String> {
        Err(SketchError::Export(
            "surface does not support image export".to_string(),
        ))
    }
}

/// Normalise a host-reported device ratio.
#[must_use]
pub fn sanitize_device_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() {
        ratio.max(1.0)
    } else {
        1.0
    }
}

/// Backing pixel dimensions for a logical size at a device ratio.
///
/// Never returns a zero dimension.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn backing_dimensions(logical_width: f32, logical_height: f32, ratio: f32) -> (u32, u32) {
    let scale = |logical: f32| {
        let px = (logical.max(0.0) * ratio).floor();
        if px.is_finite() {
            (px as u32).max(1)
        } else {
            1
        }
    };
    (scale(logical_width), scale(logical_height))
}

/// Owns a [`DrawingSurface`] and performs resizes and full redraws.
pub struct SurfaceController<S> {
    surface: S,
    logical_size: (f32, f32),
    backing_size: (u32, u32),
    device_ratio: f32,
}

impl<S: DrawingSurface> SurfaceController<S> {
    /// Wrap a surface. Call [`SurfaceController::resize`] before drawing.
    #[must_use]
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            logical_size: (0.0, 0.0),
            backing_size: (1, 1),
            device_ratio: 1.0,
        }
    }

    /// Re-read layout size and device ratio, reallocate the backing store
    /// and repaint.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be reallocated.
    pub fn resize(
        &mut self,
        store: &StrokeStore,
        last_event: Option<&EventSummary>,
    ) -> SketchResult<Diagnostics> {
        let rect = self.surface.bounding_rect();
        let ratio = sanitize_device_ratio(self.surface.device_ratio());
        let (width, height) = backing_dimensions(rect.width, rect.height, ratio);

        self.surface.set_backing_size(width, height)?;
        self.surface.set_scale(ratio);

        self.logical_size = (rect.width, rect.height);
        self.backing_size = (width, height);
        self.device_ratio = ratio;

        tracing::debug!(
            "Surface resized to {}x{} logical, {width}x{height} backing at ratio {ratio}",
            rect.width,
            rect.height
        );

        Ok(self.redraw(store, last_event))
    }

    /// Clear the surface and paint every stroke in insertion order.
    pub fn redraw(
        &mut self,
        store: &StrokeStore,
        last_event: Option<&EventSummary>,
    ) -> Diagnostics {
        self.surface.clear();
        for stroke in store.strokes() {
            render::render_stroke(&mut self.surface, stroke);
        }

        let diagnostics = Diagnostics::new(last_event.copied(), store.total_points());
        tracing::trace!(strokes = store.len(), "Redraw: {diagnostics}");
        diagnostics
    }

    /// Logical size as of the last resize.
    #[must_use]
    pub fn logical_size(&self) -> (f32, f32) {
        self.logical_size
    }

    /// Backing pixel size as of the last resize.
    #[must_use]
    pub fn backing_size(&self) -> (u32, u32) {
        self.backing_size
    }

    /// Device ratio applied at the last resize.
    #[must_use]
    pub fn device_ratio(&self) -> f32 {
        self.device_ratio
    }

    /// The wrapped surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the wrapped surface.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Unwrap the surface.
    #[must_use]
    pub fn into_surface(self) -> S {
        self.surface
    }
}

/// A call recorded by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    /// `set_backing_size(width, height)`.
    SetBackingSize(u32, u32),
    /// `set_scale(ratio)`.
    SetScale(f32),
    /// `clear()`.
    Clear,
    /// `stroke_path(path, style)`.
    Stroke(StrokePath, PathStyle),
    /// `capture_pointer(id)`.
    Capture(i32),
    /// `release_pointer(id)`.
    Release(i32),
}

/// In-memory surface that records every call. Used to test the engine
/// without a raster backend.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    rect: Rect,
    device_ratio: f32,
    refuse_capture: bool,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    /// Surface of the given logical size at device ratio 1.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            rect: Rect::from_size(width, height),
            device_ratio: 1.0,
            refuse_capture: false,
            ops: Vec::new(),
        }
    }

    /// Set the reported device ratio.
    #[must_use]
    pub fn with_device_ratio(mut self, ratio: f32) -> Self {
        self.device_ratio = ratio;
        self
    }

    /// Make every pointer capture request fail.
    #[must_use]
    pub fn refusing_capture(mut self) -> Self {
        self.refuse_capture = true;
        self
    }

    /// Move or resize the reported bounding rectangle.
    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    /// Change the reported device ratio.
    pub fn set_device_ratio(&mut self, ratio: f32) {
        self.device_ratio = ratio;
    }

    /// Every call recorded so far.
    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Calls recorded since the most recent `clear()`, i.e. the last frame.
    #[must_use]
    pub fn last_frame(&self) -> &[SurfaceOp] {
        let start = self
            .ops
            .iter()
            .rposition(|op| matches!(op, SurfaceOp::Clear))
            .map_or(0, |i| i + 1);
        &self.ops[start..]
    }

    /// Paths stroked in the last frame.
    #[must_use]
    pub fn last_frame_paths(&self) -> Vec<&StrokePath> {
        self.last_frame()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Stroke(path, _) => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls.
    pub fn reset(&mut self) {
        self.ops.clear();
    }
}

impl DrawingSurface for RecordingSurface {
    fn bounding_rect(&self) -> Rect {
        self.rect
    }

    fn device_ratio(&self) -> f32 {
        self.device_ratio
    }

    fn set_backing_size(&mut self, width: u32, height: u32) -> SketchResult<()> {
        self.ops.push(SurfaceOp::SetBackingSize(width, height));
        Ok(())
    }

    fn set_scale(&mut self, ratio: f32) {
        self.ops.push(SurfaceOp::SetScale(ratio));
    }

    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }

    fn stroke_path(&mut self, path: &StrokePath, style: &PathStyle) {
        self.ops.push(SurfaceOp::Stroke(path.clone(), *style));
    }

    fn capture_pointer(&mut self, pointer_id: i32) -> SketchResult<()> {
        if self.refuse_capture {
            return Err(SketchError::PointerCapture {
                pointer_id,
                reason: "capture refused".to_string(),
            });
        }
        self.ops.push(SurfaceOp::Capture(pointer_id));
        Ok(())
    }

    fn release_pointer(&mut self, pointer_id: i32) {
        self.ops.push(SurfaceOp::Release(pointer_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InkSample, PenConfig};

    fn store_with(points: &[(f32, f32)]) -> StrokeStore {
        let mut store = StrokeStore::new();
        store.begin_stroke(PenConfig::default().style()).expect("begin");
        for &(x, y) in points {
            store.append_sample(InkSample::at(x, y));
        }
        store.end_stroke();
        store
    }

    #[test]
    fn test_backing_size_scales_by_ratio() {
        assert_eq!(backing_dimensions(200.0, 100.0, 2.0), (400, 200));
        assert_eq!(backing_dimensions(100.5, 33.3, 1.5), (150, 49));
    }

    #[test]
    fn test_backing_size_never_zero() {
        assert_eq!(backing_dimensions(0.0, 0.0, 2.0), (1, 1));
        assert_eq!(backing_dimensions(-5.0, 0.2, 1.0), (1, 1));
        assert_eq!(backing_dimensions(f32::INFINITY, 10.0, 1.0), (1, 10));
    }

    #[test]
    fn test_cap_and_join_keywords() {
        assert_eq!(LineCap::default().as_str(), "round");
        assert_eq!(LineCap::Square.as_str(), "square");
        assert_eq!(LineJoin::default().as_str(), "round");
        assert_eq!(LineJoin::Miter.as_str(), "miter");
    }

    #[test]
    fn test_device_ratio_is_sanitized() {
        assert!((sanitize_device_ratio(2.0) - 2.0).abs() < f32::EPSILON);
        assert!((sanitize_device_ratio(0.0) - 1.0).abs() < f32::EPSILON);
        assert!((sanitize_device_ratio(0.75) - 1.0).abs() < f32::EPSILON);
        assert!((sanitize_device_ratio(f32::NAN) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_resize_sets_backing_then_scale_then_redraws() {
        let surface = RecordingSurface::new(200.0, 100.0).with_device_ratio(2.0);
        let mut controller = SurfaceController::new(surface);
        let store = store_with(&[(1.0, 1.0), (2.0, 2.0)]);

        controller.resize(&store, None).expect("resize");

        assert_eq!(controller.backing_size(), (400, 200));
        assert_eq!(controller.logical_size(), (200.0, 100.0));
        let ops = controller.surface().ops();
        assert_eq!(ops[0], SurfaceOp::SetBackingSize(400, 200));
        assert_eq!(ops[1], SurfaceOp::SetScale(2.0));
        assert_eq!(ops[2], SurfaceOp::Clear);
        assert!(matches!(ops[3], SurfaceOp::Stroke(..)));
    }

    #[test]
    fn test_redraw_paints_in_insertion_order() {
        let mut store = store_with(&[(1.0, 1.0)]);
        store.begin_stroke(PenConfig::default().style()).expect("begin");
        store.append_sample(InkSample::at(50.0, 50.0));
        store.end_stroke();

        let mut controller = SurfaceController::new(RecordingSurface::new(100.0, 100.0));
        let diagnostics = controller.redraw(&store, None);

        let paths = controller.surface().last_frame_paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].as_dot(), Some((1.0, 1.0)));
        assert_eq!(paths[1].as_dot(), Some((50.0, 50.0)));
        assert_eq!(diagnostics.total_points, 2);
    }

    #[test]
    fn test_redraw_is_repeatable() {
        let store = store_with(&[(0.0, 0.0), (10.0, 5.0), (20.0, 0.0)]);
        let mut controller = SurfaceController::new(RecordingSurface::new(100.0, 100.0));
        controller.redraw(&store, None);
        let first = controller.surface().last_frame().to_vec();
        controller.redraw(&store, None);
        assert_eq!(controller.surface().last_frame(), first.as_slice());
    }

    #[test]
    fn test_dot_detection() {
        let mut dot = StrokePath::begin(3.0, 4.0);
        dot.line_to(3.0, 4.0);
        assert_eq!(dot.as_dot(), Some((3.0, 4.0)));

        let mut line = StrokePath::begin(3.0, 4.0);
        line.line_to(5.0, 4.0);
        assert_eq!(line.as_dot(), None);

        assert_eq!(StrokePath::begin(0.0, 0.0).as_dot(), None);
    }
}
