//! Midpoint-smoothed stroke rendering.
//!
//! A stroke of `n` samples becomes a path through the midpoints between
//! consecutive samples, using each interior sample as a quadratic control
//! point:
//!
//! ```text
//!   p0 ──quad(p1, m1)──▶ m1 ──quad(p2, m2)──▶ m2 ... ──line──▶ p[n-1]
//! ```
//!
//! `n - 2` quadratic segments plus one straight tail for `n >= 2`; a single
//! sample becomes a zero-length segment that round caps turn into a dot.

use crate::surface::{DrawingSurface, LineCap, LineJoin, PathStyle, StrokePath};
use crate::{InkSample, Stroke};

/// Build the smoothed path for a sample sequence.
///
/// Returns `None` for an empty sequence.
#[must_use]
pub fn smoothed_path(points: &[InkSample]) -> Option<StrokePath> {
    let (first, rest) = points.split_first()?;
    let mut path = StrokePath::begin(first.x, first.y);

    let Some(last) = rest.last() else {
        path.line_to(first.x, first.y);
        return Some(path);
    };

    for pair in rest.windows(2) {
        let (control, next) = (&pair[0], &pair[1]);
        let (mx, my) = control.midpoint(next);
        path.quad_to(control.x, control.y, mx, my);
    }
    path.line_to(last.x, last.y);

    Some(path)
}

/// Smoothed path for a stroke's samples.
#[must_use]
pub fn stroke_path(stroke: &Stroke) -> Option<StrokePath> {
    smoothed_path(stroke.points())
}

/// Paint style for a stroke: round caps and joins, the stroke's own width
/// and colour.
#[must_use]
pub fn stroke_style(stroke: &Stroke) -> PathStyle {
    PathStyle {
        width: stroke.width,
        color: stroke.color,
        cap: LineCap::Round,
        join: LineJoin::Round,
    }
}

/// Render one stroke onto `surface`. No-op for an empty stroke.
pub fn render_stroke<S: DrawingSurface + ?Sized>(surface: &mut S, stroke: &Stroke) {
    render_stroke_with(surface, stroke, &stroke_style(stroke));
}

/// Render one stroke's geometry with an overriding style.
pub fn render_stroke_with<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    stroke: &Stroke,
    style: &PathStyle,
) {
    if let Some(path) = stroke_path(stroke) {
        surface.stroke_path(&path, style);
    }
}
