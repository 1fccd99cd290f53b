//! # Sketch Ink Core
//!
//! Backend-agnostic ink engine: turns pointer events into strokes and
//! repaints them onto a resizable raster surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                SketchSession                │
//! ├─────────────────────────────────────────────┤
//! │  Input state     │  Stroke Store            │
//! │  - Idle/Drawing  │  - Ordered strokes       │
//! │  - Point Sampler │  - Undo / clear          │
//! ├─────────────────────────────────────────────┤
//! │  Surface Controller  →  Curve Renderer      │
//! │  - Device ratio      - Midpoint quadratics  │
//! │  - Full redraw       - Round caps/joins     │
//! └──────────────────────┬──────────────────────┘
//!                        │ DrawingSurface
//!              raster / DOM / recording backend
//! ```
//!
//! Everything is synchronous and single-threaded: the host's event loop owns
//! the [`SketchSession`] and feeds it one [`SessionEvent`] at a time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod render;
pub mod sample;
pub mod session;
pub mod store;
pub mod stroke;
pub mod surface;

pub use config::{SketchConfig, DEFAULT_MASK_MARGIN};
pub use diagnostics::{Diagnostics, EventSummary};
pub use error::{SketchError, SketchResult};
pub use event::{PointerEvent, PointerEventKind, PointerType};
pub use sample::{PointSampler, SamplerConfig};
pub use session::{Dispatch, InputState, SessionEvent, SketchSession};
pub use store::{StrokeHandle, StrokeStore};
pub use stroke::{Color, InkSample, PenConfig, Stroke, StrokeStyle, Tool, DEFAULT_PRESSURE};
pub use surface::{
    DrawingSurface, LineCap, LineJoin, PathCommand, PathStyle, RecordingSurface, Rect,
    StrokePath, SurfaceController, SurfaceOp,
};

/// Sketch core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
