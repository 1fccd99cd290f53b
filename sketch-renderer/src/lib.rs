//! # Sketch Ink Renderer
//!
//! Software rasterization for sketches, built on tiny-skia.
//!
//! ```text
//! ┌──────────────┐  DrawingSurface  ┌───────────────┐  encode  ┌────────────┐
//! │ SketchSession│ ───────────────> │ RasterSurface │ ───────> │ PNG / JPEG │
//! └──────────────┘                  └───────────────┘          │ data: URI  │
//!        │ strokes                                             └────────────┘
//!        └──────────────> MaskRenderer ──> mask PNG
//! ```
//!
//! The raster surface reproduces what the browser canvas shows, pixel for
//! pixel up to anti-aliasing, so sketches can be replayed and exported
//! without a DOM.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod error;
pub mod export;

pub use backend::{RasterConfig, RasterSurface};
pub use error::{RenderError, RenderResult};
pub use export::{data_url, ExportConfig, ExportFormat, MaskRenderer, SketchExporter};
