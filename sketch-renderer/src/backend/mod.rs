//! Drawing surface implementations.

pub mod raster;

pub use raster::{RasterConfig, RasterSurface};
