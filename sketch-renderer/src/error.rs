//! Renderer error types.

use sketch_core::SketchError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rasterization or export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The pixel buffer could not be allocated.
    #[error("Surface allocation failed: {0}")]
    Surface(String),

    /// Encoding the pixels failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// The requested format is not compiled in.
    #[error("Unsupported export format: {0}")]
    Unsupported(String),
}

impl From<RenderError> for SketchError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Surface(msg) => SketchError::Surface(msg),
            RenderError::Export(msg) | RenderError::Unsupported(msg) => SketchError::Export(msg),
        }
    }
}
