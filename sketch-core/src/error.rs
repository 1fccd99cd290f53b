//! Error types for ink engine operations.

use thiserror::Error;

/// Result type for ink engine operations.
pub type SketchResult<T> = Result<T, SketchError>;

/// Errors that can occur in ink engine operations.
///
/// Out-of-order pointer events are not errors: the input session ignores
/// them. Only failures a caller can act on are surfaced here.
#[derive(Debug, Error)]
pub enum SketchError {
    /// A stroke was begun while another one is still current.
    #[error("A stroke is already in progress")]
    StrokeInProgress,

    /// Exclusive pointer capture could not be acquired.
    #[error("Pointer capture failed for pointer {pointer_id}: {reason}")]
    PointerCapture {
        /// Pointer that requested capture.
        pointer_id: i32,
        /// Host-provided failure description.
        reason: String,
    },

    /// A colour string could not be parsed.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Pen width must be finite and strictly positive.
    #[error("Invalid pen width: {0}")]
    InvalidPenWidth(f32),

    /// A restored stroke has no samples.
    #[error("Stroke {0} has no points")]
    EmptyStroke(usize),

    /// The drawing surface rejected an operation.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Encoding the surface contents failed or is unsupported.
    #[error("Export error: {0}")]
    Export(String),

    /// Event log or store serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
