//! Ordered stroke history with a single current stroke.

use serde::{Deserialize, Serialize};

use crate::{InkSample, SketchError, SketchResult, Stroke, StrokeStyle};

/// Index of a stroke within the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrokeHandle(usize);

impl StrokeHandle {
    /// Position of the stroke in paint order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// All strokes of a drawing session, in paint order.
///
/// At most one stroke is current; only the current stroke accepts samples.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrokeStore {
    strokes: Vec<Stroke>,
    #[serde(skip)]
    current: Option<usize>,
}

impl StrokeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new, empty stroke and make it current.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::StrokeInProgress`] if a stroke is already current.
    pub fn begin_stroke(&mut self, style: StrokeStyle) -> SketchResult<StrokeHandle> {
        if self.current.is_some() {
            return Err(SketchError::StrokeInProgress);
        }
        let index = self.strokes.len();
        self.strokes.push(Stroke::new(style));
        self.current = Some(index);
        tracing::trace!(index, width = style.width, color = %style.color, "Stroke begun");
        Ok(StrokeHandle(index))
    }

    /// Append a sample to the current stroke.
    ///
    /// Returns `false` when no stroke is current; the sample is dropped.
    pub fn append_sample(&mut self, sample: InkSample) -> bool {
        let Some(stroke) = self.current.and_then(|i| self.strokes.get_mut(i)) else {
            tracing::trace!("Sample without current stroke ignored");
            return false;
        };
        stroke.push(sample);
        true
    }

    /// Freeze the current stroke. Idempotent.
    ///
    /// A current stroke that never received a sample is discarded.
    pub fn end_stroke(&mut self) {
        let Some(index) = self.current.take() else {
            return;
        };
        if self.strokes.get(index).is_some_and(Stroke::is_empty) {
            self.strokes.remove(index);
            tracing::debug!(index, "Discarded stroke without samples");
        }
    }

    /// Remove the last stroke, current or not.
    pub fn undo(&mut self) -> Option<Stroke> {
        let removed = self.strokes.pop()?;
        if self.current == Some(self.strokes.len()) {
            self.current = None;
        }
        tracing::debug!(remaining = self.strokes.len(), "Undo");
        Some(removed)
    }

    /// Remove every stroke and release the current marker.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.current = None;
        tracing::debug!("Store cleared");
    }

    /// Strokes in paint order.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Stroke for a handle, if it still exists.
    #[must_use]
    pub fn get(&self, handle: StrokeHandle) -> Option<&Stroke> {
        self.strokes.get(handle.0)
    }

    /// The stroke currently receiving samples.
    #[must_use]
    pub fn current(&self) -> Option<&Stroke> {
        self.current.and_then(|i| self.strokes.get(i))
    }

    /// Whether a stroke is current.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.current.is_some()
    }

    /// Number of strokes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// Whether the store holds no strokes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Sum of point counts over all strokes.
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }

    /// Serialize the finished strokes to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> SketchResult<String> {
        serde_json::to_string(self).map_err(SketchError::Serialization)
    }

    /// Restore a store from JSON. No stroke is current afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails, or if a stroke has no
    /// points or a width that is not finite and positive.
    pub fn from_json(json: &str) -> SketchResult<Self> {
        let store: Self = serde_json::from_str(json).map_err(SketchError::Serialization)?;
        for (index, stroke) in store.strokes.iter().enumerate() {
            if !(stroke.width.is_finite() && stroke.width > 0.0) {
                return Err(SketchError::InvalidPenWidth(stroke.width));
            }
            if stroke.is_empty() {
                return Err(SketchError::EmptyStroke(index));
            }
        }
        Ok(store)
    }
}
