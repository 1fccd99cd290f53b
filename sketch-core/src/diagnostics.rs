//! Debug summary published after every redraw.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PointerEvent, PointerEventKind, PointerType};

/// Placeholder shown when no pointer event has been handled yet.
pub const NO_EVENT: &str = "-";

/// The parts of a pointer event shown in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event kind.
    pub kind: PointerEventKind,
    /// Device type.
    pub pointer_type: PointerType,
    /// Pressure as reported by the device.
    pub pressure: Option<f32>,
}

impl From<&PointerEvent> for EventSummary {
    fn from(event: &PointerEvent) -> Self {
        Self {
            kind: event.kind,
            pointer_type: event.pointer_type,
            pressure: event.pressure,
        }
    }
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | p:", self.kind, self.pointer_type)?;
        match self.pressure {
            Some(p) => write!(f, "{p:.2}"),
            None => f.write_str("--"),
        }
    }
}

/// Snapshot of engine state for a debug display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Last handled pointer event, if any.
    pub last_event: Option<EventSummary>,
    /// Sum of point counts over all strokes.
    pub total_points: usize,
}

impl Diagnostics {
    /// Create a snapshot.
    #[must_use]
    pub fn new(last_event: Option<EventSummary>, total_points: usize) -> Self {
        Self {
            last_event,
            total_points,
        }
    }

    /// Pointer line of the display, or [`NO_EVENT`].
    #[must_use]
    pub fn pointer_status(&self) -> String {
        self.last_event
            .map_or_else(|| NO_EVENT.to_string(), |e| e.to_string())
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | points: {}", self.pointer_status(), self.total_points)
    }
}
