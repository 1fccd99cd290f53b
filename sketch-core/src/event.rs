//! Pointer input events delivered by the host environment.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerEventKind {
    /// Button or contact pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button or contact released.
    Up,
    /// The host cancelled the gesture (e.g., palm rejection).
    Cancel,
    /// The pointer left the surface.
    Leave,
}

impl PointerEventKind {
    /// DOM event name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Down => "pointerdown",
            Self::Move => "pointermove",
            Self::Up => "pointerup",
            Self::Cancel => "pointercancel",
            Self::Leave => "pointerleave",
        }
    }

    /// Parse a DOM event name.
    #[must_use]
    pub fn from_dom(name: &str) -> Option<Self> {
        match name {
            "pointerdown" => Some(Self::Down),
            "pointermove" => Some(Self::Move),
            "pointerup" => Some(Self::Up),
            "pointercancel" => Some(Self::Cancel),
            "pointerleave" => Some(Self::Leave),
            _ => None,
        }
    }

    /// Whether this event terminates a gesture.
    #[must_use]
    pub fn ends_gesture(self) -> bool {
        matches!(self, Self::Up | Self::Cancel | Self::Leave)
    }
}

impl fmt::Display for PointerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical device that produced a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    /// Mouse or trackpad.
    #[default]
    Mouse,
    /// Stylus.
    Pen,
    /// Finger on a touch screen.
    Touch,
    /// Anything the host could not classify.
    Unknown,
}

impl PointerType {
    /// DOM `pointerType` string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mouse => "mouse",
            Self::Pen => "pen",
            Self::Touch => "touch",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a DOM `pointerType` string. Unrecognised values map to `Unknown`.
    #[must_use]
    pub fn from_dom(name: &str) -> Self {
        match name {
            "mouse" => Self::Mouse,
            "pen" => Self::Pen,
            "touch" => Self::Touch,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for PointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw pointer event in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Event kind.
    pub kind: PointerEventKind,
    /// Host pointer identifier.
    #[serde(default = "default_pointer_id")]
    pub pointer_id: i32,
    /// Device type.
    #[serde(default)]
    pub pointer_type: PointerType,
    /// X position relative to the viewport.
    pub client_x: f32,
    /// Y position relative to the viewport.
    pub client_y: f32,
    /// Pressure reported by the device, if any.
    #[serde(default)]
    pub pressure: Option<f32>,
    /// High-resolution timestamp in milliseconds.
    #[serde(default)]
    pub timestamp: f64,
}

fn default_pointer_id() -> i32 {
    1
}

impl PointerEvent {
    /// Create a mouse event for the primary pointer with no pressure reported.
    #[must_use]
    pub fn new(kind: PointerEventKind, client_x: f32, client_y: f32, timestamp: f64) -> Self {
        Self {
            kind,
            pointer_id: default_pointer_id(),
            pointer_type: PointerType::Mouse,
            client_x,
            client_y,
            pressure: None,
            timestamp,
        }
    }

    /// Set the pointer identifier.
    #[must_use]
    pub fn with_pointer(mut self, pointer_id: i32, pointer_type: PointerType) -> Self {
        self.pointer_id = pointer_id;
        self.pointer_type = pointer_type;
        self
    }

    /// Set the reported pressure.
    #[must_use]
    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = Some(pressure);
        self
    }
}
