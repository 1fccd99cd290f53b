//! Strokes and the values they are built from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{SketchError, SketchResult};

/// Pressure assumed when the device does not report one.
pub const DEFAULT_PRESSURE: f32 = 0.5;

/// One recorded point of a stroke, in logical surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InkSample {
    /// X position relative to the surface's left edge.
    pub x: f32,
    /// Y position relative to the surface's top edge.
    pub y: f32,
    /// Pressure in `[0, 1]`.
    pub pressure: f32,
    /// Host timestamp in milliseconds.
    pub timestamp: f64,
}

impl InkSample {
    /// Create a sample with default pressure and zero timestamp.
    #[must_use]
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            pressure: DEFAULT_PRESSURE,
            timestamp: 0.0,
        }
    }

    /// Midpoint between two samples.
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> (f32, f32) {
        ((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// An RGBA colour, written and parsed as CSS hex notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create an opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a colour with alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// CSS hex string (`#rrggbb`, or `#rrggbbaa` when translucent).
    #[must_use]
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = SketchError;

    fn from_str(s: &str) -> SketchResult<Self> {
        let invalid = || SketchError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        // Short forms repeat each nibble: #1a3 == #11aa33.
        let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);

        let parsed = match hex.len() {
            3 => (nibble(0), nibble(1), nibble(2), Ok(255)),
            4 => (nibble(0), nibble(1), nibble(2), nibble(3)),
            6 => (byte(0), byte(2), byte(4), Ok(255)),
            8 => (byte(0), byte(2), byte(4), byte(6)),
            _ => return Err(invalid()),
        };

        match parsed {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Self { r, g, b, a }),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = SketchError;

    fn try_from(value: String) -> SketchResult<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Drawing tool that produced a stroke.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Solid round-capped pen.
    #[default]
    Pen,
}

/// Pen settings applied to newly created strokes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenConfig {
    /// Line width in logical units.
    pub width: f32,
    /// Ink colour.
    pub color: Color,
}

impl PenConfig {
    /// Create a validated pen configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `width` is not finite and positive.
    pub fn new(width: f32, color: Color) -> SketchResult<Self> {
        let pen = Self { width, color };
        pen.validate()?;
        Ok(pen)
    }

    /// Check that the width can be rendered.
    ///
    /// # Errors
    ///
    /// Returns an error if `width` is not finite and positive.
    pub fn validate(&self) -> SketchResult<()> {
        if self.width.is_finite() && self.width > 0.0 {
            Ok(())
        } else {
            Err(SketchError::InvalidPenWidth(self.width))
        }
    }

    /// Style snapshot for a new stroke.
    #[must_use]
    pub fn style(&self) -> StrokeStyle {
        StrokeStyle {
            tool: Tool::Pen,
            width: self.width,
            color: self.color,
        }
    }
}

impl Default for PenConfig {
    fn default() -> Self {
        Self {
            width: 4.0,
            color: Color::rgb(0x11, 0x11, 0x11),
        }
    }
}

/// Style attributes fixed at stroke creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Tool.
    pub tool: Tool,
    /// Line width in logical units.
    pub width: f32,
    /// Ink colour.
    pub color: Color,
}

/// One continuous pen gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Tool.
    pub tool: Tool,
    /// Line width in logical units.
    pub width: f32,
    /// Ink colour.
    pub color: Color,
    points: Vec<InkSample>,
}

impl Stroke {
    /// Create an empty stroke with the given style.
    #[must_use]
    pub fn new(style: StrokeStyle) -> Self {
        Self {
            tool: style.tool,
            width: style.width,
            color: style.color,
            points: Vec::new(),
        }
    }

    /// Build a finished stroke from samples.
    #[must_use]
    pub fn from_points(style: StrokeStyle, points: Vec<InkSample>) -> Self {
        Self {
            points,
            ..Self::new(style)
        }
    }

    /// Recorded samples in order.
    #[must_use]
    pub fn points(&self) -> &[InkSample] {
        &self.points
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no sample was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Style the stroke was created with.
    #[must_use]
    pub fn style(&self) -> StrokeStyle {
        StrokeStyle {
            tool: self.tool,
            width: self.width,
            color: self.color,
        }
    }

    pub(crate) fn push(&mut self, sample: InkSample) {
        self.points.push(sample);
    }
}
