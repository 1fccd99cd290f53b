//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::{PenConfig, SamplerConfig, SketchError, SketchResult};

/// Settings for a drawing session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Pen used for new strokes until changed.
    pub pen: PenConfig,
    /// Pointer sampling options.
    pub sampler: SamplerConfig,
    /// Logical pixels added around each stroke when exporting an edit mask.
    pub mask_margin: f32,
}

/// Default mask dilation in logical pixels.
pub const DEFAULT_MASK_MARGIN: f32 = 8.0;

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            pen: PenConfig::default(),
            sampler: SamplerConfig::default(),
            mask_margin: DEFAULT_MASK_MARGIN,
        }
    }
}

impl SketchConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the pen is invalid.
    /// A negative or non-finite mask margin is reset to zero.
    pub fn from_json(json: &str) -> SketchResult<Self> {
        let mut config: Self = serde_json::from_str(json).map_err(SketchError::Serialization)?;
        config.pen.validate()?;
        if !config.mask_margin.is_finite() || config.mask_margin < 0.0 {
            tracing::warn!(margin = config.mask_margin, "Invalid mask margin, using 0");
            config.mask_margin = 0.0;
        }
        Ok(config)
    }
}
