//! Conversion of raw pointer events into ink samples.

use serde::{Deserialize, Serialize};

use crate::stroke::DEFAULT_PRESSURE;
use crate::surface::Rect;
use crate::{InkSample, PointerEvent};

/// Tuning for pointer sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Treat a reported pressure of exactly zero as "not reported".
    ///
    /// Mice and hovering styluses report `0`; enabling this draws them at the
    /// default pressure instead.
    pub zero_pressure_is_missing: bool,
}

/// Stateless pointer sampler.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointSampler {
    config: SamplerConfig,
}

impl PointSampler {
    /// Create a sampler with the given configuration.
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Sampler configuration.
    #[must_use]
    pub fn config(&self) -> SamplerConfig {
        self.config
    }

    /// Convert `event` into a sample relative to `rect`.
    ///
    /// `rect` must be queried for every event since the surface can move
    /// between events (scrolling, layout changes).
    #[must_use]
    pub fn sample(&self, event: &PointerEvent, rect: Rect) -> InkSample {
        InkSample {
            x: event.client_x - rect.left,
            y: event.client_y - rect.top,
            pressure: self.pressure(event.pressure),
            timestamp: event.timestamp,
        }
    }

    #[allow(clippy::float_cmp)]
    fn pressure(&self, reported: Option<f32>) -> f32 {
        match reported {
            Some(p) if !p.is_finite() => DEFAULT_PRESSURE,
            Some(p) if p == 0.0 && self.config.zero_pressure_is_missing => DEFAULT_PRESSURE,
            Some(p) => p.clamp(0.0, 1.0),
            None => DEFAULT_PRESSURE,
        }
    }
}
