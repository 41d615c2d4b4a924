//! View configuration
//!
//! Step sizes for the six view intents plus the zoom range. Loaded from a
//! JSON file where every field is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest page bitmap, in pixels, a render may allocate by default (512 MiB of RGBA)
pub const DEFAULT_MAX_BITMAP_PIXELS: u64 = 1 << 27;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a document view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Zoom applied by the first render pass.
    /// Default: 1.0
    pub initial_zoom: f64,

    /// Multiplier for one zoom-in step; zoom-out divides by it.
    /// Default: 1.2
    pub zoom_step: f64,

    /// Degrees added or removed by one rotate step.
    /// Default: 15.0
    pub rotation_step: f64,

    /// Blur radius (px) added or removed by one blur step.
    /// Default: 2.0
    pub blur_step: f64,

    /// Default: 0.1
    pub min_zoom: f64,

    /// Default: 16.0
    pub max_zoom: f64,

    /// Pages whose bitmap at the current zoom would exceed this many pixels
    /// fail to render instead of allocating.
    /// Default: 134217728 (2^27)
    pub max_bitmap_pixels: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            initial_zoom: 1.0,
            zoom_step: 1.2,
            rotation_step: 15.0,
            blur_step: 2.0,
            min_zoom: 0.1,
            max_zoom: 16.0,
            max_bitmap_pixels: DEFAULT_MAX_BITMAP_PIXELS,
        }
    }
}

impl ViewConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing fields keep their defaults. The result is validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;

        config.validate()?;
        Ok(config)
    }

    /// Set the zoom of the first render pass
    pub fn with_initial_zoom(mut self, zoom: f64) -> Self {
        self.initial_zoom = zoom;
        self
    }

    /// Set the zoom-in multiplier
    pub fn with_zoom_step(mut self, step: f64) -> Self {
        self.zoom_step = step;
        self
    }

    /// Set the rotation step in degrees
    pub fn with_rotation_step(mut self, degrees: f64) -> Self {
        self.rotation_step = degrees;
        self
    }

    /// Set the blur step in pixels
    pub fn with_blur_step(mut self, radius: f64) -> Self {
        self.blur_step = radius;
        self
    }

    /// Set the allowed zoom range
    pub fn with_zoom_range(mut self, min: f64, max: f64) -> Self {
        self.min_zoom = min;
        self.max_zoom = max;
        self
    }

    /// Set the per-page bitmap budget in pixels
    pub fn with_max_bitmap_pixels(mut self, pixels: u64) -> Self {
        self.max_bitmap_pixels = pixels;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;

        if !positive(self.min_zoom) || !positive(self.max_zoom) || self.min_zoom > self.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "zoom range [{}, {}] must be positive and ordered",
                self.min_zoom, self.max_zoom
            )));
        }

        if !positive(self.initial_zoom) {
            return Err(ConfigError::Invalid(format!(
                "initial zoom {} must be positive",
                self.initial_zoom
            )));
        }

        if !positive(self.zoom_step) {
            return Err(ConfigError::Invalid(format!(
                "zoom step {} must be positive",
                self.zoom_step
            )));
        }

        if !self.rotation_step.is_finite() || !self.blur_step.is_finite() {
            return Err(ConfigError::Invalid("rotation and blur steps must be finite".to_owned()));
        }

        if self.max_bitmap_pixels == 0 {
            return Err(ConfigError::Invalid("bitmap pixel budget must be positive".to_owned()));
        }

        Ok(())
    }
}
