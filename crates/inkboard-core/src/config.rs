//! Editor configuration.

use crate::history::DEFAULT_MAX_HISTORY;
use crate::viewport::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid zoom range: min {min} must be below max {max}")]
    ZoomRange { min: f64, max: f64 },
    #[error("Invalid value for {field}: {value} (must be positive)")]
    NonPositive { field: &'static str, value: f64 },
}

/// Tunables of the editing core. Every field has a default, so a partial
/// JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo depth.
    pub max_history: usize,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Element hit tolerance in screen pixels.
    pub hit_tolerance: f64,
    /// Handle hit tolerance in screen pixels.
    pub handle_tolerance: f64,
    /// How far outside a shape an arrow endpoint still binds (world units).
    pub bind_snap_radius: f64,
    /// Smallest width/height a resize can produce, and the drag distance
    /// below which a creation gesture counts as a click.
    pub min_element_size: f64,
    pub nudge_step: f64,
    pub nudge_step_large: f64,
    /// Offset applied to duplicated and pasted elements.
    pub duplicate_offset: f64,
    /// New arrows are routed orthogonally.
    pub elbowed_arrows: bool,
    /// Longest side of an inserted image.
    pub max_image_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            hit_tolerance: 10.0,
            handle_tolerance: 12.0,
            bind_snap_radius: 20.0,
            min_element_size: 1.0,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            duplicate_offset: 10.0,
            elbowed_arrows: false,
            max_image_size: 800.0,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_zoom <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "min_zoom",
                value: self.min_zoom,
            });
        }
        if self.min_zoom >= self.max_zoom {
            return Err(ConfigError::ZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        let sizes = [
            ("hit_tolerance", self.hit_tolerance),
            ("handle_tolerance", self.handle_tolerance),
            ("bind_snap_radius", self.bind_snap_radius),
            ("min_element_size", self.min_element_size),
            ("nudge_step", self.nudge_step),
            ("nudge_step_large", self.nudge_step_large),
            ("max_image_size", self.max_image_size),
        ];
        for (field, value) in sizes {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }
}
