use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::limits::{CANVAS_HEIGHT, CANVAS_WIDTH};

/// Map behaviour knobs. Every field has a default, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Edit-mode capability flag. Fixed for the lifetime of an editor.
    pub edit_mode: bool,
    /// Seed the working copy from the recovery cache on first load.
    pub persist_changes: bool,
    pub touch_tooltip_ms: f64,
    pub touch_feedback_ms: f64,
    pub row_highlight_ms: f64,
    pub pulse_interval_ms: f64,
    pub pulse_count: u32,
    pub pulse_length_ms: f64,
    pub vertex_radius: f64,
    pub centroid_radius: f64,
    pub insert_radius: f64,
    pub touch_breakpoint_px: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            edit_mode: false,
            persist_changes: true,
            touch_tooltip_ms: 10_000.0,
            touch_feedback_ms: 200.0,
            row_highlight_ms: 2_000.0,
            pulse_interval_ms: 1_000.0,
            pulse_count: 3,
            pulse_length_ms: 500.0,
            vertex_radius: 6.0,
            centroid_radius: 8.0,
            insert_radius: 4.0,
            touch_breakpoint_px: 768.0,
        }
    }
}

impl MapConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: MapConfig = serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn editing() -> Self {
        MapConfig { edit_mode: true, ..Default::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("touch_tooltip_ms", self.touch_tooltip_ms),
            ("row_highlight_ms", self.row_highlight_ms),
            ("pulse_interval_ms", self.pulse_interval_ms),
            ("vertex_radius", self.vertex_radius),
            ("centroid_radius", self.centroid_radius),
            ("insert_radius", self.insert_radius),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        let non_negative = [
            ("touch_feedback_ms", self.touch_feedback_ms),
            ("pulse_length_ms", self.pulse_length_ms),
            ("touch_breakpoint_px", self.touch_breakpoint_px),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        Ok(())
    }
}
