use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("max_lanes must be at least 1")]
    NoLanes,
    #[error("{field} is too large to use as a period (got {value})")]
    OutOfRange { field: &'static str, value: f64 },
}

const DEFAULT_FRAME_PERIOD_MS: f64 = 16.7;

/// Engine tuning, applied at construction.
///
/// Missing JSON fields take their defaults, so a partial file such as
/// `{"max_lanes": 8}` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on comments staged or on screen at once. Arrivals beyond
    /// it are dropped, not queued.
    pub max_concurrent: usize,
    pub max_lanes: usize,
    /// Multiplier on scroll speed.
    pub speed_ratio: f64,
    /// Multiplier on text size.
    pub scale_text_ratio: f64,
    /// Reject lanes where a faster newcomer would catch the previous comment.
    pub avoid_overlap: bool,
    /// Approximate time a scroll comment takes to cross the viewport.
    pub scroll_show_duration_ms: u64,
    /// How long a top/bottom comment stays up.
    pub center_show_duration_ms: u64,
    /// Ingestion period.
    pub tick_period_ms: u64,
    /// Render period; scroll speeds are expressed per frame of this length.
    pub frame_period_ms: f64,
    /// Largest text size honored, in density-independent units. Also sizes
    /// the lanes.
    pub max_text_size: f64,
    pub show_debug_info: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 40,
            max_lanes: 20,
            speed_ratio: 1.0,
            scale_text_ratio: 0.9,
            avoid_overlap: true,
            scroll_show_duration_ms: 8_000,
            center_show_duration_ms: 4_000,
            tick_period_ms: 100,
            frame_period_ms: DEFAULT_FRAME_PERIOD_MS,
            max_text_size: 21.0,
            show_debug_info: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_lanes == 0 {
            return Err(ConfigError::NoLanes);
        }
        let checks = [
            ("speed_ratio", self.speed_ratio),
            ("scale_text_ratio", self.scale_text_ratio),
            ("scroll_show_duration_ms", self.scroll_show_duration_ms as f64),
            ("center_show_duration_ms", self.center_show_duration_ms as f64),
            ("tick_period_ms", self.tick_period_ms as f64),
            ("frame_period_ms", self.frame_period_ms),
            ("max_text_size", self.max_text_size),
        ];
        for (field, value) in checks {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if Duration::try_from_secs_f64(self.frame_period_ms / 1_000.0).is_err() {
            return Err(ConfigError::OutOfRange {
                field: "frame_period_ms",
                value: self.frame_period_ms,
            });
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Render period. A config that fails [`validate`](Self::validate)
    /// gets the default period instead.
    pub fn frame_period(&self) -> Duration {
        Duration::try_from_secs_f64(self.frame_period_ms / 1_000.0)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_FRAME_PERIOD_MS / 1_000.0))
    }

    /// Per-frame speed for a scroll comment of `width`, chosen so that
    /// crossing `viewport_width + width` pixels takes about
    /// `scroll_show_duration_ms` regardless of text length.
    pub fn scroll_speed(&self, viewport_width: f64, width: f64) -> f64 {
        self.speed_ratio * (viewport_width + width) * self.frame_period_ms
            / self.scroll_show_duration_ms as f64
    }
}
