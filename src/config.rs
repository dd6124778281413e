use crate::error::{Result, VpaidError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for a creative instance
///
/// The defaults match the behaviour host players expect from the sample
/// creatives; a JSON file only needs to name the fields it overrides.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct AdConfig {
    /// Delay between `stopAd` and the `AdStopped` event, in milliseconds
    pub stop_delay_ms: u64,

    /// Delay between a click on the linear affordance and `AdStopped`
    pub linear_transition_delay_ms: u64,

    /// Duration reported before the video metadata is known, in seconds
    pub default_duration: f64,

    /// Bitrate reported before `initAd`
    pub default_desired_bitrate: u32,

    /// Initial volume
    pub default_volume: f64,

    /// Initial (read-only) skippable state
    pub skippable: bool,
}

impl Default for AdConfig {
    fn default() -> Self {
        Self {
            stop_delay_ms: 75,
            linear_transition_delay_ms: 1,
            default_duration: 10.0,
            default_desired_bitrate: 256,
            default_volume: 1.0,
            skippable: false,
        }
    }
}

impl AdConfig {
    /// Parse a config from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AdConfig =
            serde_json::from_str(json).map_err(|e| VpaidError::Config(e.to_string()))?;

        if !config.default_duration.is_finite() || config.default_duration < 0.0 {
            return Err(VpaidError::Config(format!(
                "default_duration must be a non-negative number, got {}",
                config.default_duration
            )));
        }

        Ok(config)
    }

    pub fn stop_delay(&self) -> Duration {
        Duration::from_millis(self.stop_delay_ms)
    }

    pub fn linear_transition_delay(&self) -> Duration {
        Duration::from_millis(self.linear_transition_delay_ms)
    }
}
