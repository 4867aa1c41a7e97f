//! Replay configuration.

use crate::series::ChannelId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a replay session.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```json
/// { "warp_enabled": false, "max_playback_speed": 20.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Resample all streams to the longest one (default: true)
    pub warp_enabled: bool,

    /// Wall time per committed tick at speed 1.0, in milliseconds (default: 1000)
    pub frame_interval_ms: u64,

    /// Upper bound of the playback speed (default: 50)
    pub max_playback_speed: f64,

    /// Speed at session start (default: 1)
    pub initial_speed: f64,

    /// Settle delay between end-of-data or a restart request and the reset (default: 1000)
    pub restart_delay_ms: u64,

    /// Requested path trace length in samples (default: 100)
    pub trace_window: usize,

    /// Channel the path trace follows (default: instrument-tip)
    pub trace_channel: ChannelId,

    /// Speed change applied by one speed-up/slow-down input (default: 25).
    /// Independent of `max_playback_speed`; set both when changing the range.
    pub speed_step: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            warp_enabled: true,
            frame_interval_ms: 1000,
            max_playback_speed: 50.0,
            initial_speed: 1.0,
            restart_delay_ms: 1000,
            trace_window: 100,
            trace_channel: ChannelId::from(ChannelId::INSTRUMENT_TIP),
            speed_step: 25.0,
        }
    }
}

impl ReplayConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}
