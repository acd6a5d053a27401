use serde::{Deserialize, Serialize};

/// Noise detection tuning. Windows are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Idle noise threshold (normalized RMS).
    pub initial_threshold: f64,
    /// Threshold while recording; lower so quiet tails stay in the episode.
    pub recording_threshold: f64,
    /// Noise lasting longer than this raises the threshold.
    pub oversensitive_secs: f64,
    /// Quiet lasting longer than this lowers the threshold.
    pub undersensitive_secs: f64,
    /// Noise no longer than this is logged as a tap.
    pub max_tap_secs: f64,
    /// Audio kept from before each trigger.
    pub preroll_secs: f64,
    /// Quiet that ends an episode.
    pub recording_timeout_secs: f64,
    /// Adapt the threshold to the environment.
    pub auto_adjust: bool,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            initial_threshold: 0.005,
            recording_threshold: 0.004,
            oversensitive_secs: 15.0,
            undersensitive_secs: 120.0,
            max_tap_secs: 0.15,
            preroll_secs: 4.0,
            recording_timeout_secs: 4.0,
            auto_adjust: false,
        }
    }
}
