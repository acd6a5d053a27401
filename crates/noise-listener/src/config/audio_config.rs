use crate::config::{default_block_duration_secs, default_channels, default_sample_rate};

use serde::{Deserialize, Serialize};

/// Input stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Input device name (None = first "mic"/"input" device, else default).
    #[serde(default)]
    pub device: Option<String>,

    /// Frames per second requested from the device.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Interleaved channel count requested from the device.
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Length of one analysed block in seconds.
    #[serde(default = "default_block_duration_secs")]
    pub block_duration_secs: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            block_duration_secs: default_block_duration_secs(),
        }
    }
}
