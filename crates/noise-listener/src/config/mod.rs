mod audio_config;
#[allow(clippy::module_inception)]
mod config;
mod detection_config;
mod output_config;

pub(crate) use {
    audio_config::AudioConfig, config::Config, detection_config::DetectionSettings,
    output_config::OutputConfig,
};

pub(crate) const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub(crate) const DEFAULT_CHANNELS: u16 = 2;
pub(crate) const DEFAULT_BLOCK_DURATION_SECS: f64 = 0.05;
pub(crate) const DEFAULT_BACKGROUND_PERSIST: bool = true;

pub(crate) fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

pub(crate) fn default_channels() -> u16 {
    DEFAULT_CHANNELS
}

pub(crate) fn default_block_duration_secs() -> f64 {
    DEFAULT_BLOCK_DURATION_SECS
}

pub(crate) fn default_background_persist() -> bool {
    DEFAULT_BACKGROUND_PERSIST
}
