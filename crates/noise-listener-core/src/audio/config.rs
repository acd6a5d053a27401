use crate::{AudioFormat, CoreResult, ListenerError, audio::Threshold};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;

/// Wall-clock description of the detector, converted to block counts by
/// [`DetectionConfig::from_timings`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionTimings {
    /// PCM layout of the input stream.
    pub format: AudioFormat,
    /// Duration of one acquired block.
    pub block_duration: Duration,
    /// Idle noise threshold on the normalized RMS scale.
    pub initial_threshold: f64,
    /// Threshold used while an episode is recording.
    pub recording_threshold: f64,
    /// Sustained noise longer than this raises the threshold.
    pub oversensitive_after: Duration,
    /// Sustained quiet longer than this lowers the threshold.
    pub undersensitive_after: Duration,
    /// Noise no longer than this is reported as a tap.
    pub max_tap: Duration,
    /// Audio kept from before the trigger.
    pub preroll: Duration,
    /// Quiet needed to end an episode.
    pub recording_quiet_timeout: Duration,
    /// Enables threshold adaptation.
    pub auto_adjust: bool,
}

impl Default for DetectionTimings {
    fn default() -> Self {
        Self {
            format: AudioFormat::default(),
            block_duration: Duration::from_millis(50),
            initial_threshold: 0.005,
            recording_threshold: 0.004,
            oversensitive_after: Duration::from_secs(15),
            undersensitive_after: Duration::from_secs(120),
            max_tap: Duration::from_millis(150),
            preroll: Duration::from_secs(4),
            recording_quiet_timeout: Duration::from_secs(4),
            auto_adjust: false,
        }
    }
}

/// Detector parameters expressed in blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// PCM layout of the input stream.
    pub format: AudioFormat,
    /// Duration of one acquired block.
    pub block_duration: Duration,
    /// Idle noise threshold.
    pub initial_threshold: f64,
    /// Threshold used while recording.
    pub recording_threshold: f64,
    /// Noisy blocks in a row before the threshold is raised.
    pub oversensitive_blocks: u32,
    /// Quiet blocks in a row before the threshold is lowered.
    pub undersensitive_blocks: u32,
    /// Longest noisy run reported as a tap.
    pub max_tap_blocks: u32,
    /// Pre-roll ring size.
    pub preroll_capacity_blocks: usize,
    /// Quiet blocks that must be exceeded to stop recording.
    pub recording_quiet_timeout_blocks: u32,
    /// Enables threshold adaptation.
    pub auto_adjust: bool,
}

impl DetectionConfig {
    /// Converts wall-clock windows into block counts.
    ///
    /// Run-length limits round to the nearest block; the pre-roll capacity
    /// rounds up so at least `preroll` of audio is retained.
    pub fn from_timings(timings: &DetectionTimings) -> Self {
        let block = timings.block_duration.as_secs_f64();
        let ratio = |window: Duration| {
            if block > 0.0 {
                window.as_secs_f64() / block
            } else {
                0.0
            }
        };
        let rounded = |window: Duration| ratio(window).round() as u32;

        Self {
            format: timings.format,
            block_duration: timings.block_duration,
            initial_threshold: timings.initial_threshold,
            recording_threshold: timings.recording_threshold,
            oversensitive_blocks: rounded(timings.oversensitive_after),
            undersensitive_blocks: rounded(timings.undersensitive_after),
            // 0.15s / 50ms is 2.9999...; truncating would give 2.
            max_tap_blocks: rounded(timings.max_tap),
            // Tolerate float error so 4s / 50ms is 80, not 81.
            preroll_capacity_blocks: (ratio(timings.preroll) - 1e-9).ceil().max(0.0) as usize,
            recording_quiet_timeout_blocks: rounded(timings.recording_quiet_timeout),
            auto_adjust: timings.auto_adjust,
        }
    }

    /// Checks every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::InvalidConfig`] naming the first bad field.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        let location = Location::caller();
        let invalid = |reason: &str| ListenerError::InvalidConfig {
            reason: reason.to_string(),
            location: ErrorLocation::from(location),
        };

        Threshold::new(self.initial_threshold)?;
        Threshold::new(self.recording_threshold)?;

        if self.format.channels == 0 {
            return Err(invalid("channels must be at least 1"));
        }
        if self.format.sample_rate == 0 {
            return Err(invalid("sample_rate must be positive"));
        }
        if self.format.bits_per_sample != 16 {
            return Err(invalid("only 16-bit samples are supported"));
        }
        if self.format.samples_per_block(self.block_duration) == 0 {
            return Err(invalid("block_duration yields an empty block"));
        }
        if self.preroll_capacity_blocks == 0 {
            return Err(invalid("preroll_capacity_blocks must be at least 1"));
        }
        if self.oversensitive_blocks == 0 || self.undersensitive_blocks == 0 {
            return Err(invalid("sensitivity windows must be at least 1 block"));
        }
        if self.recording_quiet_timeout_blocks == 0 {
            return Err(invalid("recording_quiet_timeout_blocks must be at least 1"));
        }

        Ok(())
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self::from_timings(&DetectionTimings::default())
    }
}
