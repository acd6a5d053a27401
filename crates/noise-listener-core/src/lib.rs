//! Noise Listener Core Library
//!
//! Detects taps and sustained noise on a live audio stream and records the
//! sustained episodes, pre-roll included, using CPAL and hound.
//!
//! # Example
//!
//! ```no_run
//! use noise_listener_core::{
//!     CoreResult, CpalAudioSource, DetectionConfig, NoiseListener, WavFileSink,
//! };
//!
//! fn main() -> CoreResult<()> {
//!     let config = DetectionConfig::default();
//!     let mut source = CpalAudioSource::open(None, config.format, config.block_duration)?;
//!     let mut listener = NoiseListener::new(config, WavFileSink::new("recordings"))?;
//!
//!     loop {
//!         for event in listener.listen(&mut source) {
//!             println!("{:?}", event);
//!         }
//!     }
//! }
//! ```

mod audio;
mod error;

pub use {
    audio::{
        AudioBlock, AudioFormat, AudioSink, AudioSource, Classification, CpalAudioSource,
        DetectionConfig, DetectionTimings, Episode, ListenerEvent, ListenerStats, NoiseListener,
        PrerollBuffer, RecordingState, SensitivityController, Threshold, WAV_EXTENSION,
        WavFileSink, devices, energy, episode_file_name,
    },
    error::ListenerError,
    error::Result as CoreResult,
};
