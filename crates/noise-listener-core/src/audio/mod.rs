pub(crate) mod capture;
mod block;
mod config;
pub mod devices;
pub mod energy;
mod episode;
mod io;
mod listener;
mod preroll;
mod sensitivity;
mod wav_sink;

pub use {
    block::{AudioBlock, AudioFormat},
    capture::CpalAudioSource,
    config::{DetectionConfig, DetectionTimings},
    episode::Episode,
    io::{AudioSink, AudioSource},
    listener::{ListenerEvent, ListenerStats, NoiseListener, RecordingState},
    preroll::PrerollBuffer,
    sensitivity::{Classification, SensitivityController, Threshold},
    wav_sink::{WAV_EXTENSION, WavFileSink, episode_file_name},
};
