use error_location::ErrorLocation;
use thiserror::Error;

/// Noise listener errors with source location tracking.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// Audio block is empty or has an odd byte length.
    #[error("Invalid audio block: {reason} {location}")]
    InvalidBlock {
        /// Why the block was rejected.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Reading the next block from the audio source failed.
    #[error("Audio acquisition failed: {reason} {location}")]
    Acquisition {
        /// Description of the read failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Writing an episode to persistent storage failed.
    #[error("Failed to persist episode: {reason} {location}")]
    Persist {
        /// Description of the write failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Detection parameters are out of range.
    #[error("Invalid configuration: {reason} {location}")]
    InvalidConfig {
        /// Which parameter was rejected and why.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No audio input device found.
    #[error("No microphone found {location}")]
    NoMicrophoneFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device operation failed.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`ListenerError`].
pub type Result<T> = std::result::Result<T, ListenerError>;
