//! Seams to the outside world: where blocks come from and where episodes go.

use crate::{AudioBlock, AudioFormat, CoreResult, audio::Episode};

use std::path::PathBuf;

/// Produces fixed-size blocks, blocking until the next one is available.
pub trait AudioSource {
    /// Reads the next block.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ListenerError::Acquisition`] on a transient read
    /// failure. Callers keep listening after such errors.
    fn read_block(&mut self) -> CoreResult<AudioBlock>;

    /// Layout of the blocks this source yields.
    fn format(&self) -> AudioFormat;
}

/// Accepts finished episodes for persistence.
pub trait AudioSink {
    /// Takes ownership of `episode` and stores it.
    ///
    /// Returns the path the episode is (or will be) written to.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ListenerError::Persist`] if the episode could not be
    /// stored or handed off. The episode is dropped either way.
    fn persist(&mut self, episode: Episode, format: AudioFormat) -> CoreResult<PathBuf>;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn persist(&mut self, episode: Episode, format: AudioFormat) -> CoreResult<PathBuf> {
        (**self).persist(episode, format)
    }
}
