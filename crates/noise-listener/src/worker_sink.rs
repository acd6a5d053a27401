//! Background episode persistence.
//!
//! The listening loop must not stall while a long episode is written, so
//! [`WorkerSink`] only reserves a file name and moves the episode onto a channel.
//! [`run_persist_worker`] drains that channel on the async runtime and does the
//! actual write on a blocking thread.

use std::{panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use noise_listener_core::{
    AudioFormat, AudioSink, CoreResult, Episode, ListenerError, WavFileSink,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

/// Episodes that may wait for the writer before the listener sees a failure.
pub(crate) const PERSIST_QUEUE_DEPTH: usize = 16;

/// An episode on its way to disk.
#[derive(Debug)]
pub struct PersistJob {
    /// Destination chosen at hand-off.
    pub path: PathBuf,
    /// Owned episode; the listener keeps no copy.
    pub episode: Episode,
    /// PCM layout for the WAV header.
    pub format: AudioFormat,
}

/// [`AudioSink`] that hands episodes to [`run_persist_worker`].
pub struct WorkerSink {
    wav: WavFileSink,
    job_tx: mpsc::Sender<PersistJob>,
}

impl WorkerSink {
    /// Sink naming files through `wav` and queueing jobs on `job_tx`.
    pub fn new(wav: WavFileSink, job_tx: mpsc::Sender<PersistJob>) -> Self {
        Self { wav, job_tx }
    }
}

impl AudioSink for WorkerSink {
    /// Must be called from a blocking context, not from inside the runtime.
    ///
    /// The file is created empty before the job is queued, so episodes
    /// stopping in the same second get distinct names even while earlier
    /// jobs are still waiting for the writer.
    #[track_caller]
    fn persist(&mut self, episode: Episode, format: AudioFormat) -> CoreResult<PathBuf> {
        let path = self.wav.reserve_path()?;
        let episode_id = episode.id();

        self.job_tx
            .blocking_send(PersistJob {
                path: path.clone(),
                episode,
                format,
            })
            .map_err(|_| ListenerError::Persist {
                reason: "persist worker has stopped".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(episode_id = %episode_id, path = ?path, "Episode queued for writing");

        Ok(path)
    }
}

/// Writes queued episodes until every [`WorkerSink`] is dropped.
///
/// Returns the number of files written.
#[instrument(skip(job_rx, wav))]
pub async fn run_persist_worker(mut job_rx: mpsc::Receiver<PersistJob>, wav: WavFileSink) -> usize {
    let mut written = 0;

    while let Some(job) = job_rx.recv().await {
        let wav = wav.clone();
        let episode_id = job.episode.id();

        let result =
            tokio::task::spawn_blocking(move || wav.write(&job.path, &job.episode, job.format))
                .await;

        match result {
            Ok(Ok(())) => written += 1,
            Ok(Err(e)) => error!(episode_id = %episode_id, error = ?e, "Failed to write episode"),
            Err(e) => error!(episode_id = %episode_id, error = ?e, "Persist task panicked"),
        }
    }

    info!(written, "Persist worker stopped");

    written
}
