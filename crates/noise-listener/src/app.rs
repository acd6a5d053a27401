use crate::{
    AppError, AppResult,
    config::Config,
    worker_sink::{PERSIST_QUEUE_DEPTH, WorkerSink, run_persist_worker},
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use error_location::ErrorLocation;
use noise_listener_core::{
    AudioSink, AudioSource, CpalAudioSource, DetectionConfig, ListenerStats, NoiseListener,
    WavFileSink,
};
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

/// Main application state.
///
/// The listening loop runs on a blocking thread because the capture stream
/// is `!Send` and every read blocks until the next block is ready. Episodes
/// reach disk either inline or through the background persist worker.
pub struct App {
    pub(crate) config: Config,
    pub(crate) shutdown: Arc<AtomicBool>,
}

impl App {
    /// App with a fresh shutdown flag.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run until Ctrl-C, then flush the current episode and exit.
    #[instrument(skip(self))]
    pub(crate) async fn run(self) -> AppResult<()> {
        info!("Noise-Listener starting");

        let detection = self.config.detection_config()?;
        let device = self.config.audio.device.clone();
        let wav = WavFileSink::new(self.config.output.directory.clone());

        info!(
            output_dir = ?wav.output_dir(),
            background_persist = self.config.output.background_persist,
            "Episodes will be saved as WAV"
        );

        let signal_flag = Arc::clone(&self.shutdown);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown requested");
                    signal_flag.store(true, Ordering::Release);
                }
                Err(e) => error!(error = ?e, "Failed to listen for Ctrl-C"),
            }
        });

        let mut worker = None;
        let sink: Box<dyn AudioSink + Send> = if self.config.output.background_persist {
            let (job_tx, job_rx) = mpsc::channel(PERSIST_QUEUE_DEPTH);
            worker = Some(tokio::spawn(run_persist_worker(job_rx, wav.clone())));
            Box::new(WorkerSink::new(wav, job_tx))
        } else {
            Box::new(wav)
        };

        let shutdown = Arc::clone(&self.shutdown);
        let stats = tokio::task::spawn_blocking(move || {
            let mut source = CpalAudioSource::open(
                device.as_deref(),
                detection.format,
                detection.block_duration,
            )?;
            let stats = listen_until_shutdown(&mut source, detection, sink, &shutdown)?;
            if source.dropped_blocks() > 0 {
                warn!(dropped = source.dropped_blocks(), "Blocks dropped by capture queue");
            }
            Ok::<_, AppError>(stats)
        })
        .await
        .map_err(|e| AppError::RuntimeError {
            reason: format!("Listening task panicked: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })??;

        // The sink, and with it the job sender, was dropped with the listener.
        if let Some(worker) = worker {
            worker.await.map_err(|e| AppError::RuntimeError {
                reason: format!("Persist worker panicked: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        info!(
            blocks = stats.blocks_processed,
            taps = stats.taps_detected,
            episodes_saved = stats.episodes_saved,
            episodes_failed = stats.episodes_failed,
            acquisition_errors = stats.acquisition_errors,
            "Noise-Listener shut down successfully"
        );

        Ok(())
    }
}

/// Processes blocks from `source` until `shutdown` is set.
///
/// Shutdown is checked between blocks only; an episode still recording at
/// that point is handed to the sink before returning.
pub(crate) fn listen_until_shutdown<A, S>(
    source: &mut A,
    detection: DetectionConfig,
    sink: S,
    shutdown: &AtomicBool,
) -> AppResult<ListenerStats>
where
    A: AudioSource + ?Sized,
    S: AudioSink,
{
    let mut listener = NoiseListener::new(detection, sink)?;

    info!(format = ?source.format(), "Listening");

    while !shutdown.load(Ordering::Acquire) {
        listener.listen(source);
    }

    let stats = listener.stats();
    let (_sink, flushed) = listener.finish();
    if let Some(event) = flushed {
        info!(event = ?event, "Flushed episode on shutdown");
    }

    Ok(stats)
}
