use crate::{
    AudioBlock, AudioFormat, CoreResult,
    audio::{
        AudioSink, AudioSource, Classification, DetectionConfig, Episode, PrerollBuffer,
        SensitivityController, Threshold, energy,
    },
};

use std::path::PathBuf;

use chrono::{DateTime, Local};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Whether an episode is currently being accumulated.
#[derive(Debug)]
pub enum RecordingState {
    /// Listening only. No episode exists.
    Idle,
    /// Exactly one episode is being accumulated.
    Recording(Episode),
}

/// Something observable that happened while processing a block.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    /// A short noisy run ended.
    TapDetected {
        /// Local time of the quiet block that ended the run.
        at: DateTime<Local>,
        /// Length of the noisy run in blocks.
        noisy_blocks: u32,
    },
    /// Recording began.
    EpisodeStarted {
        /// Episode correlation id.
        episode_id: Uuid,
        /// Blocks copied from the pre-roll ring.
        preroll_blocks: usize,
    },
    /// An episode was handed to the sink.
    EpisodeSaved {
        /// Episode correlation id.
        episode_id: Uuid,
        /// Where the sink stored it.
        path: PathBuf,
        /// Total blocks, pre-roll included.
        blocks: usize,
    },
    /// The sink rejected an episode. The episode is gone.
    EpisodePersistFailed {
        /// Episode correlation id.
        episode_id: Uuid,
        /// Sink error text.
        reason: String,
    },
    /// The source failed to deliver a block.
    AcquisitionFailed {
        /// Running count of acquisition failures.
        error_count: u64,
    },
    /// A block could not be decoded and was skipped.
    InvalidBlock {
        /// Decoder error text.
        reason: String,
    },
}

/// Running totals since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Blocks passed to [`NoiseListener::on_block`].
    pub blocks_processed: u64,
    /// Failed source reads.
    pub acquisition_errors: u64,
    /// Blocks rejected by the energy estimator.
    pub invalid_blocks: u64,
    /// Tap events emitted.
    pub taps_detected: u64,
    /// Episodes accepted by the sink.
    pub episodes_saved: u64,
    /// Episodes the sink failed to store.
    pub episodes_failed: u64,
}

/// Noise detector and adaptive recorder for a single audio stream.
///
/// Every block goes through the pre-roll ring, the energy estimator and the
/// sensitivity controller, then drives the idle/recording transitions.
/// Recording starts on the first noisy block; whether the run was a tap is
/// decided afterwards, so a short burst yields both a tap event and a saved
/// episode.
pub struct NoiseListener<S> {
    config: DetectionConfig,
    preroll: PrerollBuffer,
    sensitivity: SensitivityController,
    state: RecordingState,
    /// Consecutive quiet blocks since the last noisy one, for the stop timeout.
    episode_quiet_run: u32,
    /// Threshold to restore when the current episode stops.
    idle_threshold: Threshold,
    recording_threshold: Threshold,
    stats: ListenerStats,
    sink: S,
}

impl<S: AudioSink> NoiseListener<S> {
    /// Creates an idle listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ListenerError::InvalidConfig`] if `config` fails
    /// validation.
    #[track_caller]
    #[instrument(skip(sink))]
    pub fn new(config: DetectionConfig, sink: S) -> CoreResult<Self> {
        config.validate()?;

        let idle_threshold = Threshold::new(config.initial_threshold)?;
        let recording_threshold = Threshold::new(config.recording_threshold)?;
        let sensitivity = SensitivityController::new(
            idle_threshold,
            config.auto_adjust,
            config.oversensitive_blocks,
            config.undersensitive_blocks,
        );

        info!(
            preroll_blocks = config.preroll_capacity_blocks,
            timeout_blocks = config.recording_quiet_timeout_blocks,
            max_tap_blocks = config.max_tap_blocks,
            auto_adjust = config.auto_adjust,
            "NoiseListener initialized"
        );

        Ok(Self {
            preroll: PrerollBuffer::new(config.preroll_capacity_blocks),
            sensitivity,
            state: RecordingState::Idle,
            episode_quiet_run: 0,
            idle_threshold,
            recording_threshold,
            stats: ListenerStats::default(),
            sink,
            config,
        })
    }

    /// Runs one acquisition cycle: reads a block from `source` and processes it.
    ///
    /// A read failure is counted and forces the cycle to count as noisy; it
    /// never ends the listening loop.
    pub fn listen<A: AudioSource + ?Sized>(&mut self, source: &mut A) -> Vec<ListenerEvent> {
        match source.read_block() {
            Ok(block) => self.on_block(block),
            Err(e) => {
                self.stats.acquisition_errors += 1;
                self.sensitivity.force_noisy();
                warn!(
                    error_count = self.stats.acquisition_errors,
                    error = %e,
                    "Error recording"
                );
                vec![ListenerEvent::AcquisitionFailed {
                    error_count: self.stats.acquisition_errors,
                }]
            }
        }
    }

    /// Processes one block.
    pub fn on_block(&mut self, block: AudioBlock) -> Vec<ListenerEvent> {
        let mut events = Vec::new();
        self.stats.blocks_processed += 1;

        let energy = match energy::estimate(&block) {
            Ok(energy) => energy,
            Err(e) => {
                self.stats.invalid_blocks += 1;
                self.sensitivity.force_noisy();
                warn!(error = %e, "Skipping malformed block");
                events.push(ListenerEvent::InvalidBlock {
                    reason: e.to_string(),
                });
                return events;
            }
        };

        self.preroll.push(block.clone());

        // Every block observed while recording belongs to the episode. The
        // block that starts an episode arrives through the pre-roll snapshot.
        if let RecordingState::Recording(episode) = &mut self.state {
            episode.append(block);
        }

        match self.sensitivity.classify(energy) {
            Classification::Noisy => {
                if matches!(self.state, RecordingState::Idle) {
                    events.push(self.start_episode());
                }
                self.episode_quiet_run = 0;
            }
            Classification::Quiet => {
                self.episode_quiet_run = self.episode_quiet_run.saturating_add(1);

                if self.is_recording()
                    && self.episode_quiet_run > self.config.recording_quiet_timeout_blocks
                    && let Some(event) = self.stop_episode()
                {
                    events.push(event);
                }

                let noisy_run = self.sensitivity.take_noisy_run();
                if (1..=self.config.max_tap_blocks).contains(&noisy_run) {
                    events.push(self.tap_detected(noisy_run));
                }
            }
        }

        events
    }

    /// Begins an episode seeded with the pre-roll snapshot and lowers the
    /// threshold to the recording value.
    ///
    /// Already recording: the current episode is left untouched.
    pub fn start_episode(&mut self) -> ListenerEvent {
        if let RecordingState::Recording(episode) = &self.state {
            return ListenerEvent::EpisodeStarted {
                episode_id: episode.id(),
                preroll_blocks: episode.preroll_blocks(),
            };
        }

        let episode = Episode::with_preroll(self.preroll.snapshot());
        let event = ListenerEvent::EpisodeStarted {
            episode_id: episode.id(),
            preroll_blocks: episode.preroll_blocks(),
        };

        info!(
            episode_id = %episode.id(),
            preroll_blocks = episode.preroll_blocks(),
            "Recording - Start"
        );

        self.idle_threshold = self.sensitivity.current_threshold();
        self.sensitivity.set_threshold(self.recording_threshold);
        self.state = RecordingState::Recording(episode);

        event
    }

    /// Hands the current episode to the sink and returns to idle, restoring
    /// the pre-recording threshold.
    ///
    /// Returns `None` when already idle.
    pub fn stop_episode(&mut self) -> Option<ListenerEvent> {
        let RecordingState::Recording(episode) =
            std::mem::replace(&mut self.state, RecordingState::Idle)
        else {
            return None;
        };

        self.sensitivity.set_threshold(self.idle_threshold);

        let episode_id = episode.id();
        let blocks = episode.len();
        info!(episode_id = %episode_id, blocks, "Recording - Stop");

        let event = match self.sink.persist(episode, self.config.format) {
            Ok(path) => {
                self.stats.episodes_saved += 1;
                info!(episode_id = %episode_id, path = ?path, "Episode saved");
                ListenerEvent::EpisodeSaved {
                    episode_id,
                    path,
                    blocks,
                }
            }
            Err(e) => {
                self.stats.episodes_failed += 1;
                warn!(episode_id = %episode_id, error = %e, "Failed to save episode");
                ListenerEvent::EpisodePersistFailed {
                    episode_id,
                    reason: e.to_string(),
                }
            }
        };

        Some(event)
    }

    fn tap_detected(&mut self, noisy_blocks: u32) -> ListenerEvent {
        let at = Local::now();
        self.stats.taps_detected += 1;
        info!(
            timestamp = %at.format("%Y-%m-%d %H:%M:%S"),
            noisy_blocks,
            "Noise!"
        );
        ListenerEvent::TapDetected { at, noisy_blocks }
    }

    /// True while an episode is open.
    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecordingState::Recording(_))
    }

    /// Current recording state.
    pub fn state(&self) -> &RecordingState {
        &self.state
    }

    /// Threshold the next block is classified against.
    pub fn current_threshold(&self) -> Threshold {
        self.sensitivity.current_threshold()
    }

    /// Classifier and its run counters.
    pub fn sensitivity(&self) -> &SensitivityController {
        &self.sensitivity
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> ListenerStats {
        self.stats
    }

    /// Block-count configuration in use.
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Format passed to the sink with every episode.
    pub fn format(&self) -> AudioFormat {
        self.config.format
    }

    /// Sink receiving finished episodes.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Flushes any in-progress episode and returns the sink.
    pub fn finish(mut self) -> (S, Option<ListenerEvent>) {
        let event = self.stop_episode();
        debug!(stats = ?self.stats, "NoiseListener finished");
        (self.sink, event)
    }
}
