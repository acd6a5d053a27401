use crate::{
    AudioBlock, AudioFormat, CoreResult, ListenerError,
    audio::{AudioSource, devices},
};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError},
    },
    time::Duration,
};

use cpal::{
    SampleFormat, Stream, StreamConfig,
    traits::{DeviceTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Blocks the callback may queue ahead of the reader.
///
/// At 50ms blocks this is ~3 seconds of slack before blocks are dropped.
pub(crate) const BLOCK_QUEUE_DEPTH: usize = 64;

/// How many block durations `read_block` waits before reporting a stall.
const READ_TIMEOUT_BLOCKS: u32 = 10;

/// Slices a stream of samples into exact-size blocks.
#[derive(Debug)]
pub(crate) struct BlockAssembler {
    samples_per_block: usize,
    pending: Vec<i16>,
}

impl BlockAssembler {
    pub(crate) fn new(samples_per_block: usize) -> Self {
        Self {
            samples_per_block,
            pending: Vec::with_capacity(samples_per_block),
        }
    }

    /// Buffers `data` and returns every block it completed.
    pub(crate) fn extend(&mut self, data: impl IntoIterator<Item = i16>) -> Vec<AudioBlock> {
        let mut ready = Vec::new();
        for sample in data {
            self.pending.push(sample);
            if self.pending.len() == self.samples_per_block {
                ready.push(AudioBlock::from_samples(&self.pending));
                self.pending.clear();
            }
        }
        ready
    }
}

/// Live input stream producing fixed-size blocks.
///
/// The cpal callback assembles blocks and queues them on a bounded channel;
/// [`AudioSource::read_block`] blocks on that channel, which paces the
/// listening loop to real time. If the reader falls behind, new blocks are
/// dropped and counted rather than stalling the audio thread.
pub struct CpalAudioSource {
    _stream: Stream,
    format: AudioFormat,
    blocks: Receiver<AudioBlock>,
    read_timeout: Duration,
    stream_error: Arc<Mutex<Option<String>>>,
    dropped_blocks: Arc<AtomicU64>,
}

impl CpalAudioSource {
    /// Opens `device_name` (or the best match, see
    /// [`devices::find_input_device`]) and starts capturing.
    ///
    /// # Errors
    ///
    /// Returns a device error if the device cannot be found, does not accept
    /// the requested format, or fails to start.
    #[track_caller]
    #[instrument]
    pub fn open(
        device_name: Option<&str>,
        format: AudioFormat,
        block_duration: Duration,
    ) -> CoreResult<Self> {
        let device = devices::find_input_device(device_name)?;

        let sample_format = device
            .default_input_config()
            .map_err(|e| ListenerError::DeviceError {
                reason: format!("Failed to get config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .sample_format();

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: format.sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let samples_per_block = format.samples_per_block(block_duration);
        let (tx, rx) = mpsc::sync_channel(BLOCK_QUEUE_DEPTH);
        let stream_error = Arc::new(Mutex::new(None));
        let dropped_blocks = Arc::new(AtomicU64::new(0));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream(
                &device,
                &config,
                samples_per_block,
                tx,
                Arc::clone(&stream_error),
                Arc::clone(&dropped_blocks),
                |data: &[f32]| {
                    data.iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)
                        .collect()
                },
            ),
            _ => build_stream(
                &device,
                &config,
                samples_per_block,
                tx,
                Arc::clone(&stream_error),
                Arc::clone(&dropped_blocks),
                |data: &[i16]| data.to_vec(),
            ),
        }?;

        stream.play().map_err(|e| ListenerError::DeviceError {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(
            device = ?devices::device_name(&device),
            sample_rate = format.sample_rate,
            channels = format.channels,
            samples_per_block,
            "Audio capture started"
        );

        Ok(Self {
            _stream: stream,
            format,
            blocks: rx,
            read_timeout: block_duration * READ_TIMEOUT_BLOCKS,
            stream_error,
            dropped_blocks,
        })
    }

    /// Blocks discarded because the reader fell behind.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks.load(Ordering::Relaxed)
    }
}

impl AudioSource for CpalAudioSource {
    #[track_caller]
    fn read_block(&mut self) -> CoreResult<AudioBlock> {
        let reported = self
            .stream_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(reason) = reported {
            return Err(ListenerError::Acquisition {
                reason,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.blocks
            .recv_timeout(self.read_timeout)
            .map_err(|e| ListenerError::Acquisition {
                reason: match e {
                    RecvTimeoutError::Timeout => {
                        format!("no audio for {:?}", self.read_timeout)
                    }
                    RecvTimeoutError::Disconnected => "audio stream closed".to_string(),
                },
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn format(&self) -> AudioFormat {
        self.format
    }
}

#[track_caller]
fn build_stream<T, F>(
    device: &cpal::Device,
    config: &StreamConfig,
    samples_per_block: usize,
    tx: SyncSender<AudioBlock>,
    stream_error: Arc<Mutex<Option<String>>>,
    dropped_blocks: Arc<AtomicU64>,
    convert: F,
) -> CoreResult<Stream>
where
    T: cpal::SizedSample,
    F: Fn(&[T]) -> Vec<i16> + Send + 'static,
{
    let mut assembler = BlockAssembler::new(samples_per_block);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                for block in assembler.extend(convert(data)) {
                    match tx.try_send(block) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            let dropped = dropped_blocks.fetch_add(1, Ordering::Relaxed) + 1;
                            debug!(dropped, "Block queue full, dropping block");
                        }
                        // Reader is gone; nothing left to deliver to.
                        Err(TrySendError::Disconnected(_)) => return,
                    }
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
                // Recover from lock poison; the slot is a plain Option.
                let mut slot = stream_error.lock().unwrap_or_else(|e| {
                    warn!("Stream error slot poisoned, recovering");
                    e.into_inner()
                });
                *slot = Some(err.to_string());
            },
            None,
        )
        .map_err(|e| ListenerError::DeviceError {
            reason: format!("Failed to build stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
}
