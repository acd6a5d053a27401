//! Episode persistence as 16-bit PCM WAV files.

use crate::{
    AudioFormat, CoreResult, ListenerError,
    audio::{AudioSink, Episode},
};

use std::{
    fs,
    panic::Location,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// Extension of written episode files.
pub const WAV_EXTENSION: &str = "wav";

/// `YYYY-MM-DD_HHMMSS.<ext>` for the given local time.
pub fn episode_file_name(at: &DateTime<Local>, extension: &str) -> String {
    format!("{}.{}", at.format("%Y-%m-%d_%H%M%S"), extension)
}

/// Writes each episode to its own WAV file in a directory.
#[derive(Debug, Clone)]
pub struct WavFileSink {
    output_dir: PathBuf,
}

impl WavFileSink {
    /// Sink writing into `output_dir`, created on first write if missing.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory receiving episode files.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Timestamp name for `at`, then `-1`, `-2`, ... variants.
    fn candidates(&self, at: &DateTime<Local>) -> impl Iterator<Item = PathBuf> + use<'_> {
        let first = self.output_dir.join(episode_file_name(at, WAV_EXTENSION));
        let stem = at.format("%Y-%m-%d_%H%M%S").to_string();
        std::iter::once(first).chain((1u32..).map(move |n| {
            self.output_dir
                .join(format!("{}-{}.{}", stem, n, WAV_EXTENSION))
        }))
    }

    /// Free path for an episode stopped at `at`.
    ///
    /// Adds `-1`, `-2`, ... when a file with the timestamp name already
    /// exists. Nothing is created, so two callers may get the same path;
    /// use [`Self::reserve_path_for`] when the write happens later.
    pub fn path_for(&self, at: &DateTime<Local>) -> PathBuf {
        self.candidates(at)
            .find(|path| !path.exists())
            .unwrap_or_else(|| self.output_dir.join(episode_file_name(at, WAV_EXTENSION)))
    }

    /// Free path for an episode stopping now.
    pub fn next_path(&self) -> PathBuf {
        self.path_for(&Local::now())
    }

    /// Claims a free path for an episode stopped at `at` by creating an
    /// empty file there.
    ///
    /// Later reservations in the same second see the file and take the next
    /// suffix, even before the episode itself is written.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Persist`] if the directory or file cannot be
    /// created.
    #[track_caller]
    pub fn reserve_path_for(&self, at: &DateTime<Local>) -> CoreResult<PathBuf> {
        let location = Location::caller();
        self.ensure_output_dir(location)?;

        for path in self.candidates(at) {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(_) => {
                    debug!(path = ?path, "Reserved episode path");
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(ListenerError::Persist {
                        reason: format!("Failed to reserve {}: {}", path.display(), e),
                        location: ErrorLocation::from(location),
                    });
                }
            }
        }

        Err(ListenerError::Persist {
            reason: "no free episode file name".to_string(),
            location: ErrorLocation::from(location),
        })
    }

    /// Claims a free path for an episode stopping now.
    ///
    /// # Errors
    ///
    /// See [`Self::reserve_path_for`].
    #[track_caller]
    pub fn reserve_path(&self) -> CoreResult<PathBuf> {
        self.reserve_path_for(&Local::now())
    }

    fn ensure_output_dir(&self, location: &'static Location<'static>) -> CoreResult<()> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).map_err(|e| ListenerError::Persist {
                reason: format!("Failed to create {}: {}", self.output_dir.display(), e),
                location: ErrorLocation::from(location),
            })?;
            debug!(output_dir = ?self.output_dir, "Created output directory");
        }
        Ok(())
    }

    /// Writes `episode` to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Persist`] if the directory cannot be created
    /// or the file cannot be written.
    #[track_caller]
    #[instrument(skip(self, episode), fields(episode_id = %episode.id()))]
    pub fn write(&self, path: &Path, episode: &Episode, format: AudioFormat) -> CoreResult<()> {
        let location = Location::caller();
        let persist_error = |reason: String| ListenerError::Persist {
            reason,
            location: ErrorLocation::from(location),
        };

        self.ensure_output_dir(location)?;

        let spec = hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: format.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec)
            .map_err(|e| persist_error(format!("Failed to create {}: {}", path.display(), e)))?;

        for block in episode.blocks() {
            for sample in block.samples() {
                writer
                    .write_sample(sample)
                    .map_err(|e| persist_error(format!("Failed to write sample: {}", e)))?;
            }
        }

        writer
            .finalize()
            .map_err(|e| persist_error(format!("Failed to finalize WAV: {}", e)))?;

        info!(
            path = ?path,
            blocks = episode.len(),
            bytes = episode.byte_len(),
            "Episode written"
        );

        Ok(())
    }
}

impl AudioSink for WavFileSink {
    #[track_caller]
    fn persist(&mut self, episode: Episode, format: AudioFormat) -> CoreResult<PathBuf> {
        let path = self.reserve_path()?;
        self.write(&path, &episode, format)?;
        Ok(path)
    }
}
