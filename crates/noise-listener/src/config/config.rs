//! Configuration management for noise-listener.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths and atomic write operations, and converts the human-friendly
//! settings into the detector's block-based parameters.

use crate::{
    AppError, AppResult, Cli,
    config::{AudioConfig, DetectionSettings, OutputConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use noise_listener_core::{AudioFormat, DetectionConfig, DetectionTimings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input stream settings.
    #[serde(default)]
    pub audio: AudioConfig,
    /// Detector tuning.
    #[serde(default)]
    pub detection: DetectionSettings,
    /// Episode output settings.
    pub output: OutputConfig,
}

impl Config {
    /// Default configuration writing episodes into `directory`.
    pub fn with_output_dir(directory: PathBuf) -> Self {
        Self {
            audio: AudioConfig::default(),
            detection: DetectionSettings::default(),
            output: OutputConfig {
                directory,
                background_persist: crate::config::DEFAULT_BACKGROUND_PERSIST,
            },
        }
    }

    /// Load configuration from `explicit` or the platform config directory,
    /// creating a default file if none exists.
    #[track_caller]
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> AppResult<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!(config_path = ?config_path, "No config found, creating default");
            Self::create_default(&config_path)
        }
    }

    /// Parse the TOML file at `path`.
    #[track_caller]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration loaded");

        Ok(config)
    }

    /// Save configuration to `path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
            debug!(config_dir = ?parent, "Created config directory");
        }

        // Atomic write: write to temp file then rename
        let temp_path = path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Command-line flags take precedence over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(device) = &cli.device {
            self.audio.device = Some(device.clone());
        }
        if let Some(dir) = &cli.output_dir {
            self.output.directory = dir.clone();
        }
        if cli.auto_adjust {
            self.detection.auto_adjust = true;
        }
    }

    /// Detector parameters in blocks.
    ///
    /// # Errors
    ///
    /// Returns a config error for negative or non-finite durations, and a
    /// listener error if the resulting parameters fail validation.
    #[track_caller]
    pub fn detection_config(&self) -> AppResult<DetectionConfig> {
        let d = &self.detection;

        let timings = DetectionTimings {
            format: AudioFormat::pcm16(self.audio.sample_rate, self.audio.channels),
            block_duration: seconds("audio.block_duration_secs", self.audio.block_duration_secs)?,
            initial_threshold: d.initial_threshold,
            recording_threshold: d.recording_threshold,
            oversensitive_after: seconds("detection.oversensitive_secs", d.oversensitive_secs)?,
            undersensitive_after: seconds("detection.undersensitive_secs", d.undersensitive_secs)?,
            max_tap: seconds("detection.max_tap_secs", d.max_tap_secs)?,
            preroll: seconds("detection.preroll_secs", d.preroll_secs)?,
            recording_quiet_timeout: seconds(
                "detection.recording_timeout_secs",
                d.recording_timeout_secs,
            )?,
            auto_adjust: d.auto_adjust,
        };

        let config = DetectionConfig::from_timings(&timings);
        config.validate()?;

        Ok(config)
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    #[track_caller]
    fn create_default(config_path: &Path) -> AppResult<Self> {
        let proj_dirs = Self::project_dirs()?;
        let config = Self::with_output_dir(proj_dirs.data_dir().join("recordings"));

        config.save_to(config_path)?;

        info!(
            output_dir = ?config.output.directory,
            "Default config created"
        );

        Ok(config)
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "noise-listener", "Noise-Listener").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get project directories".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }
}

#[track_caller]
fn seconds(field: &str, value: f64) -> AppResult<Duration> {
    Duration::try_from_secs_f64(value).map_err(|e| AppError::ConfigError {
        reason: format!("{} = {}: {}", field, value, e),
        location: ErrorLocation::from(Location::caller()),
    })
}
