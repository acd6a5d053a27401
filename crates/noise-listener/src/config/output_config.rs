use crate::config::default_background_persist;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and how episodes are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one WAV file per episode.
    pub directory: PathBuf,

    /// Write files on a background worker instead of the listening thread.
    #[serde(default = "default_background_persist")]
    pub background_persist: bool,
}
