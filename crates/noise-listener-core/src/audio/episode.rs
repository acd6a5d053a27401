use crate::AudioBlock;

use chrono::{DateTime, Local};
use uuid::Uuid;

/// One continuous recording, from trigger to timeout-stop.
///
/// Owned by the listener while recording; moved into the sink on stop.
#[derive(Debug, Clone)]
pub struct Episode {
    id: Uuid,
    started_at: DateTime<Local>,
    preroll_blocks: usize,
    blocks: Vec<AudioBlock>,
}

impl Episode {
    /// Starts an episode seeded with pre-roll context, oldest block first.
    pub fn with_preroll(preroll: Vec<AudioBlock>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Local::now(),
            preroll_blocks: preroll.len(),
            blocks: preroll,
        }
    }

    pub(crate) fn append(&mut self, block: AudioBlock) {
        self.blocks.push(block);
    }

    /// Correlation id for logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Local time the episode started.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// How many leading blocks came from the pre-roll ring.
    pub fn preroll_blocks(&self) -> usize {
        self.preroll_blocks
    }

    /// Pre-roll blocks followed by recorded blocks, oldest first.
    pub fn blocks(&self) -> &[AudioBlock] {
        &self.blocks
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if the episode holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total PCM bytes across all blocks.
    pub fn byte_len(&self) -> usize {
        self.blocks.iter().map(AudioBlock::byte_len).sum()
    }
}
