use crate::AudioBlock;

/// Fixed-capacity ring of the most recent blocks.
///
/// Slots are allocated once; `push` overwrites the oldest occupant and never
/// grows the backing storage.
#[derive(Debug)]
pub struct PrerollBuffer {
    slots: Vec<Option<AudioBlock>>,
    cursor: usize,
}

impl PrerollBuffer {
    /// Creates an empty ring. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            cursor: 0,
        }
    }

    /// Maximum number of retained blocks.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// True until the first push.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Stores `block` in the current slot and advances the cursor.
    pub fn push(&mut self, block: AudioBlock) {
        self.slots[self.cursor] = Some(block);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Occupied slots, oldest first.
    ///
    /// The cursor always points at the oldest slot once the ring has wrapped,
    /// and at the first never-written slot before that.
    pub fn snapshot(&self) -> Vec<AudioBlock> {
        let (newer, older) = self.slots.split_at(self.cursor);
        older.iter().chain(newer).flatten().cloned().collect()
    }
}
