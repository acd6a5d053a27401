use std::{sync::Arc, time::Duration};

/// Bytes per signed 16-bit PCM sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// One fixed-duration chunk of interleaved little-endian i16 PCM.
///
/// Cloning is cheap: the bytes are shared, so the same block can sit in the
/// pre-roll ring and in an episode without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlock {
    bytes: Arc<[u8]>,
}

impl AudioBlock {
    /// Wraps raw PCM bytes as delivered by an input stream.
    ///
    /// No validation happens here; a malformed block is reported by
    /// [`crate::audio::energy::estimate`].
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Encodes samples as little-endian PCM.
    pub fn from_samples(samples: &[i16]) -> Self {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::from_bytes(bytes)
    }

    /// Raw little-endian PCM bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Decodes the block's samples. A trailing odd byte is ignored.
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.bytes
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }
}

/// PCM layout of the stream being listened to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Interleaved channel count.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// Always 16 for the blocks this crate produces.
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// 16-bit PCM at the given rate and channel count.
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    /// Frames in one block of `block_duration`.
    pub fn frames_per_block(&self, block_duration: Duration) -> usize {
        (f64::from(self.sample_rate) * block_duration.as_secs_f64()) as usize
    }

    /// Interleaved samples in one block of `block_duration`.
    pub fn samples_per_block(&self, block_duration: Duration) -> usize {
        self.frames_per_block(block_duration) * usize::from(self.channels)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::pcm16(44_100, 2)
    }
}
