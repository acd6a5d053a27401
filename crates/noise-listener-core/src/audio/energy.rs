use crate::{AudioBlock, CoreResult, ListenerError, audio::block::BYTES_PER_SAMPLE};

use std::panic::Location;

use error_location::ErrorLocation;

/// Scale factor mapping an i16 sample into [-1, 1].
const SHORT_NORMALIZE: f64 = 1.0 / 32768.0;

/// Root-mean-square amplitude of a block, normalized to [0, 1].
///
/// # Errors
///
/// Returns [`ListenerError::InvalidBlock`] if the block is empty or its byte
/// length is odd.
#[track_caller]
pub fn estimate(block: &AudioBlock) -> CoreResult<f64> {
    let len = block.byte_len();

    if len == 0 {
        return Err(ListenerError::InvalidBlock {
            reason: "block contains no samples".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    if len % BYTES_PER_SAMPLE != 0 {
        return Err(ListenerError::InvalidBlock {
            reason: format!("odd byte length {}", len),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let count = len / BYTES_PER_SAMPLE;
    let sum_squares: f64 = block
        .samples()
        .map(|sample| {
            let n = f64::from(sample) * SHORT_NORMALIZE;
            n * n
        })
        .sum();

    Ok((sum_squares / count as f64).sqrt())
}
