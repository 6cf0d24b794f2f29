//! Byte-boundary synchronization.
//!
//! A start bit is one full cycle at half the base frequency: an up crossing,
//! a down crossing half a bit later, and another up crossing a full bit after
//! the first. The synchronizer hunts for that triple across the recording and
//! records where each byte frame begins.

use crate::crossing::{next_crossing, Direction};

/// Fraction of a byte width to skip before hunting for the next start bit.
/// Skips the byte just found while leaving slack for timing drift.
const RESUME_RATIO: f64 = 0.90;

/// Tolerance on the full-bit span of the crossing triple.
const BIT_SPAN_RATIO: f64 = 0.2;

/// Tolerance on the balance between the triple's two half spans.
const HALF_BALANCE_RATIO: f64 = 0.25;

/// Locate the next start-bit boundary at or after `start`.
///
/// Returns the position of the validating up crossing, or `None` when no
/// qualifying triple remains before the end of the buffer.
pub fn find_next_start_bit(
    samples: &[u8],
    start: usize,
    frames_per_bit: f64,
    min_amplitude: u8,
) -> Option<usize> {
    let span_margin = BIT_SPAN_RATIO * frames_per_bit;
    let balance_margin = HALF_BALANCE_RATIO * frames_per_bit;
    let mut fi = start;
    while fi < samples.len() {
        let c0 = next_crossing(samples, fi)?;
        if c0.direction == Direction::Up && c0.peak_deviation > min_amplitude {
            let c1 = next_crossing(samples, c0.position)?;
            let c2 = next_crossing(samples, c1.position)?;
            let span = (c2.position - c0.position) as f64;
            let first_half = (c1.position - c0.position) as f64;
            let second_half = (c2.position - c1.position) as f64;
            if (span - frames_per_bit).abs() < span_margin
                && (first_half - second_half).abs() < balance_margin
            {
                return Some(c0.position);
            }
        }
        fi = c0.position;
    }
    None
}

/// Collect every byte start position in the stream, in order.
///
/// `first_start` must already be a validated boundary. The sweep ends when no
/// further qualifying triple exists, which is the natural end of the
/// recording rather than an error.
pub fn find_start_positions(
    samples: &[u8],
    first_start: usize,
    frames_per_bit: f64,
    bits_per_byte: usize,
    min_amplitude: u8,
) -> Vec<usize> {
    let skip = RESUME_RATIO * bits_per_byte as f64 * frames_per_bit;
    let mut positions = Vec::new();
    let mut pos = first_start;
    loop {
        positions.push(pos);
        let resume = (pos as f64 + skip).round() as usize;
        match find_next_start_bit(samples, resume, frames_per_bit, min_amplitude) {
            Some(next) => pos = next,
            None => break,
        }
    }
    positions
}
