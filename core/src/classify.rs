//! Per-bit mark/space classification.
//!
//! Within one bit window a mark carries two cycles of the base frequency and
//! a space one cycle at half of it, so the two differ in how many zero
//! crossings fall inside the window and where they sit.

use crate::crossing::{next_crossing, Direction};
use crate::BIAS;

/// Samples trimmed from each edge of a bit window before classification, so
/// crossing artifacts from the adjacent bit stay out.
const TRIM_MARGIN: usize = 2;

/// Tolerance around the trimmed window's mid-point for a lone crossing.
const MIDDLE_MARGIN: usize = 4;

/// Tolerance, in samples, for the measured half-cycle width of a space bit.
const HALF_CYCLE_MARGIN: f64 = 3.0;

/// Bit value assigned to a window containing no zero crossings at all.
///
/// A quiet window reads as the idle mark tone between frames, hence 1. This
/// is a deliberate fixed choice; decoders in this format's history have
/// resolved the degenerate case both ways.
pub const QUIET_WINDOW_BIT: u8 = 1;

/// Shift a window so its mean amplitude sits on the bias level.
///
/// Compensates baseline drift from tape wow/flutter or AC coupling before
/// classification. Shifted samples are clamped to the valid 0-255 range.
pub fn correct_dc_offset(window: &[u8]) -> Vec<u8> {
    if window.is_empty() {
        return Vec::new();
    }
    let mean = window.iter().map(|&s| f64::from(s)).sum::<f64>() / window.len() as f64;
    let shift = f64::from(BIAS) - mean;
    window
        .iter()
        .map(|&s| (f64::from(s) + shift).round().clamp(0.0, 255.0) as u8)
        .collect()
}

/// Decide whether a bit window holds a space (0) or a mark (1).
pub fn classify_window(window: &[u8]) -> u8 {
    if window.len() <= 2 * TRIM_MARGIN {
        return QUIET_WINDOW_BIT;
    }
    let trimmed = &window[TRIM_MARGIN..window.len() - TRIM_MARGIN];
    let first = match next_crossing(trimmed, 0) {
        Some(crossing) => crossing,
        None => return QUIET_WINDOW_BIT,
    };

    let space = if first.direction == Direction::Up {
        // An up crossing early in the window: a space shows its down crossing
        // half a window later.
        match next_crossing(trimmed, first.position) {
            Some(second) => {
                let half_cycle = (second.position - first.position) as f64;
                (half_cycle - window.len() as f64 / 2.0).abs() < HALF_CYCLE_MARGIN
            }
            None => false,
        }
    } else {
        // Window opened above bias: a space puts its lone down crossing at
        // the mid-point.
        let middle = (trimmed.len() as f64 / 2.0).round() as usize;
        let low = middle.saturating_sub(MIDDLE_MARGIN);
        first.position >= low && first.position < middle + MIDDLE_MARGIN
    };
    if space {
        0
    } else {
        1
    }
}
