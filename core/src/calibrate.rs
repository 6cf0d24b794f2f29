//! Bit-rate calibration.
//!
//! Estimates how many audio samples span one encoded bit using only the
//! recording itself: no external clock, no header. Space bits carry one full
//! cycle at half the base frequency, so their half-cycles are exactly the
//! expected half-bit width; crossing intervals near that width are averaged.

use crate::config::DecoderConfig;
use crate::crossing::next_crossing;
use crate::error::{KcsError, Result};
use crate::CALIBRATION_SAMPLE_CAP;
use log::debug;

/// Result of measuring the encoded bit width.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationResult {
    /// Number of audio samples spanned by one encoded bit.
    pub frames_per_bit: f64,
    /// Crossing intervals that passed the width and amplitude checks.
    /// Always positive; zero accepted intervals is a [`KcsError::CalibrationFailure`].
    pub accepted_samples: usize,
    /// Time of the last crossing examined, in seconds.
    pub last_sample_secs: f64,
}

/// Measure frames-per-bit from the signal.
///
/// An interval between consecutive crossings is accepted when its width is
/// within one third of the expected half-bit width and the signal actually
/// swung past the minimum amplitude in between. Accumulation stops at
/// [`CALIBRATION_SAMPLE_CAP`] accepted intervals so very long recordings do
/// not slow calibration down.
pub fn calibrate(
    samples: &[u8],
    sample_rate: u32,
    config: &DecoderConfig,
) -> Result<CalibrationResult> {
    let expected_half_bit = f64::from(sample_rate) / f64::from(config.base_frequency);
    let margin = expected_half_bit / 3.0;

    let mut fi = (config.calibration_start_secs * f64::from(sample_rate)).round() as usize;
    let mut accepted = 0usize;
    let mut width_acc = 0usize;
    let mut last_position = fi;

    while let Some(crossing) = next_crossing(samples, fi) {
        let width = crossing.position - fi;
        if (width as f64 - expected_half_bit).abs() < margin
            && crossing.peak_deviation > config.min_crossing_amplitude
        {
            accepted += 1;
            width_acc += width;
        }
        last_position = crossing.position;
        if accepted >= CALIBRATION_SAMPLE_CAP {
            debug!("calibration cap of {} intervals reached", CALIBRATION_SAMPLE_CAP);
            break;
        }
        fi = crossing.position;
    }

    if accepted == 0 {
        return Err(KcsError::CalibrationFailure);
    }

    Ok(CalibrationResult {
        frames_per_bit: 2.0 * width_acc as f64 / accepted as f64,
        accepted_samples: accepted,
        last_sample_secs: last_position as f64 / f64::from(sample_rate),
    })
}
