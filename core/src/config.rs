use crate::error::{KcsError, Result};
use crate::{
    DEFAULT_BASE_FREQUENCY, DEFAULT_DATA_BITS, DEFAULT_MAX_BITS_PER_BYTE,
    DEFAULT_MIN_CROSSING_AMPLITUDE, DEFAULT_STOP_BITS,
};

/// Decoder configuration.
///
/// Built once by the caller and handed to [`crate::Decoder::new`] by value;
/// nothing in the decode path mutates it.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Frequency of the mark tone in Hz.
    pub base_frequency: u32,
    /// Data bits per frame (1 through 8).
    pub data_bits: usize,
    /// Stop bits per frame (1 or 2).
    pub stop_bits: usize,
    /// Moving-average window for the noise filter; `None` disables filtering.
    /// Must be odd and at least 3.
    pub noise_window: Option<usize>,
    /// Skip calibration and use this frames-per-bit value directly.
    pub frames_per_bit_override: Option<f64>,
    /// Re-center each bit window on the bias level before classifying it.
    pub offset_adjust: bool,
    /// Minimum peak deviation from bias for a crossing interval to count.
    pub min_crossing_amplitude: u8,
    /// Widest frame, in bit times, a byte window may span before the decoder
    /// treats the window as the end of recorded data.
    pub max_bits_per_byte: usize,
    /// Capture the raw sample window and bit boundaries of this byte for
    /// external plotting.
    pub diagnostic_byte_index: Option<usize>,
    /// Offset into the recording, in seconds, where calibration starts.
    pub calibration_start_secs: f64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            base_frequency: DEFAULT_BASE_FREQUENCY,
            data_bits: DEFAULT_DATA_BITS,
            stop_bits: DEFAULT_STOP_BITS,
            noise_window: None,
            frames_per_bit_override: None,
            offset_adjust: false,
            min_crossing_amplitude: DEFAULT_MIN_CROSSING_AMPLITUDE,
            max_bits_per_byte: DEFAULT_MAX_BITS_PER_BYTE,
            diagnostic_byte_index: None,
            calibration_start_secs: 0.0,
        }
    }
}

impl DecoderConfig {
    /// Total bits per encoded byte: start bit + data bits + stop bits.
    pub fn bits_per_byte(&self) -> usize {
        1 + self.data_bits + self.stop_bits
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_frequency == 0 {
            return Err(KcsError::InvalidConfig(
                "base frequency must be positive".into(),
            ));
        }
        if self.data_bits == 0 || self.data_bits > 8 {
            return Err(KcsError::InvalidConfig(format!(
                "data bits must be between 1 and 8, got {}",
                self.data_bits
            )));
        }
        if self.stop_bits == 0 || self.stop_bits > 2 {
            return Err(KcsError::InvalidConfig(format!(
                "stop bits must be 1 or 2, got {}",
                self.stop_bits
            )));
        }
        if let Some(window) = self.noise_window {
            if window < 3 || window % 2 == 0 {
                return Err(KcsError::InvalidConfig(format!(
                    "noise window must be an odd size of at least 3, got {}",
                    window
                )));
            }
        }
        if let Some(fpb) = self.frames_per_bit_override {
            if !fpb.is_finite() || fpb <= 0.0 {
                return Err(KcsError::InvalidConfig(format!(
                    "frames-per-bit override must be positive, got {}",
                    fpb
                )));
            }
        }
        if self.max_bits_per_byte < self.bits_per_byte() {
            return Err(KcsError::InvalidConfig(format!(
                "max bits per byte {} is below the frame size {}",
                self.max_bits_per_byte,
                self.bits_per_byte()
            )));
        }
        if !self.calibration_start_secs.is_finite() || self.calibration_start_secs < 0.0 {
            return Err(KcsError::InvalidConfig(
                "calibration start offset must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
