//! KCS waveform synthesis.
//!
//! Renders a byte sequence into unsigned 8-bit PCM: a "0" bit is one cycle at
//! half the base frequency, a "1" bit two cycles of the base frequency, each
//! byte framed as one zero start bit, data bits LSB first, and one or two one
//! stop bits. Leader and trailer carry the idle mark tone.

use crate::error::{KcsError, Result};
use crate::{BIAS, DEFAULT_BASE_FREQUENCY, DEFAULT_DATA_BITS, DEFAULT_STOP_BITS};
use std::f64::consts::PI;

/// Encoder configuration. Framing fields must match the decoder that will
/// read the tape back.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Frequency of the mark tone in Hz.
    pub base_frequency: u32,
    /// Data bits per frame (1 through 8).
    pub data_bits: usize,
    /// Stop bits per frame (1 or 2).
    pub stop_bits: usize,
    /// Peak deviation from the bias level.
    pub amplitude: u8,
    /// Mark tone before the first byte, in seconds.
    pub leader_secs: f64,
    /// Mark tone after the last byte, in seconds.
    pub trailer_secs: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            base_frequency: DEFAULT_BASE_FREQUENCY,
            data_bits: DEFAULT_DATA_BITS,
            stop_bits: DEFAULT_STOP_BITS,
            amplitude: 100,
            leader_secs: 0.25,
            trailer_secs: 0.25,
        }
    }
}

pub struct Encoder {
    config: EncoderConfig,
}

impl Encoder {
    pub fn new(config: EncoderConfig) -> Result<Self> {
        if config.base_frequency == 0 {
            return Err(KcsError::InvalidConfig(
                "base frequency must be positive".into(),
            ));
        }
        if config.data_bits == 0 || config.data_bits > 8 {
            return Err(KcsError::InvalidConfig(format!(
                "data bits must be between 1 and 8, got {}",
                config.data_bits
            )));
        }
        if config.stop_bits == 0 || config.stop_bits > 2 {
            return Err(KcsError::InvalidConfig(format!(
                "stop bits must be 1 or 2, got {}",
                config.stop_bits
            )));
        }
        if config.amplitude == 0 || config.amplitude > 127 {
            return Err(KcsError::InvalidConfig(format!(
                "amplitude must be between 1 and 127, got {}",
                config.amplitude
            )));
        }
        Ok(Self { config })
    }

    /// Render `data` into a sample buffer at the given rate.
    pub fn encode(&self, data: &[u8], sample_rate: u32) -> Vec<u8> {
        let frames_per_bit =
            2.0 * f64::from(sample_rate) / f64::from(self.config.base_frequency);
        let bits = self.frame_bits(data, sample_rate, frames_per_bit);

        let total = (bits.len() as f64 * frames_per_bit).round() as usize;
        let mut samples = Vec::with_capacity(total);
        for (i, &bit) in bits.iter().enumerate() {
            let cell_start = (i as f64 * frames_per_bit).round() as usize;
            let cell_end = ((i + 1) as f64 * frames_per_bit).round() as usize;
            let freq = if bit == 1 {
                f64::from(self.config.base_frequency)
            } else {
                f64::from(self.config.base_frequency) / 2.0
            };
            let step = 2.0 * PI * freq / f64::from(sample_rate);
            for n in 0..cell_end - cell_start {
                let value = f64::from(BIAS)
                    + f64::from(self.config.amplitude) * (step * n as f64).sin();
                samples.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }
        samples
    }

    /// Expand the byte sequence into the full bit stream, leader and trailer
    /// included.
    fn frame_bits(&self, data: &[u8], sample_rate: u32, frames_per_bit: f64) -> Vec<u8> {
        let leader_bits =
            (self.config.leader_secs * f64::from(sample_rate) / frames_per_bit).round() as usize;
        let trailer_bits =
            (self.config.trailer_secs * f64::from(sample_rate) / frames_per_bit).round() as usize;

        let bits_per_byte = 1 + self.config.data_bits + self.config.stop_bits;
        let mut bits = Vec::with_capacity(leader_bits + data.len() * bits_per_byte + trailer_bits);
        bits.extend(std::iter::repeat(1u8).take(leader_bits));
        for &byte in data {
            bits.push(0);
            for bit in 0..self.config.data_bits {
                bits.push((byte >> bit) & 1);
            }
            bits.extend(std::iter::repeat(1u8).take(self.config.stop_bits));
        }
        bits.extend(std::iter::repeat(1u8).take(trailer_bits));
        bits
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(EncoderConfig::default()).unwrap()
    }
}
