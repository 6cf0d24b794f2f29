//! Waveform-to-byte decode pipeline.
//!
//! Drives the stages in order: optional noise filtering, bit-rate
//! calibration, start-bit synchronization, then per-byte bit classification
//! and framing checks. Framing violations are recoverable (cassette
//! recordings routinely contain isolated glitches); an over-wide byte window
//! means the end of recorded data and stops the loop.

use crate::calibrate::{calibrate, CalibrationResult};
use crate::classify::{classify_window, correct_dc_offset};
use crate::config::DecoderConfig;
use crate::error::Result;
use crate::filter::moving_average;
use crate::sync::{find_next_start_bit, find_start_positions};
use log::{debug, info, warn};

/// One decoded byte and the sample index where its frame started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedByte {
    pub value: u8,
    pub source_offset: usize,
}

/// Raw window data for a single byte, captured when
/// [`DecoderConfig::diagnostic_byte_index`] selects it. Rendering is left to
/// external tooling.
#[derive(Debug, Clone)]
pub struct ByteDiagnostics {
    pub byte_index: usize,
    /// Sample index where the byte frame starts.
    pub start_frame: usize,
    /// The frame's samples, after any noise filtering.
    pub window: Vec<u8>,
    /// Offsets of each bit boundary within `window`, including the end.
    pub bit_offsets: Vec<usize>,
    /// Classified bit values, start bit first.
    pub bits: Vec<u8>,
    pub value: u8,
}

/// Everything produced by one decode run.
#[derive(Debug, Clone)]
pub struct DecodeOutput {
    pub bytes: Vec<DecodedByte>,
    /// Measured bit width; `None` when an override skipped calibration.
    pub calibration: Option<CalibrationResult>,
    pub diagnostics: Option<ByteDiagnostics>,
    /// Frames whose start bit did not read as zero.
    pub start_bit_errors: usize,
    /// Frames whose first stop bit did not read as one.
    pub stop_bit_errors: usize,
}

/// Bits of one frame together with their window boundaries.
struct ByteFrame {
    bits: Vec<u8>,
    bit_offsets: Vec<usize>,
}

pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Decode a full recording into its byte sequence.
    ///
    /// `samples` are unsigned 8-bit amplitudes centered at the bias level;
    /// the whole recording must be present before decoding starts.
    pub fn decode(&self, samples: &[u8], sample_rate: u32) -> Result<DecodeOutput> {
        let filtered;
        let samples: &[u8] = match self.config.noise_window {
            Some(window) => {
                filtered = moving_average(samples, window);
                &filtered
            }
            None => samples,
        };

        let (frames_per_bit, calibration) = match self.config.frames_per_bit_override {
            Some(fpb) => {
                debug!("skipping calibration, frames per bit forced to {:.4}", fpb);
                (fpb, None)
            }
            None => {
                let result = calibrate(samples, sample_rate, &self.config)?;
                info!(
                    "frames per bit after {} samples: {:.4}, last sample at {:.5}s, real baud rate {}",
                    result.accepted_samples,
                    result.frames_per_bit,
                    result.last_sample_secs,
                    (2.0 * f64::from(sample_rate) / result.frames_per_bit).round() as u32
                );
                (result.frames_per_bit, Some(result))
            }
        };

        let min_amplitude = self.config.min_crossing_amplitude;
        let bits_per_byte = self.config.bits_per_byte();
        let starts = match find_next_start_bit(samples, 0, frames_per_bit, min_amplitude) {
            Some(first) => {
                find_start_positions(samples, first, frames_per_bit, bits_per_byte, min_amplitude)
            }
            None => Vec::new(),
        };
        info!("found {} start bits", starts.len());

        let nominal_width = (bits_per_byte as f64 * frames_per_bit).round() as usize;
        let mut output = DecodeOutput {
            bytes: Vec::with_capacity(starts.len()),
            calibration,
            diagnostics: None,
            start_bit_errors: 0,
            stop_bit_errors: 0,
        };

        for (index, &start) in starts.iter().enumerate() {
            let end = match starts.get(index + 1) {
                Some(&next) => next,
                // The last frame has no successor boundary; give it a nominal
                // window.
                None => start + nominal_width,
            };
            if end > samples.len() {
                debug!("byte {} cut off at end of recording, dropped", index);
                break;
            }
            let window = &samples[start..end];
            let frame = match self.read_bits(window, frames_per_bit) {
                Some(frame) => frame,
                None => {
                    info!(
                        "byte {} spans more than {} bit widths, treating as end of data",
                        index, self.config.max_bits_per_byte
                    );
                    break;
                }
            };
            if frame.bits[0] != 0 {
                warn!("start bit is not zero at byte {}", index);
                output.start_bit_errors += 1;
            }
            if frame.bits[1 + self.config.data_bits] != 1 {
                warn!("stop bit is not one at byte {}", index);
                output.stop_bit_errors += 1;
            }
            let value = self.pack_byte(&frame.bits);
            if self.config.diagnostic_byte_index == Some(index) {
                output.diagnostics = Some(ByteDiagnostics {
                    byte_index: index,
                    start_frame: start,
                    window: window.to_vec(),
                    bit_offsets: frame.bit_offsets,
                    bits: frame.bits,
                    value,
                });
            }
            output.bytes.push(DecodedByte {
                value,
                source_offset: start,
            });
        }
        info!("decoded {} bytes", output.bytes.len());
        Ok(output)
    }

    /// Classify each bit window of one frame.
    ///
    /// The frame width adapts: extra stop-bit cycles or drift widen the
    /// window, so the assumed bit count grows while the width still exceeds
    /// `(bits + 0.7)` bit times. Returns `None` when the window cannot be a
    /// frame at all (wider than `max_bits_per_byte` bit times).
    fn read_bits(&self, window: &[u8], frames_per_bit: f64) -> Option<ByteFrame> {
        let mut assumed_bits = self.config.bits_per_byte();
        while window.len() as f64 > (assumed_bits as f64 + 0.7) * frames_per_bit {
            assumed_bits += 1;
            if assumed_bits > self.config.max_bits_per_byte {
                return None;
            }
        }
        let local_width = window.len() as f64 / assumed_bits as f64;

        let decoded_bits = self.config.bits_per_byte();
        let mut bits = Vec::with_capacity(decoded_bits);
        let mut bit_offsets = Vec::with_capacity(decoded_bits + 1);
        for bi in 0..decoded_bits {
            let from = (bi as f64 * local_width).round() as usize;
            let to = (((bi + 1) as f64 * local_width).round() as usize).min(window.len());
            bit_offsets.push(from);
            let bit_window = &window[from..to];
            let bit = if self.config.offset_adjust {
                classify_window(&correct_dc_offset(bit_window))
            } else {
                classify_window(bit_window)
            };
            bits.push(bit);
        }
        bit_offsets.push(window.len());
        Some(ByteFrame { bits, bit_offsets })
    }

    /// Pack the data bits, least significant first, into the output value.
    fn pack_byte(&self, bits: &[u8]) -> u8 {
        let mut value = 0u8;
        for (i, &bit) in bits[1..=self.config.data_bits].iter().enumerate() {
            if bit != 0 {
                value |= 1 << i;
            }
        }
        value
    }
}
