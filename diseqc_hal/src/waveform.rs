//! Receiver-side decoder for DiSEqC pulse trains.
//!
//! Turns a replayed segment sequence back into command bytes the way a
//! positioner would: each carrier-on/carrier-off pair is one bit, a short
//! burst (≈ 0.5 ms) is `1` and a long burst (≈ 1.0 ms) is `0`, nine bits make
//! a byte plus its odd-parity bit.

use diseqc_common::consts::{
    BIT0_HIGH_US, BIT0_LOW_US, BIT1_HIGH_US, BIT1_LOW_US, BITS_PER_BYTE, MAX_FRAME_BYTES,
    SEGMENTS_PER_BYTE,
};
use diseqc_common::hal::types::{CommandBytes, Segment};
use thiserror::Error;

/// Default accepted deviation from nominal segment lengths [µs].
pub const DEFAULT_TOLERANCE_US: u16 = 150;

/// Decoding failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaveformError {
    /// No segments at all.
    #[error("empty waveform")]
    Empty,

    /// Segment count is not a whole number of bytes.
    #[error("truncated waveform: {segments} segments is not a multiple of 18")]
    Truncated {
        /// Segments received.
        segments: usize,
    },

    /// More than six bytes.
    #[error("waveform carries {bytes} bytes, at most 6 allowed")]
    TooLong {
        /// Bytes that would have been decoded.
        bytes: usize,
    },

    /// An on/off pair had the wrong level order.
    #[error("segment {index}: expected carrier {expected}")]
    UnexpectedLevel {
        /// Index of the offending segment.
        index: usize,
        /// `"on"` or `"off"`.
        expected: &'static str,
    },

    /// An on/off pair matched neither bit shape.
    #[error("bit at segment {index}: {on_us} µs on / {off_us} µs off is not a valid bit")]
    BadTiming {
        /// Index of the carrier-on segment.
        index: usize,
        /// Burst length [µs].
        on_us: u16,
        /// Gap length [µs].
        off_us: u16,
    },

    /// Parity bit disagrees with the data bits.
    #[error("parity error in byte {byte_index} (0x{value:02X})")]
    Parity {
        /// Position of the byte in the frame.
        byte_index: usize,
        /// Data bits as received.
        value: u8,
    },
}

/// Pulse-train decoder with a configurable timing tolerance.
#[derive(Debug, Clone, Copy)]
pub struct WaveformDecoder {
    tolerance_us: u16,
}

impl Default for WaveformDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_US)
    }
}

impl WaveformDecoder {
    /// Create a decoder accepting `±tolerance_us` around nominal lengths.
    pub const fn new(tolerance_us: u16) -> Self {
        Self { tolerance_us }
    }

    fn near(&self, actual: u16, nominal: u16) -> bool {
        actual.abs_diff(nominal) <= self.tolerance_us
    }

    fn decode_bit(&self, index: usize, on: &Segment, off: &Segment) -> Result<bool, WaveformError> {
        if !on.level.is_on() {
            return Err(WaveformError::UnexpectedLevel {
                index,
                expected: "on",
            });
        }
        if off.level.is_on() {
            return Err(WaveformError::UnexpectedLevel {
                index: index + 1,
                expected: "off",
            });
        }
        let (on_us, off_us) = (on.duration_us, off.duration_us);
        if self.near(on_us, BIT1_HIGH_US) && self.near(off_us, BIT1_LOW_US) {
            Ok(true)
        } else if self.near(on_us, BIT0_HIGH_US) && self.near(off_us, BIT0_LOW_US) {
            Ok(false)
        } else {
            Err(WaveformError::BadTiming {
                index,
                on_us,
                off_us,
            })
        }
    }

    /// Decode a full frame.
    ///
    /// # Errors
    /// See [`WaveformError`]; the first problem found is reported.
    pub fn decode(&self, segments: &[Segment]) -> Result<CommandBytes, WaveformError> {
        if segments.is_empty() {
            return Err(WaveformError::Empty);
        }
        if segments.len() % SEGMENTS_PER_BYTE != 0 {
            return Err(WaveformError::Truncated {
                segments: segments.len(),
            });
        }
        let byte_count = segments.len() / SEGMENTS_PER_BYTE;
        if byte_count > MAX_FRAME_BYTES {
            return Err(WaveformError::TooLong { bytes: byte_count });
        }

        let mut bytes = CommandBytes::new();
        for (byte_index, chunk) in segments.chunks_exact(SEGMENTS_PER_BYTE).enumerate() {
            let base = byte_index * SEGMENTS_PER_BYTE;
            let mut value = 0u8;
            let mut parity = false;
            for bit in 0..BITS_PER_BYTE {
                let level = self.decode_bit(base + bit * 2, &chunk[bit * 2], &chunk[bit * 2 + 1])?;
                if bit < 8 {
                    value = (value << 1) | level as u8;
                } else {
                    parity = level;
                }
            }
            // Data plus parity always carries an odd number of ones.
            if parity != (value.count_ones() % 2 == 0) {
                return Err(WaveformError::Parity { byte_index, value });
            }
            bytes
                .push(value)
                .map_err(|_| WaveformError::TooLong { bytes: byte_count })?;
        }
        Ok(bytes)
    }
}

/// Decode with the default tolerance.
pub fn decode(segments: &[Segment]) -> Result<CommandBytes, WaveformError> {
    WaveformDecoder::default().decode(segments)
}
