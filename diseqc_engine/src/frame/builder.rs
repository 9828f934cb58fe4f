//! Frame builder: command bytes → segment arena.

use diseqc_common::consts::{MAX_FRAME_BYTES, SEGMENTS_PER_BYTE};
use diseqc_common::hal::types::SegmentBuffer;
use diseqc_common::protocol::status::DiseqcError;

use super::encoder::encode_byte;

/// Builds segment arenas at a fixed carrier duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBuilder {
    duty: u16,
}

impl FrameBuilder {
    /// Builder emitting carrier-on segments at `duty` timer ticks.
    pub const fn new(duty: u16) -> Self {
        Self { duty }
    }

    /// PWM compare value used for carrier-on segments.
    pub const fn duty(&self) -> u16 {
        self.duty
    }

    /// Encode 1–6 bytes into exactly `bytes.len() * 18` segments.
    ///
    /// # Errors
    /// `InvalidParam` for an empty or oversized frame.
    pub fn build(&self, bytes: &[u8]) -> Result<SegmentBuffer, DiseqcError> {
        if bytes.is_empty() {
            return Err(DiseqcError::InvalidParam("empty frame"));
        }
        if bytes.len() > MAX_FRAME_BYTES {
            return Err(DiseqcError::InvalidParam("frame longer than 6 bytes"));
        }
        let mut segments = SegmentBuffer::new();
        for &byte in bytes {
            segments
                .extend_from_slice(&encode_byte(byte, self.duty))
                .map_err(|_| DiseqcError::InvalidParam("segment capacity"))?;
        }
        debug_assert_eq!(segments.len(), bytes.len() * SEGMENTS_PER_BYTE);
        Ok(segments)
    }
}

/// Encode with a one-off builder.
pub fn encode(bytes: &[u8], duty: u16) -> Result<SegmentBuffer, DiseqcError> {
    FrameBuilder::new(duty).build(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diseqc_common::consts::MAX_SEGMENTS;

    #[test]
    fn length_is_eighteen_per_byte() {
        for len in 1..=MAX_FRAME_BYTES {
            let bytes = vec![0xA5; len];
            assert_eq!(encode(&bytes, 22).unwrap().len(), len * 18);
        }
    }

    #[test]
    fn full_frame_fills_the_arena() {
        let segs = encode(&[0xFF; 6], 22).unwrap();
        assert_eq!(segs.len(), MAX_SEGMENTS);
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert_eq!(
            encode(&[], 22),
            Err(DiseqcError::InvalidParam("empty frame"))
        );
        assert!(matches!(
            encode(&[0; 7], 22),
            Err(DiseqcError::InvalidParam(_))
        ));
    }

    #[test]
    fn bytes_are_laid_out_in_order() {
        let segs = encode(&[0x00, 0xFF], 22).unwrap();
        // First data bit of 0x00 is a 0, of 0xFF a 1.
        assert_eq!(segs[0].duration_us, 1000);
        assert_eq!(segs[18].duration_us, 500);
    }

    #[test]
    fn duty_is_carried_into_on_segments() {
        let builder = FrameBuilder::new(31);
        assert_eq!(builder.duty(), 31);
        let segs = builder.build(&[0x60]).unwrap();
        assert_eq!(segs[0].level.duty(), 31);
        assert_eq!(segs[1].level.duty(), 0);
    }
}
