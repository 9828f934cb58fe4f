//! Bit encoder.
//!
//! | Bit | Carrier on | Carrier off |
//! |-----|------------|-------------|
//! | 0   | 1000 µs    | 500 µs      |
//! | 1   | 500 µs     | 1000 µs     |
//!
//! Data bits go out MSB first, followed by one parity bit that is `1` when
//! the data byte has an even number of ones.

use diseqc_common::consts::{
    BIT0_HIGH_US, BIT0_LOW_US, BIT1_HIGH_US, BIT1_LOW_US, SEGMENTS_PER_BYTE,
};
use diseqc_common::hal::types::Segment;

/// Parity bit transmitted after `byte`.
#[inline]
pub const fn parity_bit(byte: u8) -> bool {
    byte.count_ones() % 2 == 0
}

/// The on/off pair for one bit.
#[inline]
pub const fn bit_segments(bit: bool, duty: u16) -> [Segment; 2] {
    if bit {
        [Segment::on(duty, BIT1_HIGH_US), Segment::off(BIT1_LOW_US)]
    } else {
        [Segment::on(duty, BIT0_HIGH_US), Segment::off(BIT0_LOW_US)]
    }
}

/// Encode one byte into 18 segments.
pub fn encode_byte(byte: u8, duty: u16) -> [Segment; SEGMENTS_PER_BYTE] {
    let mut out = [Segment::off(0); SEGMENTS_PER_BYTE];
    for i in 0..8 {
        let bit = byte & (0x80 >> i) != 0;
        let [on, off] = bit_segments(bit, duty);
        out[i * 2] = on;
        out[i * 2 + 1] = off;
    }
    let [on, off] = bit_segments(parity_bit(byte), duty);
    out[16] = on;
    out[17] = off;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use diseqc_common::hal::types::CarrierLevel;

    #[test]
    fn parity_is_set_for_even_popcount() {
        assert!(parity_bit(0x00));
        assert!(parity_bit(0x03));
        assert!(parity_bit(0xFF));
        assert!(!parity_bit(0x01));
        assert!(!parity_bit(0xE0));
        assert!(parity_bit(0x31));
    }

    #[test]
    fn parity_bit_matches_popcount_for_every_byte() {
        for byte in 0..=u8::MAX {
            assert_eq!(parity_bit(byte), byte.count_ones() % 2 == 0, "byte {byte:#04x}");
        }
    }

    #[test]
    fn bit_zero_is_long_burst_short_gap() {
        assert_eq!(bit_segments(false, 22), [Segment::on(22, 1000), Segment::off(500)]);
    }

    #[test]
    fn bit_one_is_short_burst_long_gap() {
        assert_eq!(bit_segments(true, 22), [Segment::on(22, 500), Segment::off(1000)]);
    }

    #[test]
    fn encode_byte_is_msb_first() {
        let segs = encode_byte(0x80, 22);
        assert_eq!(segs[0].duration_us, 500); // bit 7 = 1
        for i in 1..8 {
            assert_eq!(segs[i * 2].duration_us, 1000, "bit {} should be 0", 7 - i);
        }
        // One set bit: odd popcount, parity 0.
        assert_eq!(segs[16].duration_us, 1000);
    }

    #[test]
    fn encode_byte_alternates_levels() {
        for (i, seg) in encode_byte(0x5A, 7).iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(seg.level, CarrierLevel::On(7));
            } else {
                assert_eq!(seg.level, CarrierLevel::Off);
            }
        }
    }

    #[test]
    fn every_pair_lasts_one_bit_period() {
        for pair in encode_byte(0xA7, 22).chunks_exact(2) {
            assert_eq!(pair[0].duration_us + pair[1].duration_us, 1500);
        }
    }
}
