//! Segment and carrier types shared between the encoder, the scheduler and
//! the carrier drivers.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::consts::{MAX_FRAME_BYTES, MAX_SEGMENTS};

/// Output level of the 22 kHz carrier during one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarrierLevel {
    /// Carrier suppressed (PWM compare = 0).
    Off,
    /// Carrier running at the given PWM compare value [timer ticks].
    On(u16),
}

impl CarrierLevel {
    /// Whether the carrier is present.
    #[inline]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On(_))
    }

    /// PWM compare value to load into the timer (0 = off).
    #[inline]
    pub const fn duty(&self) -> u16 {
        match self {
            Self::Off => 0,
            Self::On(duty) => *duty,
        }
    }
}

impl Default for CarrierLevel {
    fn default() -> Self {
        Self::Off
    }
}

/// One timed window of carrier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// Carrier level applied for the whole window.
    pub level: CarrierLevel,
    /// Window length [µs].
    pub duration_us: u16,
}

impl Segment {
    /// Carrier-on window.
    #[inline]
    pub const fn on(duty: u16, duration_us: u16) -> Self {
        Self {
            level: CarrierLevel::On(duty),
            duration_us,
        }
    }

    /// Carrier-off window.
    #[inline]
    pub const fn off(duration_us: u16) -> Self {
        Self {
            level: CarrierLevel::Off,
            duration_us,
        }
    }
}

// Segment buffers live in fixed arenas replayed from timer context.
const_assert!(core::mem::size_of::<Segment>() <= 8);

/// Fixed-capacity segment arena for one frame (108 entries).
pub type SegmentBuffer = heapless::Vec<Segment, MAX_SEGMENTS>;

/// Raw command bytes of one frame (1–6 bytes).
pub type CommandBytes = heapless::Vec<u8, MAX_FRAME_BYTES>;
