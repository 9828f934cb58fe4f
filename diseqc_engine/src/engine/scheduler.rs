//! Segment replay scheduler.
//!
//! Pure state: no timer, no carrier. The transmitter applies whatever step
//! the scheduler yields and re-arms the timing source for its duration.
//!
//! ```text
//!   start() ──► Apply(seg[0])          cursor = 1
//!   advance() ─► Apply(seg[cursor])    cursor += 1
//!   advance() ─► Complete              cursor == len
//! ```

use diseqc_common::hal::types::{Segment, SegmentBuffer};

/// What the transmitter must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStep {
    /// Apply this segment's level and arm the timer for its duration.
    Apply(Segment),
    /// Every segment has been replayed; carrier off, back to idle.
    Complete,
}

/// Replay cursor over one built frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentScheduler {
    segments: SegmentBuffer,
    cursor: usize,
}

impl SegmentScheduler {
    /// Wrap a built frame. Nothing is replayed until [`start`](Self::start).
    pub fn new(segments: SegmentBuffer) -> Self {
        Self {
            segments,
            cursor: 0,
        }
    }

    /// Yield the first segment.
    pub fn start(&mut self) -> SchedulerStep {
        self.cursor = 0;
        self.advance()
    }

    /// Yield the next segment, or `Complete` once all were handed out.
    #[inline]
    pub fn advance(&mut self) -> SchedulerStep {
        match self.segments.get(self.cursor) {
            Some(segment) => {
                self.cursor += 1;
                SchedulerStep::Apply(*segment)
            }
            None => SchedulerStep::Complete,
        }
    }

    /// Segments handed out so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Frame length in segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the frame has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments not yet handed out.
    pub fn remaining(&self) -> usize {
        self.segments.len() - self.cursor
    }

    /// The frame being replayed.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Transmission engine state.
///
/// `Idle` holds no buffer; the arena lives only as long as the transmission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EngineState {
    /// Ready for a command.
    #[default]
    Idle,
    /// Replaying a frame.
    Transmitting(SegmentScheduler),
}

impl EngineState {
    /// Whether a frame is in flight.
    #[inline]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Transmitting(_))
    }
}
