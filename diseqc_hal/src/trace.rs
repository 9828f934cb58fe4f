//! Shared recording of what the simulated drivers were asked to do.
//!
//! The engine applies a level and then arms the timer for the segment length,
//! so the trace alternates `Level`, `Armed`, `Level`, `Armed`, ... and ends
//! with a final `Level(Off)` once the frame completes. [`SignalTrace::segments`]
//! pairs them back into [`Segment`]s for the waveform decoder.

use std::sync::Arc;

use diseqc_common::hal::types::{CarrierLevel, Segment};
use parking_lot::Mutex;

/// One recorded driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// `CarrierOutput::set_level` was called.
    Level(CarrierLevel),
    /// `TimingSource::arm_one_shot` was called with this duration [µs].
    Armed(u32),
}

/// Cloneable handle to a shared event log.
#[derive(Debug, Clone, Default)]
pub struct SignalTrace {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl SignalTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&self, event: TraceEvent) {
        self.events.lock().push(event);
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Forget all events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Last level applied to the carrier, `Off` if none.
    pub fn current_level(&self) -> CarrierLevel {
        self.events.lock()
            .iter()
            .rev()
            .find_map(|e| match e {
                TraceEvent::Level(level) => Some(*level),
                TraceEvent::Armed(_) => None,
            })
            .unwrap_or_default()
    }

    /// Rebuild the replayed segments.
    ///
    /// A level immediately followed by an arm becomes one segment; a level
    /// that was never timed (the trailing carrier-off) is dropped.
    pub fn segments(&self) -> Vec<Segment> {
        let events = self.events.lock();
        let mut out = Vec::with_capacity(events.len() / 2);
        let mut pending: Option<CarrierLevel> = None;
        for event in events.iter() {
            match *event {
                TraceEvent::Level(level) => pending = Some(level),
                TraceEvent::Armed(duration_us) => {
                    if let Some(level) = pending.take() {
                        out.push(Segment {
                            level,
                            duration_us: duration_us.min(u16::MAX as u32) as u16,
                        });
                    }
                }
            }
        }
        out
    }
}
