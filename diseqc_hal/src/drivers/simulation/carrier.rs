//! Simulated PWM carrier output.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use diseqc_common::hal::driver::CarrierOutput;
use diseqc_common::hal::types::CarrierLevel;
use tracing::trace;

use crate::trace::{SignalTrace, TraceEvent};

/// Carrier output that records every level change into a [`SignalTrace`].
///
/// Clones share the same trace and counters, so a test can keep one handle
/// while the engine owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingCarrier {
    trace: SignalTrace,
    changes: Arc<AtomicU32>,
}

impl RecordingCarrier {
    /// Create a carrier with its own trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a carrier that records into an existing trace.
    pub fn with_trace(trace: SignalTrace) -> Self {
        Self {
            trace,
            changes: Arc::new(AtomicU32::new(0)),
        }
    }

    /// The shared trace.
    pub fn trace(&self) -> &SignalTrace {
        &self.trace
    }

    /// Level currently applied.
    pub fn level(&self) -> CarrierLevel {
        self.trace.current_level()
    }

    /// Number of `set_level` calls so far.
    pub fn change_count(&self) -> u32 {
        self.changes.load(Ordering::Acquire)
    }
}

impl CarrierOutput for RecordingCarrier {
    fn name(&self) -> &'static str {
        "sim-carrier"
    }

    fn set_level(&mut self, level: CarrierLevel) {
        trace!(duty = level.duty(), "carrier level");
        self.trace.push(TraceEvent::Level(level));
        self.changes.fetch_add(1, Ordering::AcqRel);
    }
}
