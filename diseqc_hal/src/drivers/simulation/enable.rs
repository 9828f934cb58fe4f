//! Simulated motor power-enable GPIO.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use diseqc_common::hal::driver::EnableLine;
use tracing::debug;

/// Enable line backed by an atomic flag.
///
/// Clones observe the same pin.
#[derive(Debug, Clone, Default)]
pub struct SimEnableLine {
    high: Arc<AtomicBool>,
    edges: Arc<AtomicU32>,
}

impl SimEnableLine {
    /// Create a line that starts low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pin level.
    pub fn is_high(&self) -> bool {
        self.high.load(Ordering::Acquire)
    }

    /// Number of level changes (writes of the same level do not count).
    pub fn edge_count(&self) -> u32 {
        self.edges.load(Ordering::Acquire)
    }
}

impl EnableLine for SimEnableLine {
    fn name(&self) -> &'static str {
        "sim-enable"
    }

    fn set(&mut self, high: bool) {
        let previous = self.high.swap(high, Ordering::AcqRel);
        if previous != high {
            self.edges.fetch_add(1, Ordering::AcqRel);
            debug!(high, "motor enable line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_low() {
        let line = SimEnableLine::new();
        assert!(!line.is_high());
        assert_eq!(line.edge_count(), 0);
    }

    #[test]
    fn counts_only_edges() {
        let observer = SimEnableLine::new();
        let mut line = observer.clone();
        line.set(true);
        line.set(true);
        line.set(false);
        assert!(!observer.is_high());
        assert_eq!(observer.edge_count(), 2);
    }
}
