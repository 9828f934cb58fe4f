//! Simulated one-shot timing sources.
//!
//! - [`SteppedTimer`] never fires on its own; tests call [`SteppedTimer::fire`]
//!   to deliver expiries one at a time on the test thread.
//! - [`ThreadTimer`] runs a worker thread that sleeps until the deadline and
//!   invokes the callback there, the host stand-in for a timer interrupt.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use diseqc_common::hal::driver::{ExpiryCallback, HalError, TimingSource};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::trace::{SignalTrace, TraceEvent};

// ─── Stepped ────────────────────────────────────────────────────────

#[derive(Default)]
struct SteppedInner {
    pending: Mutex<Option<(u32, ExpiryCallback)>>,
    arms: AtomicU32,
    elapsed_us: AtomicU64,
    trace: Option<SignalTrace>,
}

/// Manually advanced timing source.
///
/// Arming stores the callback; [`fire`](Self::fire) takes it and runs it,
/// advancing a virtual clock by the armed duration. Clones share state.
#[derive(Clone, Default)]
pub struct SteppedTimer {
    inner: Arc<SteppedInner>,
}

impl SteppedTimer {
    /// Create a timer with no trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a timer that also records every arm into `trace`.
    pub fn with_trace(trace: SignalTrace) -> Self {
        Self {
            inner: Arc::new(SteppedInner {
                trace: Some(trace),
                ..Default::default()
            }),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<(u32, ExpiryCallback)>> {
        self.inner.pending.lock()
    }

    /// Deliver the pending expiry, if any.
    ///
    /// The callback runs after the internal lock is released, so it may
    /// re-arm this timer.
    pub fn fire(&self) -> bool {
        let Some((duration_us, on_expire)) = self.pending().take() else {
            return false;
        };
        self.inner
            .elapsed_us
            .fetch_add(duration_us as u64, Ordering::AcqRel);
        on_expire();
        true
    }

    /// Fire repeatedly until nothing is armed or `max_fires` is reached.
    ///
    /// Returns the number of expiries delivered.
    pub fn run_until_idle(&self, max_fires: usize) -> usize {
        let mut fired = 0;
        while fired < max_fires && self.fire() {
            fired += 1;
        }
        fired
    }

    /// Whether a one-shot is pending.
    pub fn is_armed(&self) -> bool {
        self.pending().is_some()
    }

    /// Duration of the pending one-shot [µs].
    pub fn pending_duration(&self) -> Option<u32> {
        self.pending().as_ref().map(|(d, _)| *d)
    }

    /// Total number of `arm_one_shot` calls.
    pub fn arm_count(&self) -> u32 {
        self.inner.arms.load(Ordering::Acquire)
    }

    /// Virtual time consumed by delivered expiries [µs].
    pub fn elapsed_us(&self) -> u64 {
        self.inner.elapsed_us.load(Ordering::Acquire)
    }
}

impl TimingSource for SteppedTimer {
    fn name(&self) -> &'static str {
        "sim-stepped"
    }

    fn arm_one_shot(&self, duration_us: u32, on_expire: ExpiryCallback) {
        if let Some(trace) = &self.inner.trace {
            trace.push(TraceEvent::Armed(duration_us));
        }
        self.inner.arms.fetch_add(1, Ordering::AcqRel);
        *self.pending() = Some((duration_us, on_expire));
    }
}

// ─── Thread-backed ──────────────────────────────────────────────────

enum TimerMsg {
    Arm {
        deadline: Instant,
        on_expire: ExpiryCallback,
    },
    Shutdown,
}

struct ThreadInner {
    tx: Sender<TimerMsg>,
    worker: Mutex<Option<JoinHandle<()>>>,
    fired: Arc<AtomicU32>,
    trace: Option<SignalTrace>,
}

impl Drop for ThreadInner {
    fn drop(&mut self) {
        let _ = self.tx.send(TimerMsg::Shutdown);
        let handle = self.worker.get_mut().take();
        if let Some(handle) = handle {
            // The last handle can be released from inside a callback.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

/// Timing source backed by a dedicated worker thread.
///
/// Callbacks run on the `diseqc-timer` thread. Arming while a one-shot is
/// pending replaces it. Clones share the worker; it stops when the last clone
/// is dropped.
#[derive(Clone)]
pub struct ThreadTimer {
    inner: Arc<ThreadInner>,
}

impl ThreadTimer {
    /// Spawn the worker thread.
    ///
    /// # Errors
    /// `HalError::TimerUnavailable` if the thread cannot be spawned.
    pub fn new() -> Result<Self, HalError> {
        Self::spawn(None)
    }

    /// Spawn the worker thread and record every arm into `trace`.
    pub fn with_trace(trace: SignalTrace) -> Result<Self, HalError> {
        Self::spawn(Some(trace))
    }

    fn spawn(trace: Option<SignalTrace>) -> Result<Self, HalError> {
        let (tx, rx) = unbounded();
        let fired = Arc::new(AtomicU32::new(0));
        let worker_fired = Arc::clone(&fired);
        let handle = thread::Builder::new()
            .name("diseqc-timer".to_string())
            .spawn(move || run_worker(rx, worker_fired))
            .map_err(|e| HalError::TimerUnavailable(e.to_string()))?;
        debug!("timer worker started");
        Ok(Self {
            inner: Arc::new(ThreadInner {
                tx,
                worker: Mutex::new(Some(handle)),
                fired,
                trace,
            }),
        })
    }

    /// Number of expiries delivered so far.
    pub fn fired_count(&self) -> u32 {
        self.inner.fired.load(Ordering::Acquire)
    }
}

impl TimingSource for ThreadTimer {
    fn name(&self) -> &'static str {
        "sim-thread"
    }

    fn arm_one_shot(&self, duration_us: u32, on_expire: ExpiryCallback) {
        if let Some(trace) = &self.inner.trace {
            trace.push(TraceEvent::Armed(duration_us));
        }
        let deadline = Instant::now() + Duration::from_micros(duration_us as u64);
        // Send only fails once the worker is gone, i.e. during teardown.
        let _ = self.inner.tx.send(TimerMsg::Arm {
            deadline,
            on_expire,
        });
    }
}

fn run_worker(rx: Receiver<TimerMsg>, fired: Arc<AtomicU32>) {
    let mut pending: Option<(Instant, ExpiryCallback)> = None;
    loop {
        let deadline = pending.as_ref().map(|(d, _)| *d);
        let msg = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    if let Some((_, on_expire)) = pending.take() {
                        fired.fetch_add(1, Ordering::AcqRel);
                        on_expire();
                    }
                    continue;
                }
                match rx.recv_timeout(deadline - now) {
                    Ok(msg) => msg,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(msg) => msg,
                Err(_) => break,
            },
        };

        match msg {
            TimerMsg::Arm {
                deadline,
                on_expire,
            } => {
                if pending.is_some() {
                    trace!("re-arm replaces pending one-shot");
                }
                pending = Some((deadline, on_expire));
            }
            TimerMsg::Shutdown => break,
        }
    }
    debug!("timer worker stopped");
}
