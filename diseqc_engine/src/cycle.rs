//! Periodic tick runner.
//!
//! Delivers the millisecond tick that drives the motor countdown and the
//! deferred startup continuation of the rotor manager.
//!
//! ## RT Setup (`rt` feature)
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`
//! 2. Prefault stack pages
//! 3. `sched_setaffinity` to the requested core
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`
//!
//! ## Pacing
//! With `rt`: absolute-time `clock_nanosleep` on `CLOCK_MONOTONIC`.
//! Without: absolute `Instant` deadlines and `std::thread::sleep`.
//! Both are drift-free; each cycle reports the nominal interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle body duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle body duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle body duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Cycles whose body outlasted the interval.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (returns 0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Errors during RT setup or pacing.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
    /// Monotonic clock unavailable.
    #[error("clock error: {0}")]
    Clock(String),
}

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(not(feature = "rt"))]
fn prefault_stack() {}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Perform the RT setup sequence on the calling thread.
///
/// All steps are no-ops without the `rt` feature.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    debug!(cpu_core, rt_priority, rt = cfg!(feature = "rt"), "RT setup done");
    Ok(())
}

// ─── Tick Runner ────────────────────────────────────────────────────

/// Fixed-period loop calling a body with the elapsed milliseconds.
pub struct TickRunner {
    interval: Duration,
    running: Arc<AtomicBool>,
    stats: CycleStats,
}

impl TickRunner {
    /// Runner with the given period; it stops once `running` is cleared.
    pub fn new(interval: Duration, running: Arc<AtomicBool>) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            running,
            stats: CycleStats::new(),
        }
    }

    /// Accumulated statistics.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Milliseconds reported to the body each cycle.
    pub fn interval_ms(&self) -> u32 {
        self.interval.as_millis().min(u32::MAX as u128) as u32
    }

    /// Loop until the running flag is cleared.
    pub fn run<F: FnMut(u32)>(&mut self, body: F) -> Result<(), CycleError> {
        self.run_loop(None, body)
    }

    /// Loop for at most `cycles` cycles (or until the flag is cleared).
    pub fn run_cycles<F: FnMut(u32)>(&mut self, cycles: u64, body: F) -> Result<(), CycleError> {
        self.run_loop(Some(cycles), body)
    }

    fn should_continue(&self, limit: Option<u64>, done: u64) -> bool {
        self.running.load(Ordering::Acquire) && limit.is_none_or(|n| done < n)
    }

    fn note_overrun(&mut self, duration_ns: i64) {
        if duration_ns > self.interval.as_nanos() as i64 {
            self.stats.overruns += 1;
            warn!(duration_ns, "tick overrun");
        }
    }

    #[cfg(feature = "rt")]
    fn run_loop<F: FnMut(u32)>(&mut self, limit: Option<u64>, mut body: F) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let interval_ns = self.interval.as_nanos() as i64;
        let step_ms = self.interval_ms();
        let now = || clock_gettime(clock).map_err(|e| CycleError::Clock(e.to_string()));
        let mut next_wake = now()?;
        let mut done = 0u64;

        while self.should_continue(limit, done) {
            next_wake = timespec_add_ns(next_wake, interval_ns);
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);

            let start = now()?;
            let latency_ns = timespec_diff_ns(&start, &next_wake).abs();
            body(step_ms);
            let duration_ns = timespec_diff_ns(&now()?, &start);

            self.stats.record(duration_ns, latency_ns);
            self.note_overrun(duration_ns);
            done += 1;
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_loop<F: FnMut(u32)>(&mut self, limit: Option<u64>, mut body: F) -> Result<(), CycleError> {
        use std::time::Instant;

        let step_ms = self.interval_ms();
        let mut next_wake = Instant::now();
        let mut done = 0u64;

        while self.should_continue(limit, done) {
            next_wake += self.interval;
            if let Some(remaining) = next_wake.checked_duration_since(Instant::now()) {
                std::thread::sleep(remaining);
            }

            let start = Instant::now();
            let latency_ns = start.saturating_duration_since(next_wake).as_nanos() as i64;
            body(step_ms);
            let duration_ns = start.elapsed().as_nanos() as i64;

            self.stats.record(duration_ns, latency_ns);
            self.note_overrun(duration_ns);
            done += 1;
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

/// Add nanoseconds to a TimeSpec.
#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// Compute the difference (a - b) in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_stats_basic() {
        let mut stats = CycleStats::new();
        assert_eq!(stats.cycle_count, 0);
        assert_eq!(stats.avg_cycle_ns(), 0);

        stats.record(500_000, 1_000);
        assert_eq!(stats.cycle_count, 1);
        assert_eq!(stats.min_cycle_ns, 500_000);
        assert_eq!(stats.max_cycle_ns, 500_000);
        assert_eq!(stats.max_latency_ns, 1_000);

        stats.record(600_000, 500);
        assert_eq!(stats.min_cycle_ns, 500_000);
        assert_eq!(stats.max_cycle_ns, 600_000);
        assert_eq!(stats.max_latency_ns, 1_000);
        assert_eq!(stats.avg_cycle_ns(), 550_000);
    }

    #[test]
    fn rt_setup_no_rt_feature_is_noop() {
        #[cfg(not(feature = "rt"))]
        {
            assert!(rt_setup(0, 80).is_ok());
        }
    }

    #[test]
    fn run_cycles_reports_interval() {
        let running = Arc::new(AtomicBool::new(true));
        let mut runner = TickRunner::new(Duration::from_millis(2), running);
        let mut total = 0u32;
        runner.run_cycles(5, |ms| total += ms).unwrap();
        assert_eq!(total, 10);
        assert_eq!(runner.stats().cycle_count, 5);
        assert_eq!(runner.interval_ms(), 2);
    }

    #[test]
    fn cleared_flag_stops_loop() {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let mut runner = TickRunner::new(Duration::from_millis(1), running);
        let mut calls = 0;
        runner
            .run(|_| {
                calls += 1;
                if calls == 3 {
                    flag.store(false, Ordering::Release);
                }
            })
            .unwrap();
        assert_eq!(calls, 3);
    }

    #[test]
    fn zero_interval_is_raised_to_one_ms() {
        let runner = TickRunner::new(Duration::ZERO, Arc::new(AtomicBool::new(true)));
        assert_eq!(runner.interval_ms(), 1);
    }

    #[test]
    fn cycle_error_display() {
        let msg = CycleError::RtSetup("mlockall failed".to_string()).to_string();
        assert!(msg.contains("mlockall"));
    }
}
