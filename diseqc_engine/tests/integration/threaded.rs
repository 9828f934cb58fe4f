//! Integration test: real-time replay on the thread-backed timer.
//!
//! Validates: the caller never blocks, the frame completes asynchronously on
//! the timer thread, and the tick runner drives a deferred goto end-to-end.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;

use diseqc_engine::cycle::TickRunner;
use diseqc_engine::{MotorEnableSupervisor, RotorManager, TransmissionEngine};
use diseqc_hal::{RecordingCarrier, SignalTrace, SimEnableLine, ThreadTimer, waveform};

fn wait_for(mut done: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    done()
}

#[test]
fn halt_completes_asynchronously() {
    let trace = SignalTrace::new();
    let timer = ThreadTimer::with_trace(trace.clone()).unwrap();
    let engine = TransmissionEngine::new(
        RecordingCarrier::with_trace(trace.clone()),
        timer,
        22,
        80.0,
    )
    .unwrap();
    trace.clear();

    let (tx, rx) = unbounded();
    engine.set_completion_handler(Some(Arc::new(move || {
        let _ = tx.send(thread::current().name().map(str::to_string));
    })));

    let start = Instant::now();
    engine.halt().unwrap();
    // Returns long before the ~40 ms frame is over.
    assert!(engine.is_busy());
    assert!(start.elapsed() < Duration::from_millis(20));

    let thread_name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(thread_name.as_deref(), Some("diseqc-timer"));
    assert!(!engine.is_busy());

    let wire = waveform::decode(&trace.segments()).unwrap();
    assert_eq!(wire.as_slice(), &[0xE0, 0x31, 0x60]);
}

#[test]
fn tick_runner_drives_deferred_goto() {
    let trace = SignalTrace::new();
    let timer = ThreadTimer::with_trace(trace.clone()).unwrap();
    let engine = TransmissionEngine::new(
        RecordingCarrier::with_trace(trace.clone()),
        timer,
        22,
        80.0,
    )
    .unwrap();
    let line = SimEnableLine::new();
    let motor = MotorEnableSupervisor::with_startup(line.clone(), 50);
    let rotor = Arc::new(RotorManager::new(engine, motor));
    trace.clear();

    let running = Arc::new(AtomicBool::new(true));
    let ticker = {
        let rotor = Arc::clone(&rotor);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut runner = TickRunner::new(Duration::from_millis(1), running);
            runner.run(|ms| rotor.tick(ms)).unwrap();
        })
    };

    rotor.goto_angle(-12.5, 0).unwrap();
    assert!(line.is_high());

    let finished = wait_for(
        || rotor.engine().frames_sent() == 1 && !rotor.is_busy(),
        Duration::from_secs(5),
    );
    running.store(false, Ordering::SeqCst);
    ticker.join().unwrap();

    assert!(finished, "rotor did not settle");
    assert!(!line.is_high());
    assert_eq!(rotor.get_current_angle(), -12.5);
    let wire = waveform::decode(&trace.segments()).unwrap();
    // 12.5 * 16 = 200 = 0x0C8
    assert_eq!(wire.as_slice(), &[0xE0, 0x31, 0x6E, 0xE0, 0xC8]);
}
