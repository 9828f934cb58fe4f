//! Integration test: rotor manager orchestration.
//!
//! Validates: deferred GotoX after the motor startup delay, the no-wait
//! tracking path, busy handling and emergency stop.

use diseqc_common::protocol::status::DiseqcError;
use diseqc_engine::MotorState;
use diseqc_hal::waveform;

use super::rotor_bench;

#[test]
fn goto_powers_motor_then_sends_after_2000_ms() {
    let bench = rotor_bench();
    bench.rotor.goto_angle(10.0, 5).unwrap();
    assert!(bench.line.is_high());

    for ms in 1..2000 {
        bench.rotor.tick(1);
        assert!(
            bench.trace.is_empty(),
            "carrier touched after {ms} ms"
        );
    }
    bench.rotor.tick(1);
    assert!(bench.rotor.engine().is_busy());

    bench.timer.run_until_idle(200);
    let wire = waveform::decode(&bench.trace.segments()).unwrap();
    assert_eq!(wire.as_slice(), &[0xE0, 0x31, 0x6E, 0xD0, 0xA0]);
    assert_eq!(bench.rotor.get_current_angle(), 10.0);

    // Motor stays powered for the rest of the 7000 ms run.
    assert!(bench.rotor.is_busy());
    for _ in 0..4999 {
        bench.rotor.tick(1);
    }
    assert!(bench.rotor.is_busy());
    bench.rotor.tick(1);
    assert!(!bench.rotor.is_busy());
    assert!(!bench.line.is_high());
}

#[test]
fn track_and_goto_sends_without_startup_wait() {
    // The tracking path skips the startup delay that goto_angle honours.
    let bench = rotor_bench();
    bench.rotor.track_and_goto_angle(25.0).unwrap();

    assert!(bench.rotor.engine().is_busy());
    assert!(!bench.trace.is_empty());
    assert_eq!(bench.rotor.supervisor().state(), MotorState::Tracking);

    bench.timer.run_until_idle(200);
    let wire = waveform::decode(&bench.trace.segments()).unwrap();
    // 25 * 16 = 400 = 0x190
    assert_eq!(wire.as_slice(), &[0xE0, 0x31, 0x6E, 0xD1, 0x90]);
    assert_eq!(bench.rotor.get_current_angle(), 25.0);
    assert!(bench.rotor.is_busy());

    bench.rotor.stop_tracking();
    assert!(!bench.rotor.is_busy());
}

#[test]
fn goto_clamps_to_max_angle() {
    let bench = rotor_bench();
    bench.rotor.goto_angle(-200.0, 1).unwrap();
    bench.rotor.tick(2000);
    bench.timer.run_until_idle(200);
    let wire = waveform::decode(&bench.trace.segments()).unwrap();
    assert_eq!(wire.as_slice(), &[0xE0, 0x31, 0x6E, 0xE5, 0x00]);
    assert_eq!(bench.rotor.get_current_angle(), -80.0);
}

#[test]
fn busy_rotor_rejects_new_moves() {
    let bench = rotor_bench();
    bench.rotor.track_and_goto_angle(5.0).unwrap();
    assert_eq!(bench.rotor.goto_angle(6.0, 1), Err(DiseqcError::Busy));
    assert_eq!(bench.rotor.track_and_goto_angle(7.0), Err(DiseqcError::Busy));
    assert_eq!(bench.rotor.get_current_angle(), 5.0);
}

#[test]
fn emergency_stop_cancels_deferred_goto() {
    let bench = rotor_bench();
    bench.rotor.goto_angle(30.0, 10).unwrap();
    bench.rotor.tick(1000);
    bench.rotor.emergency_stop().unwrap();
    bench.timer.run_until_idle(200);

    // Only Halt reaches the wire; the GotoX never fires.
    bench.rotor.tick(5000);
    assert!(!bench.rotor.engine().is_busy());
    let wire = waveform::decode(&bench.trace.segments()).unwrap();
    assert_eq!(wire.as_slice(), &[0xE0, 0x31, 0x60]);
    assert_eq!(bench.rotor.get_current_angle(), 0.0);
    assert!(!bench.line.is_high());
}
