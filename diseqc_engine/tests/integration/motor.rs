//! Integration test: motor-enable supervisor timing.
//!
//! Validates: exact timed-on duration under 1 ms ticks, tracking immunity to
//! turn_on, and force_off from every state.

use diseqc_engine::{MotorEnableSupervisor, MotorState};
use diseqc_hal::SimEnableLine;

fn supervisor() -> (MotorEnableSupervisor<SimEnableLine>, SimEnableLine) {
    let line = SimEnableLine::new();
    (MotorEnableSupervisor::new(line.clone()), line)
}

#[test]
fn turn_on_five_seconds_stays_on_exactly_7000_ms() {
    let (motor, line) = supervisor();
    motor.turn_on(5);

    let mut on_ms = 0;
    while motor.is_on() {
        assert!(line.is_high());
        motor.tick(1);
        on_ms += 1;
        assert!(on_ms <= 7000, "still on after 7000 ms");
    }
    assert_eq!(on_ms, 7000);
    assert!(!line.is_high());
    assert_eq!(line.edge_count(), 2);
}

#[test]
fn coarse_ticks_never_extend_the_run() {
    let (motor, _) = supervisor();
    motor.turn_on(1);
    motor.tick(2999);
    assert!(motor.is_on());
    motor.tick(10);
    assert!(!motor.is_on());
}

#[test]
fn turn_on_while_tracking_is_a_noop() {
    let (motor, line) = supervisor();
    motor.start_tracking();
    motor.turn_on(5);
    assert_eq!(motor.state(), MotorState::Tracking);
    for _ in 0..10_000 {
        motor.tick(1);
    }
    assert_eq!(motor.state(), MotorState::Tracking);
    assert!(line.is_high());
}

#[test]
fn force_off_from_any_state_leaves_no_countdown() {
    let (motor, line) = supervisor();

    motor.force_off();
    assert_eq!(motor.state(), MotorState::Off);

    motor.turn_on(5);
    motor.tick(100);
    motor.force_off();
    assert_eq!(motor.state(), MotorState::Off);
    assert!(!line.is_high());

    motor.start_tracking();
    motor.force_off();
    assert_eq!(motor.state(), MotorState::Off);
    assert!(!line.is_high());

    // A late countdown must not flip anything.
    let edges = line.edge_count();
    motor.tick(10_000);
    assert_eq!(line.edge_count(), edges);
}

#[test]
fn tracking_then_stop() {
    let (motor, line) = supervisor();
    motor.turn_on(2);
    motor.start_tracking();
    motor.tick(60_000);
    assert!(motor.is_on());
    motor.stop_tracking();
    assert!(!motor.is_on());
    assert!(!line.is_high());
}
