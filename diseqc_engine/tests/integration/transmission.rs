//! Integration test: frame encoding and timer-driven replay.
//!
//! Validates: frame lengths, parity, bit timings, GotoX bytes on the wire,
//! the 54-segment Halt replay and the busy gate.

use diseqc_common::hal::types::CarrierLevel;
use diseqc_common::protocol::status::{DiseqcError, Status};
use diseqc_engine::frame::{encode, parity_bit};
use diseqc_hal::waveform;

use super::{DUTY, engine_bench};

fn wire_bytes(bench: &super::Bench) -> Vec<u8> {
    waveform::decode(&bench.trace.segments())
        .expect("valid waveform")
        .to_vec()
}

#[test]
fn encode_length_is_eighteen_per_byte_and_bounded() {
    for len in 1..=6 {
        assert_eq!(encode(&vec![0x5A; len], DUTY).unwrap().len(), len * 18);
    }
    assert!(matches!(encode(&[], DUTY), Err(DiseqcError::InvalidParam(_))));
    assert!(matches!(encode(&[0; 7], DUTY), Err(DiseqcError::InvalidParam(_))));
}

#[test]
fn parity_bit_on_wire_is_one_for_even_popcount() {
    for byte in [0x00u8, 0x01, 0x03, 0x31, 0x6E, 0xE0, 0xFF] {
        let segs = encode(&[byte], DUTY).unwrap();
        let parity_on_wire = segs[16].duration_us == 500;
        assert_eq!(parity_on_wire, byte.count_ones() % 2 == 0, "byte {byte:#04x}");
        assert_eq!(parity_on_wire, parity_bit(byte));
    }
}

#[test]
fn bit_pairs_have_exact_timings() {
    let segs = encode(&[0b1000_0000], DUTY).unwrap();
    // Bit 7 = 1
    assert_eq!(segs[0].level, CarrierLevel::On(DUTY));
    assert_eq!(segs[0].duration_us, 500);
    assert_eq!(segs[1].level, CarrierLevel::Off);
    assert_eq!(segs[1].duration_us, 1000);
    // Bit 6 = 0
    assert_eq!(segs[2].duration_us, 1000);
    assert_eq!(segs[3].duration_us, 500);
}

#[test]
fn goto_95_is_clamped_on_the_wire() {
    let bench = engine_bench(80.0);
    bench.engine.goto_angle(95.0).unwrap();
    bench.timer.run_until_idle(200);
    assert_eq!(wire_bytes(&bench), [0xE0, 0x31, 0x6E, 0xD5, 0x00]);
    assert_eq!(bench.engine.get_current_angle(), 80.0);
}

#[test]
fn goto_10_on_the_wire() {
    let bench = engine_bench(80.0);
    bench.engine.goto_angle(10.0).unwrap();
    bench.timer.run_until_idle(200);
    assert_eq!(wire_bytes(&bench), [0xE0, 0x31, 0x6E, 0xD0, 0xA0]);
}

#[test]
fn goto_west_sets_direction_nibble() {
    let bench = engine_bench(80.0);
    bench.engine.goto_angle(-45.5).unwrap();
    bench.timer.run_until_idle(200);
    // 45.5 * 16 = 728 = 0x2D8
    assert_eq!(wire_bytes(&bench), [0xE0, 0x31, 0x6E, 0xE2, 0xD8]);
    assert_eq!(bench.engine.get_current_angle(), -45.5);
}

#[test]
fn halt_is_54_segments_and_busy_until_the_last() {
    let bench = engine_bench(80.0);
    bench.engine.halt().unwrap();

    let mut fires = 0;
    while bench.engine.is_busy() {
        assert!(bench.timer.fire(), "engine busy with nothing armed");
        fires += 1;
    }
    // First segment is applied by halt() itself; the 54th expiry completes.
    assert_eq!(fires, 54);
    assert_eq!(bench.trace.segments().len(), 54);
    assert_eq!(bench.carrier.level(), CarrierLevel::Off);
    assert_eq!(wire_bytes(&bench), [0xE0, 0x31, 0x60]);
    // 3 bytes * 9 bits * 1.5 ms
    assert_eq!(bench.timer.elapsed_us(), 40_500);
}

#[test]
fn every_command_is_busy_mid_frame_and_changes_nothing() {
    let bench = engine_bench(80.0);
    bench.engine.goto_angle(10.0).unwrap();
    bench.timer.fire();
    bench.timer.fire();
    let remaining = bench.engine.remaining_segments();
    let events = bench.trace.len();

    let results = [
        bench.engine.transmit(&[0xE0, 0x31, 0x60]),
        bench.engine.goto_angle(-20.0),
        bench.engine.halt(),
        bench.engine.drive_east(),
        bench.engine.drive_west(),
        bench.engine.step_east(10),
        bench.engine.step_west(10),
        bench.engine.limits_off(),
        bench.engine.store_position(3),
    ];
    for result in results {
        assert_eq!(result, Err(DiseqcError::Busy));
        assert_eq!(Status::from_result(&result), Status::Busy);
    }

    assert_eq!(bench.engine.get_current_angle(), 10.0);
    assert_eq!(bench.engine.remaining_segments(), remaining);
    assert_eq!(bench.trace.len(), events);

    bench.timer.run_until_idle(200);
    assert_eq!(wire_bytes(&bench), [0xE0, 0x31, 0x6E, 0xD0, 0xA0]);
}

#[test]
fn step_bounds() {
    let bench = engine_bench(80.0);
    assert_eq!(
        Status::from_result(&bench.engine.step_east(0)),
        Status::InvalidParam
    );
    assert_eq!(
        Status::from_result(&bench.engine.step_east(129)),
        Status::InvalidParam
    );
    assert!(bench.engine.step_east(1).is_ok());
    bench.timer.run_until_idle(200);
    assert!(bench.engine.step_east(128).is_ok());
    bench.timer.run_until_idle(200);
    assert_eq!(bench.engine.last_frame().as_slice(), &[0xE0, 0x31, 0x68, 0x80]);
}

#[test]
fn raw_six_byte_frame_replays_fully() {
    let bench = engine_bench(80.0);
    let frame = [0xE0, 0x31, 0x6E, 0xD0, 0xA0, 0x00];
    bench.engine.transmit(&frame).unwrap();
    assert_eq!(bench.timer.run_until_idle(500), 108);
    assert_eq!(wire_bytes(&bench), frame);
}

#[test]
fn carrier_ends_off_after_each_frame() {
    let bench = engine_bench(80.0);
    bench.engine.drive_west().unwrap();
    bench.timer.run_until_idle(200);
    assert_eq!(bench.carrier.level(), CarrierLevel::Off);
    bench.trace.clear();
    bench.engine.store_position(9).unwrap();
    bench.timer.run_until_idle(200);
    assert_eq!(bench.carrier.level(), CarrierLevel::Off);
    assert_eq!(wire_bytes(&bench), [0xE0, 0x31, 0x6A, 0x09]);
    assert_eq!(bench.engine.frames_sent(), 2);
}
