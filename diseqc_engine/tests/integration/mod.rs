//! Shared fixtures for the integration tests.

mod motor;
mod rotor;
mod threaded;
mod transmission;

use std::sync::Arc;

use diseqc_engine::{MotorEnableSupervisor, RotorManager, TransmissionEngine};
use diseqc_hal::{RecordingCarrier, SignalTrace, SimEnableLine, SteppedTimer};

pub type SimEngine = TransmissionEngine<RecordingCarrier, SteppedTimer>;
pub type SimRotor = RotorManager<RecordingCarrier, SteppedTimer, SimEnableLine>;

/// Carrier duty used by every fixture (45-tick period, 49 %).
pub const DUTY: u16 = 22;

/// Engine on a stepped timer, with carrier and timer sharing one trace.
pub struct Bench {
    pub engine: Arc<SimEngine>,
    pub carrier: RecordingCarrier,
    pub timer: SteppedTimer,
    pub trace: SignalTrace,
}

pub fn engine_bench(max_angle: f32) -> Bench {
    let trace = SignalTrace::new();
    let carrier = RecordingCarrier::with_trace(trace.clone());
    let timer = SteppedTimer::with_trace(trace.clone());
    let engine = TransmissionEngine::new(carrier.clone(), timer.clone(), DUTY, max_angle).unwrap();
    trace.clear();
    Bench {
        engine,
        carrier,
        timer,
        trace,
    }
}

/// Rotor manager on a stepped timer.
pub struct RotorBench {
    pub rotor: SimRotor,
    pub timer: SteppedTimer,
    pub line: SimEnableLine,
    pub trace: SignalTrace,
}

pub fn rotor_bench() -> RotorBench {
    let bench = engine_bench(80.0);
    let line = SimEnableLine::new();
    let motor = MotorEnableSupervisor::new(line.clone());
    RotorBench {
        rotor: RotorManager::new(bench.engine, motor),
        timer: bench.timer,
        line,
        trace: bench.trace,
    }
}
