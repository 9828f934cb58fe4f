//! Rotor manager: one logical "move to angle" over motor power and DiSEqC.
//!
//! `goto_angle` powers the motor and schedules the GotoX frame as a deferred
//! continuation; [`RotorManager::tick`] counts the startup delay down and
//! sends the frame once it has elapsed. Nothing here sleeps.
//!
//! `track_and_goto_angle` switches the motor to tracking and sends GotoX
//! immediately, without the startup delay.

use std::sync::Arc;

use diseqc_common::hal::driver::{CarrierOutput, EnableLine, TimingSource};
use diseqc_common::protocol::command::clamp_angle;
use diseqc_common::protocol::status::DiseqcError;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::transmitter::TransmissionEngine;
use crate::motor::{MotorEnableSupervisor, MotorState};

/// A GotoX waiting for the motor startup delay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PendingMove {
    /// Clamped target angle [°].
    pub angle: f32,
    /// Time left before the frame is sent [ms].
    pub remaining_ms: u32,
}

/// Point-in-time view of the rotor for status output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RotorStatus {
    /// Last angle the engine accepted [°].
    pub current_angle: f32,
    /// Travel limit [°].
    pub max_angle: f32,
    /// Motor power state.
    pub motor: MotorState,
    /// Whether a frame is on the wire.
    pub transmitting: bool,
    /// Deferred GotoX, if any.
    pub pending: Option<PendingMove>,
    /// Frames replayed to completion.
    pub frames_sent: u64,
}

#[derive(Default)]
struct RotorCore {
    pending: Option<PendingMove>,
    current_angle: f32,
    last_error: Option<DiseqcError>,
}

/// Orchestrates one supervisor and one engine.
///
/// Lock order: rotor → engine / supervisor.
pub struct RotorManager<C, T, L> {
    engine: Arc<TransmissionEngine<C, T>>,
    motor: MotorEnableSupervisor<L>,
    core: Mutex<RotorCore>,
    max_angle: f32,
}

impl<C, T, L> RotorManager<C, T, L>
where
    C: CarrierOutput + 'static,
    T: TimingSource + 'static,
    L: EnableLine,
{
    /// Compose an engine and a supervisor. The travel limit is the engine's.
    pub fn new(engine: Arc<TransmissionEngine<C, T>>, motor: MotorEnableSupervisor<L>) -> Self {
        let max_angle = engine.max_angle();
        Self {
            engine,
            motor,
            core: Mutex::new(RotorCore::default()),
            max_angle,
        }
    }

    /// Power the motor and schedule GotoX after the startup delay.
    ///
    /// `Ok(())` means the move is scheduled; call [`tick`](Self::tick) to
    /// let it proceed.
    ///
    /// # Errors
    /// `Busy` while a frame is in flight or another move is still waiting.
    /// Nothing changes on rejection.
    pub fn goto_angle(&self, angle: f32, expected_travel_time_sec: u8) -> Result<(), DiseqcError> {
        let mut core = self.core.lock();
        if self.engine.is_busy() || core.pending.is_some() {
            warn!(angle, "goto rejected: rotor busy");
            return Err(DiseqcError::Busy);
        }
        let angle = clamp_angle(angle, self.max_angle);
        self.motor.turn_on(u32::from(expected_travel_time_sec));
        let remaining_ms = self.motor.startup_ms();
        core.pending = Some(PendingMove {
            angle,
            remaining_ms,
        });
        info!(
            angle,
            travel_s = expected_travel_time_sec,
            startup_ms = remaining_ms,
            "goto scheduled"
        );
        Ok(())
    }

    /// Enter tracking and send GotoX right away.
    ///
    /// Unlike [`goto_angle`](Self::goto_angle) there is no startup wait. A
    /// still-waiting deferred move is superseded.
    ///
    /// # Errors
    /// `Busy` while a frame is in flight; the motor is left untouched.
    pub fn track_and_goto_angle(&self, angle: f32) -> Result<(), DiseqcError> {
        let mut core = self.core.lock();
        if self.engine.is_busy() {
            warn!(angle, "track rejected: transmission in progress");
            return Err(DiseqcError::Busy);
        }
        let angle = clamp_angle(angle, self.max_angle);
        if core.pending.take().is_some() {
            debug!("deferred goto superseded by tracking");
        }
        self.motor.start_tracking();
        self.engine.goto_angle(angle)?;
        core.current_angle = angle;
        info!(angle, "tracking goto sent");
        Ok(())
    }

    /// Leave tracking mode.
    pub fn stop_tracking(&self) {
        self.motor.stop_tracking();
    }

    /// Drop any waiting move, cut motor power and try to send Halt.
    ///
    /// The motor is off even when Halt is rejected with `Busy`.
    pub fn emergency_stop(&self) -> Result<(), DiseqcError> {
        let mut core = self.core.lock();
        if let Some(dropped) = core.pending.take() {
            debug!(angle = dropped.angle, "deferred goto dropped");
        }
        self.motor.force_off();
        let result = self.engine.halt();
        warn!(?result, "emergency stop");
        result
    }

    /// Advance the motor countdown and the deferred move by `elapsed_ms`.
    pub fn tick(&self, elapsed_ms: u32) {
        let mut core = self.core.lock();
        self.motor.tick(elapsed_ms);

        let due = match core.pending.as_mut() {
            Some(pending) => {
                pending.remaining_ms = pending.remaining_ms.saturating_sub(elapsed_ms);
                pending.remaining_ms == 0
            }
            None => false,
        };
        if !due {
            return;
        }
        let Some(pending) = core.pending.take() else {
            return;
        };
        match self.engine.goto_angle(pending.angle) {
            Ok(()) => {
                core.current_angle = pending.angle;
                core.last_error = None;
                info!(angle = pending.angle, "GotoX sent after motor startup");
            }
            Err(e) => {
                // Not retried: the caller sees it through last_error().
                warn!(angle = pending.angle, "deferred GotoX dropped: {e}");
                core.last_error = Some(e);
            }
        }
    }

    /// Last angle accepted by the engine through this manager [°].
    pub fn get_current_angle(&self) -> f32 {
        self.core.lock().current_angle
    }

    /// Engine transmitting, motor powered or a move waiting.
    pub fn is_busy(&self) -> bool {
        let core = self.core.lock();
        core.pending.is_some() || self.engine.is_busy() || self.motor.is_on()
    }

    /// Deferred move, if one is waiting.
    pub fn pending(&self) -> Option<PendingMove> {
        self.core.lock().pending
    }

    /// Why the last deferred GotoX was dropped, cleared by the next success.
    pub fn last_error(&self) -> Option<DiseqcError> {
        self.core.lock().last_error
    }

    /// Travel limit [°].
    pub fn max_angle(&self) -> f32 {
        self.max_angle
    }

    /// The engine, for raw commands.
    pub fn engine(&self) -> &Arc<TransmissionEngine<C, T>> {
        &self.engine
    }

    /// The motor supervisor.
    pub fn supervisor(&self) -> &MotorEnableSupervisor<L> {
        &self.motor
    }

    /// Snapshot for status output.
    pub fn status(&self) -> RotorStatus {
        let core = self.core.lock();
        RotorStatus {
            current_angle: core.current_angle,
            max_angle: self.max_angle,
            motor: self.motor.state(),
            transmitting: self.engine.is_busy(),
            pending: core.pending,
            frames_sent: self.engine.frames_sent(),
        }
    }
}
