//! Transmission engine: the public DiSEqC command surface.
//!
//! Every command is synchronous and non-blocking. An accepted command builds
//! its segment arena, applies the first segment and arms the timing source;
//! the rest of the frame is replayed from [`TransmissionEngine::on_timer_expired`].
//!
//! ```text
//!          transmit ok                 last segment replayed
//!   Idle ──────────────► Transmitting ──────────────────────► Idle
//!                          │   ▲
//!                          └───┘ any command → Busy
//! ```
//!
//! There is no abort. `halt()` is an ordinary command and is rejected with
//! `Busy` like everything else while a frame is in flight.
//!
//! # Critical section
//!
//! Engine state sits behind a mutex held only for the O(1) advance step.
//! The timing source must never invoke its callback from inside
//! `arm_one_shot`; the engine arms while holding the lock.

use std::sync::{Arc, Weak};

use diseqc_common::consts::GOTOX_MAX_ANGLE;
use diseqc_common::hal::driver::{CarrierOutput, ExpiryCallback, HalError, TimingSource};
use diseqc_common::hal::types::{CarrierLevel, CommandBytes, SegmentBuffer};
use diseqc_common::protocol::command::{Command, Direction, clamp_angle};
use diseqc_common::protocol::status::DiseqcError;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use super::scheduler::{EngineState, SchedulerStep, SegmentScheduler};
use crate::frame::FrameBuilder;

/// Invoked once per completed frame, after the engine is idle again.
pub type CompletionHandler = Arc<dyn Fn() + Send + Sync>;

struct EngineCore<C> {
    carrier: C,
    state: EngineState,
    current_angle: f32,
    last_frame: CommandBytes,
    frames_sent: u64,
}

/// DiSEqC transmission engine.
///
/// Constructed once behind an `Arc`; the timing source's callback holds a
/// weak reference back to it.
pub struct TransmissionEngine<C, T> {
    core: Mutex<EngineCore<C>>,
    timer: T,
    builder: FrameBuilder,
    max_angle: f32,
    on_complete: Mutex<Option<CompletionHandler>>,
    expiry: ExpiryCallback,
}

impl<C, T> TransmissionEngine<C, T>
where
    C: CarrierOutput + 'static,
    T: TimingSource + 'static,
{
    /// Create an idle engine with the carrier off and angle 0.0.
    ///
    /// `duty` is the PWM compare value for carrier-on segments; `max_angle`
    /// bounds every GotoX.
    ///
    /// # Errors
    /// `HalError::ConfigError` unless `max_angle` is finite and within
    /// `(0, 255]`, the range the 12-bit GotoX field can carry.
    pub fn new(
        mut carrier: C,
        timer: T,
        duty: u16,
        max_angle: f32,
    ) -> Result<Arc<Self>, HalError> {
        if !(max_angle.is_finite() && max_angle > 0.0 && max_angle <= GOTOX_MAX_ANGLE) {
            return Err(HalError::ConfigError(format!(
                "max_angle {max_angle} must be in (0, {GOTOX_MAX_ANGLE}]"
            )));
        }
        carrier.set_level(CarrierLevel::Off);
        debug!(
            carrier = carrier.name(),
            timer = timer.name(),
            duty,
            max_angle,
            "transmission engine ready"
        );
        Ok(Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let expiry: ExpiryCallback = Arc::new(move || {
                if let Some(engine) = weak.upgrade() {
                    engine.on_timer_expired();
                }
            });
            Self {
                core: Mutex::new(EngineCore {
                    carrier,
                    state: EngineState::Idle,
                    current_angle: 0.0,
                    last_frame: CommandBytes::new(),
                    frames_sent: 0,
                }),
                timer,
                builder: FrameBuilder::new(duty),
                max_angle,
                on_complete: Mutex::new(None),
                expiry,
            }
        }))
    }

    fn lock(&self) -> MutexGuard<'_, EngineCore<C>> {
        self.core.lock()
    }

    /// Start replaying `segments`. Caller holds the lock and checked idle.
    fn start_locked(&self, core: &mut EngineCore<C>, bytes: &[u8], segments: SegmentBuffer) {
        let mut scheduler = SegmentScheduler::new(segments);
        if let SchedulerStep::Apply(first) = scheduler.start() {
            core.last_frame = CommandBytes::from_slice(bytes).unwrap_or_default();
            core.state = EngineState::Transmitting(scheduler);
            core.carrier.set_level(first.level);
            self.timer
                .arm_one_shot(first.duration_us as u32, Arc::clone(&self.expiry));
        }
    }

    /// Accept `bytes` if idle. `angle` is recorded only when accepted.
    fn dispatch(&self, bytes: &[u8], angle: Option<f32>) -> Result<(), DiseqcError> {
        let mut core = self.lock();
        if core.state.is_busy() {
            warn!(frame = ?bytes, "command rejected: transmission in progress");
            return Err(DiseqcError::Busy);
        }
        let segments = self.builder.build(bytes).inspect_err(|e| {
            warn!(len = bytes.len(), "command rejected: {e}");
        })?;
        self.start_locked(&mut core, bytes, segments);
        if let Some(angle) = angle {
            core.current_angle = angle;
        }
        debug!(frame = ?bytes, "frame accepted");
        Ok(())
    }

    fn send(&self, command: Command) -> Result<(), DiseqcError> {
        let bytes = command.to_bytes(self.max_angle).inspect_err(|e| {
            warn!(?command, "command rejected: {e}");
        })?;
        self.dispatch(&bytes, None)
    }

    /// Send 1–6 raw bytes.
    ///
    /// # Errors
    /// `Busy` while a frame is in flight, otherwise `InvalidParam` for an
    /// empty or oversized frame.
    pub fn transmit(&self, bytes: &[u8]) -> Result<(), DiseqcError> {
        self.dispatch(bytes, None)
    }

    /// GotoX to `angle` degrees, clamped to `±max_angle`.
    ///
    /// On success the clamped angle becomes the current angle.
    pub fn goto_angle(&self, angle: f32) -> Result<(), DiseqcError> {
        let clamped = clamp_angle(angle, self.max_angle);
        let bytes = Command::GotoAngle(clamped).to_bytes(self.max_angle)?;
        self.dispatch(&bytes, Some(clamped))
    }

    /// Stop movement.
    pub fn halt(&self) -> Result<(), DiseqcError> {
        self.send(Command::Halt)
    }

    /// Drive east until halted.
    pub fn drive_east(&self) -> Result<(), DiseqcError> {
        self.send(Command::Drive(Direction::East))
    }

    /// Drive west until halted.
    pub fn drive_west(&self) -> Result<(), DiseqcError> {
        self.send(Command::Drive(Direction::West))
    }

    /// Step east `steps` times (1–128).
    pub fn step_east(&self, steps: u8) -> Result<(), DiseqcError> {
        self.send(Command::Step(Direction::East, steps))
    }

    /// Step west `steps` times (1–128).
    pub fn step_west(&self, steps: u8) -> Result<(), DiseqcError> {
        self.send(Command::Step(Direction::West, steps))
    }

    /// Disable the positioner's software travel limits.
    pub fn limits_off(&self) -> Result<(), DiseqcError> {
        self.send(Command::LimitsOff)
    }

    /// Store the current position in `slot`.
    pub fn store_position(&self, slot: u8) -> Result<(), DiseqcError> {
        self.send(Command::StorePosition(slot))
    }

    /// Timing source expiry: replay the next segment or finish the frame.
    ///
    /// Runs in the timer's context. Spurious expiries while idle are ignored.
    pub fn on_timer_expired(&self) {
        let completed = {
            let mut core = self.lock();
            let step = match &mut core.state {
                EngineState::Transmitting(scheduler) => scheduler.advance(),
                EngineState::Idle => {
                    trace!("expiry while idle ignored");
                    return;
                }
            };
            match step {
                SchedulerStep::Apply(segment) => {
                    core.carrier.set_level(segment.level);
                    self.timer
                        .arm_one_shot(segment.duration_us as u32, Arc::clone(&self.expiry));
                    false
                }
                SchedulerStep::Complete => {
                    core.carrier.set_level(CarrierLevel::Off);
                    core.state = EngineState::Idle;
                    core.frames_sent += 1;
                    true
                }
            }
        };

        if completed {
            trace!("frame complete");
            let handler = self.on_complete.lock().clone();
            if let Some(handler) = handler {
                handler();
            }
        }
    }

    /// Install (or clear) the completion notification.
    pub fn set_completion_handler(&self, handler: Option<CompletionHandler>) {
        *self.on_complete.lock() = handler;
    }

    /// Whether a frame is in flight.
    pub fn is_busy(&self) -> bool {
        self.lock().state.is_busy()
    }

    /// Last accepted (clamped) GotoX angle, 0.0 initially.
    pub fn get_current_angle(&self) -> f32 {
        self.lock().current_angle
    }

    /// Travel limit applied to GotoX.
    pub fn max_angle(&self) -> f32 {
        self.max_angle
    }

    /// Bytes of the most recently accepted frame.
    pub fn last_frame(&self) -> CommandBytes {
        self.lock().last_frame.clone()
    }

    /// Frames replayed to completion.
    pub fn frames_sent(&self) -> u64 {
        self.lock().frames_sent
    }

    /// Segments still to replay, 0 when idle.
    pub fn remaining_segments(&self) -> usize {
        match &self.lock().state {
            EngineState::Transmitting(scheduler) => scheduler.remaining(),
            EngineState::Idle => 0,
        }
    }
}
