//! Motor-enable supervisor.
//!
//! Power-gates the rotor motor through a single GPIO line.
//!
//! ```text
//!            turn_on(t)                       countdown reaches 0
//!   Off ─────────────────► TimedOn{ms} ─────────────────────────► Off
//!    │  ▲                    │    ▲ turn_on(t) restarts countdown
//!    │  │ stop_tracking      │    └─┘
//!    │  │ force_off          │ start_tracking
//!    ▼  │                    ▼
//!   Tracking ◄───────────────┘           (turn_on is a no-op here)
//! ```
//!
//! The countdown is driven by [`MotorEnableSupervisor::tick`], called with
//! the elapsed milliseconds from the periodic tick runner. It is the only
//! cancellable timer in the system.

use diseqc_common::consts::MOTOR_STARTUP_MS;
use diseqc_common::hal::driver::EnableLine;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

/// Motor power state. Exactly one holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MotorState {
    /// Line low.
    #[default]
    Off,
    /// Line high until the countdown expires.
    TimedOn {
        /// Milliseconds until auto shut-off.
        remaining_ms: u32,
    },
    /// Line high indefinitely.
    Tracking,
}

impl MotorState {
    /// Whether the line is high.
    #[inline]
    pub const fn is_on(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

struct SupervisorCore<L> {
    line: L,
    state: MotorState,
}

impl<L: EnableLine> SupervisorCore<L> {
    fn switch_off(&mut self) {
        self.line.set(false);
        self.state = MotorState::Off;
    }
}

/// Motor-enable supervisor.
pub struct MotorEnableSupervisor<L> {
    core: Mutex<SupervisorCore<L>>,
    startup_ms: u32,
}

impl<L: EnableLine> MotorEnableSupervisor<L> {
    /// Create a supervisor with the default 2000 ms startup allowance.
    pub fn new(line: L) -> Self {
        Self::with_startup(line, MOTOR_STARTUP_MS)
    }

    /// Create a supervisor with a custom startup allowance [ms].
    ///
    /// The line is driven low.
    pub fn with_startup(mut line: L, startup_ms: u32) -> Self {
        line.set(false);
        Self {
            core: Mutex::new(SupervisorCore {
                line,
                state: MotorState::Off,
            }),
            startup_ms,
        }
    }

    /// Startup allowance added to every timed run [ms].
    pub fn startup_ms(&self) -> u32 {
        self.startup_ms
    }

    /// Power the motor for `travel_time_sec` plus the startup allowance.
    ///
    /// A new call while timed restarts the countdown. No-op while tracking.
    /// The total saturates at `u32::MAX` milliseconds.
    pub fn turn_on(&self, travel_time_sec: u32) {
        let mut core = self.core.lock();
        if core.state == MotorState::Tracking {
            debug!("turn_on ignored while tracking");
            return;
        }
        let total_ms = travel_time_sec
            .saturating_mul(1000)
            .saturating_add(self.startup_ms);
        core.line.set(true);
        core.state = MotorState::TimedOn {
            remaining_ms: total_ms,
        };
        debug!(total_ms, "motor on (timed)");
    }

    /// Power the motor indefinitely, cancelling any countdown.
    pub fn start_tracking(&self) {
        let mut core = self.core.lock();
        core.line.set(true);
        core.state = MotorState::Tracking;
        debug!("motor on (tracking)");
    }

    /// Leave tracking mode and power down.
    pub fn stop_tracking(&self) {
        self.core.lock().switch_off();
        debug!("motor off (tracking stopped)");
    }

    /// Power down from any state, cancelling any countdown.
    pub fn force_off(&self) {
        self.core.lock().switch_off();
        debug!("motor off (forced)");
    }

    /// Whether the motor is powered.
    pub fn is_on(&self) -> bool {
        self.core.lock().state.is_on()
    }

    /// Current state.
    pub fn state(&self) -> MotorState {
        self.core.lock().state
    }

    /// Advance the countdown by `elapsed_ms`.
    ///
    /// Powers down when a timed run expires; does nothing otherwise.
    pub fn tick(&self, elapsed_ms: u32) {
        let mut core = self.core.lock();
        if let MotorState::TimedOn { remaining_ms } = core.state {
            let remaining_ms = remaining_ms.saturating_sub(elapsed_ms);
            if remaining_ms == 0 {
                core.switch_off();
                debug!("motor off (timeout)");
            } else {
                core.state = MotorState::TimedOn { remaining_ms };
            }
        }
    }
}
