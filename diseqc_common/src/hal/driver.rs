//! Collaborator traits and error types for low-level drivers.
//!
//! This module defines:
//! - `CarrierOutput` trait - Immediate carrier level control (PWM compare)
//! - `TimingSource` trait - One-shot timer with an asynchronous expiry callback
//! - `EnableLine` trait - Motor power-enable GPIO
//! - `HalError` enum - Initialization failures of the above
//! - `ExpiryCallback` type alias - Callback invoked on timer expiry

use std::sync::Arc;
use thiserror::Error;

use crate::hal::types::CarrierLevel;

/// Error types for driver initialization.
///
/// Drivers report failures only while they are being brought up; once a
/// driver exists, every per-command operation is infallible.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Construction parameter out of range
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Timing source could not be started
    #[error("Timing source unavailable: {0}")]
    TimerUnavailable(String),
}

/// Callback invoked exactly once per armed one-shot.
///
/// May run in an interrupt or timer-thread context, never on the caller's
/// stack of `arm_one_shot`.
pub type ExpiryCallback = Arc<dyn Fn() + Send + Sync>;

/// Carrier generator (e.g. timer PWM channel feeding the LNB DSQIN pin).
///
/// `set_level` takes effect immediately; there is no queue.
pub trait CarrierOutput: Send {
    /// Returns the driver's identifier (e.g., "simulation", "tim4-pwm").
    fn name(&self) -> &'static str;

    /// Apply a carrier level now.
    fn set_level(&mut self, level: CarrierLevel);
}

/// One-shot timing source with microsecond resolution.
///
/// # Timing Contracts
///
/// | Operation | Context | Blocking |
/// |-----------|---------|----------|
/// | `arm_one_shot()` | caller or expiry callback | never |
/// | `on_expire` | timer ISR / timer thread | must not block |
pub trait TimingSource: Send + Sync {
    /// Returns the driver's identifier.
    fn name(&self) -> &'static str;

    /// Arm a one-shot that invokes `on_expire` after `duration_us`.
    ///
    /// Arming while a previous one-shot is pending replaces it.
    fn arm_one_shot(&self, duration_us: u32, on_expire: ExpiryCallback);
}

/// Motor power-enable output.
pub trait EnableLine: Send {
    /// Returns the driver's identifier.
    fn name(&self) -> &'static str;

    /// Drive the line high (`true`) or low (`false`).
    fn set(&mut self, high: bool);
}
