//! Simulation driver module.
//!
//! Software stand-ins for the PWM carrier, the one-shot hardware timer and the
//! motor enable GPIO, usable without physical hardware.

mod carrier;
mod enable;
mod timer;

pub use carrier::RecordingCarrier;
pub use enable::SimEnableLine;
pub use timer::{SteppedTimer, ThreadTimer};
