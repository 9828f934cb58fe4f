//! Transmission engine.
//!
//! - [`scheduler`] — pure replay cursor over a built frame
//! - [`transmitter`] — command surface, busy gate and timer wiring

pub mod scheduler;
pub mod transmitter;
