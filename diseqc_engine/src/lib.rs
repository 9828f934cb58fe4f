//! # DiSEqC Engine Library
//!
//! Non-blocking DiSEqC 1.2 positioner control: commands are encoded into a
//! fixed-capacity segment arena and replayed segment by segment from the
//! timing source's expiry callback, while a millisecond tick drives motor
//! power sequencing.
//!
//! ## Layers
//!
//! 1. **frame** — byte → pulse-pair encoding with parity, frame assembly
//! 2. **engine** — segment scheduler and the transmission engine command surface
//! 3. **motor** — motor-enable supervisor (timed on / tracking / off)
//! 4. **rotor** — "move to angle" orchestration with deferred startup wait
//! 5. **cycle** — periodic tick runner with optional RT setup
//!
//! ## Zero-Allocation Replay
//!
//! Segment buffers are `heapless` arenas of at most 108 entries. The expiry
//! path only advances an integer cursor, applies a level and re-arms.

pub mod config;
pub mod cycle;
pub mod engine;
pub mod frame;
pub mod motor;
pub mod rotor;

pub use crate::engine::transmitter::TransmissionEngine;
pub use crate::motor::{MotorEnableSupervisor, MotorState};
pub use crate::rotor::RotorManager;
