//! # DiSEqC HAL Library
//!
//! Software backends for the collaborator traits defined in
//! `diseqc_common::hal::driver`, plus a receiver-side waveform decoder.
//!
//! # Module Structure
//!
//! - [`drivers`] - Simulated carrier output, timing sources and enable line
//! - [`trace`] - Shared signal trace recorded by the simulated drivers
//! - [`waveform`] - Segment trace → command bytes decoder with parity check
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      diseqc_hal                            │
//! │  ┌──────────────────┐   ┌──────────────┐                   │
//! │  │ RecordingCarrier │──►│              │   ┌────────────┐  │
//! │  └──────────────────┘   │ SignalTrace  │──►│ waveform:: │  │
//! │  ┌──────────────────┐   │ (level/arm)  │   │ decode()   │  │
//! │  │ Stepped/Thread   │──►│              │   └────────────┘  │
//! │  │ Timer            │   └──────────────┘                   │
//! │  └──────────────────┘                                      │
//! └────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod drivers;
pub mod trace;
pub mod waveform;

// Re-export key types for convenience
pub use crate::drivers::simulation::{RecordingCarrier, SimEnableLine, SteppedTimer, ThreadTimer};
pub use crate::trace::{SignalTrace, TraceEvent};
pub use crate::waveform::{WaveformDecoder, WaveformError};
