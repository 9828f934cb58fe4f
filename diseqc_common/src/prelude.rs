//! Prelude module for common re-exports.
//!
//! Consumers can do `use diseqc_common::prelude::*;` and get the most
//! important types without listing individual paths.
//!
//! # Usage
//!
//! ```rust
//! use diseqc_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    CarrierConfig, ConfigError, ConfigLoader, RotorConfig, RotorSection, SharedConfig,
};

// ─── Protocol ───────────────────────────────────────────────────────
pub use crate::protocol::command::{Command, Direction};
pub use crate::protocol::status::{DiseqcError, Status};

// ─── Drivers ────────────────────────────────────────────────────────
pub use crate::hal::driver::{CarrierOutput, EnableLine, ExpiryCallback, HalError, TimingSource};
pub use crate::hal::types::{CarrierLevel, CommandBytes, Segment, SegmentBuffer};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{MAX_FRAME_BYTES, MAX_SEGMENTS, MOTOR_STARTUP_MS};

/// Default supervisor tick as Duration.
pub const DEFAULT_TICK: Duration =
    Duration::from_millis(crate::consts::TICK_INTERVAL_MS as u64);
