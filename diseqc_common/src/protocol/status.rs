//! Status codes and error type for engine operations.
//!
//! Every command returns `Result<(), DiseqcError>`. The interop boundary wants
//! a plain numeric code instead, so [`Status`] mirrors the taxonomy as a
//! `#[repr(u8)]` enum.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejection reasons for an engine command.
///
/// Nothing is fatal: a rejected command leaves angle, motor state and any
/// in-flight frame untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiseqcError {
    /// A frame is still being replayed.
    #[error("transmission in progress")]
    Busy,

    /// Empty or oversized frame, or an out-of-range argument.
    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),
}

impl DiseqcError {
    /// Numeric status for the interop layer.
    #[inline]
    pub const fn status(&self) -> Status {
        match self {
            Self::Busy => Status::Busy,
            Self::InvalidParam(_) => Status::InvalidParam,
        }
    }
}

/// Numeric status code exposed to the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Status {
    /// Command accepted.
    Ok = 0,
    /// Transmission in progress.
    Busy = 1,
    /// Invalid argument.
    InvalidParam = 2,
}

impl Status {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Busy),
            2 => Some(Self::InvalidParam),
            _ => None,
        }
    }

    /// Collapse a command result into its status code.
    #[inline]
    pub fn from_result<T>(result: &Result<T, DiseqcError>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(e) => e.status(),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Ok
    }
}
