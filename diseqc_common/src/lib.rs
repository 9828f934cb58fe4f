//! DiSEqC Common Library
//!
//! This crate provides the protocol constants, wire-level types, collaborator
//! traits and configuration loading shared by every crate of the rotor
//! controller workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - DiSEqC 1.2 timing, capacity and command-byte constants
//! - [`protocol`] - Command byte builders and the status/error taxonomy
//! - [`hal`] - Carrier/timer/enable-line traits and segment types
//! - [`config`] - TOML configuration types and the [`config::ConfigLoader`] trait
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use diseqc_common::prelude::*;
//!
//! let bytes = Command::GotoAngle(10.0).to_bytes(80.0)?;
//! assert_eq!(bytes.as_slice(), &[0xE0, 0x31, 0x6E, 0xD0, 0xA0]);
//! # Ok::<(), DiseqcError>(())
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
pub mod protocol;
