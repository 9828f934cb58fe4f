//! Hardware abstraction layer types and collaborator traits.
//!
//! This module contains the wire-level segment types and the traits the
//! transmission engine and motor supervisor consume from low-level drivers.

pub mod driver;
pub mod types;
