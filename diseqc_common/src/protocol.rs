//! DiSEqC 1.2 positioner protocol.
//!
//! Command byte builders and the status taxonomy returned by every engine
//! operation.

pub mod command;
pub mod status;
