//! Driver implementations.
//!
//! - [`simulation`] - Software backends for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `CarrierOutput`, `TimingSource` and `EnableLine` from
//!    `diseqc_common::hal::driver`
//! 3. Report bring-up failures as `HalError` from the constructor

pub mod simulation;
