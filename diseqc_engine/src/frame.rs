//! Frame encoding.
//!
//! - [`encoder`] — one byte → 9 carrier on/off pairs
//! - [`builder`] — 1–6 bytes → segment arena

pub mod builder;
pub mod encoder;

pub use builder::{FrameBuilder, encode};
pub use encoder::{encode_byte, parity_bit};
