//! Player actions
//!
//! Inbound movement input and its integration into player state.

mod input;

pub use input::{InputPacket, apply_input, validate_input};
