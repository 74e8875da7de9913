//! Hardware MIDI I/O.
//!
//! midir-backed implementations of the provider traits. Requires the
//! `midi-io` feature.

mod input;
mod output;

pub use input::{MidirInputHandle, MidirInputProvider};
pub use output::MidirOutputProvider;
