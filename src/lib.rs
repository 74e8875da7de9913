//! Multi-port MIDI input multiplexing and raw message I/O.
//!
//! The centerpiece is [`MultiPortInputHub`]: many concurrently open input
//! ports behind one callback, with dynamic open/close and a choice of
//! handler calling conventions (with or without a source identifier).
//! [`MidiIn`] and [`MidiOut`] cover the single-port cases, including a
//! blocking receive queue on the input side.
//!
//! All device access goes through the [`provider`] traits; the default
//! backend is midir, behind the `midi-io` feature (on by default).
//!
//! # Example
//!
//! ```ignore
//! use midimux::{MidirInputProvider, MultiPortInputHub, SourceMode};
//!
//! let hub = MultiPortInputHub::new(MidirInputProvider::default());
//! hub.set_callback_with_source(
//!     |source, message, delta| println!("{source}: {:02X?} (+{delta}s)", message.bytes()),
//!     SourceMode::Name,
//! );
//! hub.open_ports(&["IAC*"], Some("IAC Driver Old"))?;
//! # Ok::<(), midimux::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod message;
pub use message::{
    message_type_name, split_status, RawMessage, CHANNEL_AFTERTOUCH, CONTROL_CHANGE, NOTE_OFF,
    NOTE_ON, PITCH_BEND, POLY_AFTERTOUCH, PROGRAM_CHANGE,
};

mod note;
pub use note::{note_name, note_number, pitch_bend_to_semitones, semitones_to_pitch_bend};

mod pattern;
pub use pattern::glob_match;

pub mod provider;
pub use provider::{InputProvider, OutputProvider, PortDescriptor, RawCallback};

mod hub;
pub use hub::{MultiPortInputHub, Source, SourceMode};

mod input;
pub use input::MidiIn;

mod output;
pub use output::MidiOut;

#[cfg(feature = "midi-io")]
pub(crate) mod io;

#[cfg(feature = "midi-io")]
pub use io::{MidirInputHandle, MidirInputProvider, MidirOutputProvider};
