//! Error types for MIDI port and message operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("port index {index} out of range (port count is {count})")]
    OutOfRange { index: usize, count: usize },

    #[error("port {0} is already open")]
    AlreadyOpen(usize),

    #[error("no port matches pattern '{0}'")]
    PortNotFound(String),

    #[error("no port is open")]
    NotOpen,

    #[error("invalid port name pattern: {0}")]
    InvalidPattern(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("MIDI backend error: {0}")]
    Backend(String),
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::Backend(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::PortInfoError> for Error {
    fn from(e: midir::PortInfoError) -> Self {
        Error::Backend(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::Backend(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::Backend(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::SendError> for Error {
    fn from(e: midir::SendError) -> Self {
        Error::Backend(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
