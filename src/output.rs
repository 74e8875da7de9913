//! Single-port MIDI output sender.

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::message::RawMessage;
use crate::provider::{OutputProvider, PortDescriptor};

struct OpenOutput<H> {
    name: String,
    handle: H,
}

/// A single MIDI output port with typed send conveniences.
///
/// ```ignore
/// use midimux::{MidiOut, MidirOutputProvider};
///
/// let output = MidiOut::new(MidirOutputProvider::default());
/// output.open_port_matching("IAC*")?;
/// output.send_note_on(0, 60, 100)?;
/// # Ok::<(), midimux::Error>(())
/// ```
pub struct MidiOut<P: OutputProvider> {
    provider: P,
    state: Mutex<Option<OpenOutput<P::Handle>>>,
}

impl<P: OutputProvider> MidiOut<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: Mutex::new(None),
        }
    }

    /// Enumerate ports in provider order.
    pub fn list_ports(&self) -> Vec<PortDescriptor> {
        (0..self.provider.port_count())
            .map(|index| PortDescriptor {
                index,
                name: self.provider.port_name(index).unwrap_or_default(),
            })
            .collect()
    }

    /// Open the port at `index`, closing any previously open port first.
    pub fn open_port(&self, index: usize) -> Result<()> {
        let count = self.provider.port_count();
        if index >= count {
            return Err(Error::OutOfRange { index, count });
        }
        let name = self.provider.port_name(index).unwrap_or_default();
        let handle = self.provider.open(index)?;
        self.attach(name, handle);
        Ok(())
    }

    /// Open the first port whose name matches the glob `pattern`, or fail
    /// with [`Error::PortNotFound`].
    pub fn open_port_matching(&self, pattern: &str) -> Result<()> {
        let matcher = crate::pattern::compile(pattern)?;
        let port = self
            .list_ports()
            .into_iter()
            .find(|port| matcher.is_match(&port.name))
            .ok_or_else(|| Error::PortNotFound(pattern.to_string()))?;
        let handle = self.provider.open(port.index)?;
        self.attach(port.name, handle);
        Ok(())
    }

    /// Create a virtual output port visible to other applications.
    pub fn open_virtual_port(&self, name: &str) -> Result<()> {
        let handle = self.provider.open_virtual(name)?;
        self.attach(name.to_string(), handle);
        Ok(())
    }

    /// Close the open port, if any. Idempotent.
    pub fn close_port(&self) {
        let mut state = self.state.lock();
        if let Some(open) = state.take() {
            self.provider.close(open.handle);
            debug!(name = %open.name, "closed output port");
        }
    }

    /// Name of the currently open port.
    pub fn port_name(&self) -> Option<String> {
        self.state.lock().as_ref().map(|o| o.name.clone())
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Send raw bytes, status byte first.
    pub fn send_raw(&self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        let open = state.as_mut().ok_or(Error::NotOpen)?;
        self.provider.send(&mut open.handle, bytes)
    }

    pub fn send(&self, message: &RawMessage) -> Result<()> {
        self.send_raw(message.bytes())
    }

    /// Send several messages in one call, in order, under one lock
    /// acquisition. Stops at the first failed send.
    pub fn send_all(&self, messages: &[RawMessage]) -> Result<()> {
        let mut state = self.state.lock();
        let open = state.as_mut().ok_or(Error::NotOpen)?;
        for message in messages {
            self.provider.send(&mut open.handle, message.bytes())?;
        }
        Ok(())
    }

    /// Like [`send_all`](Self::send_all), for raw byte slices.
    pub fn send_raw_all(&self, messages: &[&[u8]]) -> Result<()> {
        let mut state = self.state.lock();
        let open = state.as_mut().ok_or(Error::NotOpen)?;
        for bytes in messages {
            self.provider.send(&mut open.handle, bytes)?;
        }
        Ok(())
    }

    pub fn send_note_on(&self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        self.send(&RawMessage::note_on(channel, note, velocity))
    }

    pub fn send_note_off(&self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        self.send(&RawMessage::note_off(channel, note, velocity))
    }

    pub fn send_control_change(&self, channel: u8, cc_number: u8, value: u8) -> Result<()> {
        self.send(&RawMessage::control_change(channel, cc_number, value))
    }

    pub fn send_program_change(&self, channel: u8, program: u8) -> Result<()> {
        self.send(&RawMessage::program_change(channel, program))
    }

    /// `value`: signed 14-bit (-8192 to 8191).
    pub fn send_pitch_bend(&self, channel: u8, value: i16) -> Result<()> {
        self.send(&RawMessage::pitch_bend(channel, value))
    }

    fn attach(&self, name: String, handle: P::Handle) {
        let mut state = self.state.lock();
        if let Some(previous) = state.take() {
            self.provider.close(previous.handle);
            debug!(name = %previous.name, "closed previously open output port");
        }
        debug!(name = %name, "opened output port");
        *state = Some(OpenOutput { name, handle });
    }
}

impl<P: OutputProvider> Drop for MidiOut<P> {
    fn drop(&mut self) {
        self.close_port();
    }
}
