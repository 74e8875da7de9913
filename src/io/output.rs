//! midir-backed output provider.

use midir::{MidiOutput, MidiOutputConnection};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::provider::OutputProvider;

#[cfg(unix)]
use midir::os::unix::VirtualOutput;

/// Enumerates and opens hardware output ports through midir.
#[derive(Debug, Clone)]
pub struct MidirOutputProvider {
    client_name: String,
}

impl MidirOutputProvider {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    fn inspect(&self) -> Result<MidiOutput> {
        Ok(MidiOutput::new(&self.client_name)?)
    }
}

impl Default for MidirOutputProvider {
    fn default() -> Self {
        Self::new("midimux")
    }
}

impl OutputProvider for MidirOutputProvider {
    type Handle = MidiOutputConnection;

    fn port_count(&self) -> usize {
        match MidiOutput::new(&self.client_name) {
            Ok(output) => output.port_count(),
            Err(e) => {
                warn!("MIDI output enumeration failed: {e}");
                0
            }
        }
    }

    fn port_name(&self, index: usize) -> Result<String> {
        let output = self.inspect()?;
        let ports = output.ports();
        let port = ports.get(index).ok_or(Error::OutOfRange {
            index,
            count: ports.len(),
        })?;
        Ok(output.port_name(port)?)
    }

    fn open(&self, index: usize) -> Result<MidiOutputConnection> {
        let output = self.inspect()?;
        let ports = output.ports();
        let port = ports.get(index).ok_or(Error::OutOfRange {
            index,
            count: ports.len(),
        })?;
        let connection = output.connect(port, "midimux-out")?;
        debug!(index, "connected midir output port");
        Ok(connection)
    }

    fn open_virtual(&self, name: &str) -> Result<MidiOutputConnection> {
        #[cfg(unix)]
        {
            let output = self.inspect()?;
            let connection = output.create_virtual(name)?;
            debug!(name, "created virtual midir output port");
            Ok(connection)
        }
        #[cfg(not(unix))]
        {
            let _ = name;
            Err(Error::Backend(
                "virtual MIDI ports are not supported on this platform".into(),
            ))
        }
    }

    fn send(&self, handle: &mut MidiOutputConnection, bytes: &[u8]) -> Result<()> {
        Ok(handle.send(bytes)?)
    }

    fn close(&self, handle: MidiOutputConnection) {
        drop(handle);
    }
}
