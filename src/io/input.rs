//! midir-backed input provider.
//!
//! Each open handle owns its midir connection plus a lock-free callback slot.
//! The connection's forwarding closure reads the slot on every inbound event,
//! so registering or cancelling a callback never reconnects the device and a
//! cancel is effective the moment the slot is cleared.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use midir::{Ignore, MidiInput, MidiInputConnection};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::provider::{InputProvider, RawCallback};

#[cfg(unix)]
use midir::os::unix::VirtualInput;

// ArcSwap needs a sized pointee, so the trait-object callback is boxed in a
// one-field struct.
struct InstalledCallback(RawCallback);

type CallbackSlot = ArcSwapOption<InstalledCallback>;

/// Enumerates and opens hardware input ports through midir.
///
/// Enumeration creates a fresh inspection client per call; inspection clients
/// are never connected or registered for callbacks.
#[derive(Debug, Clone)]
pub struct MidirInputProvider {
    client_name: String,
}

impl MidirInputProvider {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    fn inspect(&self) -> Result<MidiInput> {
        Ok(MidiInput::new(&self.client_name)?)
    }
}

impl Default for MidirInputProvider {
    fn default() -> Self {
        Self::new("midimux")
    }
}

/// An open midir input connection plus its callback slot.
pub struct MidirInputHandle {
    // Held only for its Drop; closing the port is dropping the connection.
    _connection: MidiInputConnection<()>,
    slot: Arc<CallbackSlot>,
}

impl InputProvider for MidirInputProvider {
    type Handle = MidirInputHandle;

    fn port_count(&self) -> usize {
        match MidiInput::new(&self.client_name) {
            Ok(input) => input.port_count(),
            Err(e) => {
                warn!("MIDI input enumeration failed: {e}");
                0
            }
        }
    }

    fn port_name(&self, index: usize) -> Result<String> {
        let input = self.inspect()?;
        let ports = input.ports();
        let port = ports.get(index).ok_or(Error::OutOfRange {
            index,
            count: ports.len(),
        })?;
        Ok(input.port_name(port)?)
    }

    fn open(&self, index: usize) -> Result<MidirInputHandle> {
        let mut input = self.inspect()?;
        input.ignore(Ignore::None);
        let ports = input.ports();
        let port = ports.get(index).ok_or(Error::OutOfRange {
            index,
            count: ports.len(),
        })?;

        let slot = Arc::new(CallbackSlot::empty());
        let connection = input.connect(port, "midimux-in", forwarder(&slot), ())?;
        debug!(index, "connected midir input port");
        Ok(MidirInputHandle {
            _connection: connection,
            slot,
        })
    }

    fn open_virtual(&self, name: &str) -> Result<MidirInputHandle> {
        #[cfg(unix)]
        {
            let mut input = self.inspect()?;
            input.ignore(Ignore::None);
            let slot = Arc::new(CallbackSlot::empty());
            let connection = input.create_virtual(name, forwarder(&slot), ())?;
            debug!(name, "created virtual midir input port");
            Ok(MidirInputHandle {
                _connection: connection,
                slot,
            })
        }
        #[cfg(not(unix))]
        {
            let _ = name;
            Err(Error::Backend(
                "virtual MIDI ports are not supported on this platform".into(),
            ))
        }
    }

    fn register_callback(&self, handle: &MidirInputHandle, callback: RawCallback) {
        handle.slot.store(Some(Arc::new(InstalledCallback(callback))));
    }

    fn cancel_callback(&self, handle: &MidirInputHandle) {
        handle.slot.store(None);
    }

    fn close(&self, handle: MidirInputHandle) {
        handle.slot.store(None);
        drop(handle);
    }
}

// midir reports absolute microsecond timestamps; callbacks receive the delta
// in seconds since the previous message on the same connection.
fn forwarder(slot: &Arc<CallbackSlot>) -> impl FnMut(u64, &[u8], &mut ()) + Send + 'static {
    let slot = Arc::clone(slot);
    let mut last_timestamp: Option<u64> = None;
    move |timestamp, bytes, _| {
        let delta = match last_timestamp {
            Some(previous) => timestamp.saturating_sub(previous) as f64 / 1_000_000.0,
            None => 0.0,
        };
        last_timestamp = Some(timestamp);
        if let Some(installed) = slot.load_full() {
            (installed.0)(delta, bytes);
        }
    }
}
