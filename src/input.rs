//! Single-port MIDI input with a blocking receive queue.
//!
//! One port open at a time. Inbound messages go to an internal queue drained
//! by [`MidiIn::get_message`], or straight to a user callback when one is
//! installed.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::message::RawMessage;
use crate::provider::{InputProvider, PortDescriptor, RawCallback};

type Handler = Arc<dyn Fn(&RawMessage, f64) + Send + Sync>;

struct OpenInput<H> {
    name: String,
    handle: H,
    sender: Sender<(RawMessage, f64)>,
    receiver: Receiver<(RawMessage, f64)>,
}

struct InState<H> {
    open: Option<OpenInput<H>>,
    handler: Option<Handler>,
}

/// A single MIDI input port.
///
/// ```ignore
/// use midimux::{MidiIn, MidirInputProvider};
///
/// let input = MidiIn::new(MidirInputProvider::default());
/// input.open_port_matching("Korg*")?;
/// let (message, delta) = input.get_message()?;
/// # Ok::<(), midimux::Error>(())
/// ```
pub struct MidiIn<P: InputProvider> {
    provider: P,
    state: Mutex<InState<P::Handle>>,
}

impl<P: InputProvider> MidiIn<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: Mutex::new(InState {
                open: None,
                handler: None,
            }),
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

    /// Create a virtual input port visible to other applications.
    pub fn open_virtual_port(&self, name: &str) -> Result<()> {
        let handle = self.provider.open_virtual(name)?;
        self.attach(name.to_string(), handle);
        Ok(())
    }

    /// Close the open port, if any. Idempotent.
    pub fn close_port(&self) {
        let mut state = self.state.lock();
        if let Some(open) = state.open.take() {
            self.provider.cancel_callback(&open.handle);
            self.provider.close(open.handle);
            debug!(name = %open.name, "closed input port");
        }
    }

    /// Name of the currently open port.
    pub fn port_name(&self) -> Option<String> {
        self.state.lock().open.as_ref().map(|o| o.name.clone())
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open.is_some()
    }

    /// Deliver inbound messages to `handler` (`(message, delta_seconds)`)
    /// instead of the queue. Applies to the open port and any port opened
    /// later.
    pub fn set_callback<F>(&self, handler: F)
    where
        F: Fn(&RawMessage, f64) + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        state.handler = Some(Arc::new(handler));
        if state.open.is_some() {
            Self::route(&self.provider, &mut state);
        }
    }

    /// Remove the user callback; inbound messages queue for
    /// [`get_message`](Self::get_message) again.
    pub fn clear_callback(&self) {
        let mut state = self.state.lock();
        state.handler = None;
        if state.open.is_some() {
            Self::route(&self.provider, &mut state);
        }
    }

    /// Block until the next message arrives on the open port.
    ///
    /// Fails with [`Error::NotOpen`] if no port is open or the port is closed
    /// while waiting. While a user callback is installed, nothing reaches the
    /// queue and this blocks until the port is closed.
    pub fn get_message(&self) -> Result<(RawMessage, f64)> {
        let receiver = self.queue()?;
        receiver.recv().map_err(|_| Error::NotOpen)
    }

    /// Like [`get_message`](Self::get_message), but gives up after `timeout`
    /// and returns `None`.
    pub fn get_message_timeout(&self, timeout: Duration) -> Result<Option<(RawMessage, f64)>> {
        let receiver = self.queue()?;
        match receiver.recv_timeout(timeout) {
            Ok(entry) => Ok(Some(entry)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::NotOpen),
        }
    }

    // The receiver is cloned out so the queue can block without holding the
    // state lock (close_port must stay callable from another thread).
    fn queue(&self) -> Result<Receiver<(RawMessage, f64)>> {
        let state = self.state.lock();
        state
            .open
            .as_ref()
            .map(|open| open.receiver.clone())
            .ok_or(Error::NotOpen)
    }

    fn attach(&self, name: String, handle: P::Handle) {
        let mut state = self.state.lock();
        if let Some(previous) = state.open.take() {
            self.provider.cancel_callback(&previous.handle);
            self.provider.close(previous.handle);
            debug!(name = %previous.name, "closed previously open input port");
        }
        let (sender, receiver) = unbounded();
        debug!(name = %name, "opened input port");
        state.open = Some(OpenInput {
            name,
            handle,
            sender,
            receiver,
        });
        Self::route(&self.provider, &mut state);
    }

    // Register the raw callback for the current routing: user handler if one
    // is installed, queue otherwise.
    fn route(provider: &P, state: &mut InState<P::Handle>) {
        let Some(open) = state.open.as_ref() else {
            return;
        };
        let callback: RawCallback = match &state.handler {
            Some(handler) => {
                let handler = handler.clone();
                Arc::new(move |delta, bytes: &[u8]| {
                    let message = RawMessage::from_bytes(bytes);
                    handler(&message, delta);
                })
            }
            None => {
                let sender = open.sender.clone();
                Arc::new(move |delta, bytes: &[u8]| {
                    let _ = sender.send((RawMessage::from_bytes(bytes), delta));
                })
            }
        };
        provider.register_callback(&open.handle, callback);
    }
}

impl<P: InputProvider> Drop for MidiIn<P> {
    fn drop(&mut self) {
        self.close_port();
    }
}
