//! Multi-port input hub: many open input ports, one callback.
//!
//! The hub owns a dynamic set of open input handles and fans every inbound
//! message into a single user handler. Ports can be opened and closed at any
//! time; a handler installed before a port is opened still covers it
//! (binding is retroactive). Administrative calls are serialized by a mutex;
//! dispatch runs on provider threads and never takes that mutex.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::message::RawMessage;
use crate::pattern;
use crate::provider::{InputProvider, PortDescriptor, RawCallback};

/// What a with-source handler receives as the `source` argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceMode {
    /// The port's display name, captured at open time.
    #[default]
    Name,
    /// The port's index at open time.
    Index,
}

/// Identifies the port a message arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Name(Arc<str>),
    Index(usize),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Name(name) => f.write_str(name),
            Source::Index(index) => write!(f, "{index}"),
        }
    }
}

type PlainHandler = Arc<dyn Fn(&RawMessage, f64) + Send + Sync>;
type SourceHandler = Arc<dyn Fn(&Source, &RawMessage, f64) + Send + Sync>;

/// The hub-wide handler plus its calling convention. Exactly one binding is
/// active at a time; installing a new one supersedes the old one on every
/// open handle before the installing call returns.
#[derive(Clone)]
enum CallbackBinding {
    Plain(PlainHandler),
    WithSource(SourceHandler, SourceMode),
}

struct OpenPort<H> {
    index: usize,
    name: Arc<str>,
    handle: H,
    // True iff a native callback is currently registered on `handle`.
    callback_active: bool,
}

struct HubState<H> {
    // Open order is preserved; at most one entry per index.
    ports: Vec<OpenPort<H>>,
    binding: Option<CallbackBinding>,
}

/// Presents many concurrently open MIDI input ports as one logical receiver.
///
/// ```ignore
/// use midimux::{MidirInputProvider, MultiPortInputHub, SourceMode};
///
/// let hub = MultiPortInputHub::new(MidirInputProvider::default());
/// hub.set_callback_with_source(
///     |source, message, delta| println!("{source}: {:?} (+{delta}s)", message.bytes()),
///     SourceMode::Name,
/// );
/// hub.open_ports(&["IAC*", "Korg*"], None)?;
/// # Ok::<(), midimux::Error>(())
/// ```
pub struct MultiPortInputHub<P: InputProvider> {
    provider: P,
    state: Mutex<HubState<P::Handle>>,
}

impl<P: InputProvider> MultiPortInputHub<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: Mutex::new(HubState {
                ports: Vec::new(),
                binding: None,
            }),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Enumerate ports in provider order. No side effects; indices are only
    /// stable until device hot-plug.
    pub fn list_ports(&self) -> Vec<PortDescriptor> {
        (0..self.provider.port_count())
            .map(|index| PortDescriptor {
                index,
                name: self.provider.port_name(index).unwrap_or_default(),
            })
            .collect()
    }

    /// Indices of ports whose name matches the glob `pattern`, minus those
    /// whose name also matches `exclude`. Order follows [`list_ports`].
    ///
    /// [`list_ports`]: Self::list_ports
    pub fn ports_matching(&self, pattern: &str, exclude: Option<&str>) -> Result<Vec<usize>> {
        let include = pattern::compile(pattern)?;
        let exclude = exclude.map(pattern::compile).transpose()?;
        Ok(self
            .list_ports()
            .into_iter()
            .filter(|port| {
                include.is_match(&port.name)
                    && exclude.as_ref().is_none_or(|e| !e.is_match(&port.name))
            })
            .map(|port| port.index)
            .collect())
    }

    /// Open the port at `index`.
    ///
    /// Fails with [`Error::OutOfRange`] for an index past the provider's port
    /// count and [`Error::AlreadyOpen`] for an index already open on this hub
    /// (exactly one handle maps to one index). If a callback binding is
    /// installed, the new handle is registered for it before this returns.
    pub fn open_port(&self, index: usize) -> Result<()> {
        let count = self.provider.port_count();
        if index >= count {
            return Err(Error::OutOfRange { index, count });
        }

        let mut state = self.state.lock();
        if state.ports.iter().any(|port| port.index == index) {
            return Err(Error::AlreadyOpen(index));
        }

        let name: Arc<str> = self.provider.port_name(index).unwrap_or_default().into();
        let handle = self.provider.open(index)?;
        let mut port = OpenPort {
            index,
            name,
            handle,
            callback_active: false,
        };
        if let Some(binding) = state.binding.clone() {
            self.register_trampoline(&mut port, &binding);
        }
        debug!(index, name = %port.name, "opened input port");
        state.ports.push(port);
        Ok(())
    }

    /// Open every port matching any of `patterns` (minus `exclude` matches),
    /// in ascending index order. Indices already open are skipped, not
    /// errors, since patterns may overlap each other and ports opened
    /// earlier. Returns the indices actually opened.
    pub fn open_ports(&self, patterns: &[&str], exclude: Option<&str>) -> Result<Vec<usize>> {
        let mut wanted: Vec<usize> = Vec::new();
        for pattern in patterns {
            for index in self.ports_matching(pattern, exclude)? {
                if !wanted.contains(&index) {
                    wanted.push(index);
                }
            }
        }
        wanted.sort_unstable();

        let mut opened = Vec::new();
        for index in wanted {
            match self.open_port(index) {
                Ok(()) => opened.push(index),
                Err(Error::AlreadyOpen(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(opened)
    }

    /// Close the port at `index`. Returns false (no-op) if it is not open.
    pub fn close_port(&self, index: usize) -> bool {
        let mut state = self.state.lock();
        let Some(position) = state.ports.iter().position(|port| port.index == index) else {
            return false;
        };
        // Remaining ports keep their relative order.
        let port = state.ports.remove(position);
        if port.callback_active {
            self.provider.cancel_callback(&port.handle);
        }
        self.provider.close(port.handle);
        debug!(index, "closed input port");
        true
    }

    /// Close every open port (in open order) and clear the callback binding.
    /// Safe to call when nothing is open.
    pub fn close_ports(&self) {
        let mut state = self.state.lock();
        for port in state.ports.drain(..) {
            if port.callback_active {
                self.provider.cancel_callback(&port.handle);
            }
            self.provider.close(port.handle);
            debug!(index = port.index, "closed input port");
        }
        state.binding = None;
    }

    /// Install `handler` as the hub-wide callback: `(message, delta_seconds)`.
    ///
    /// Any previous binding is cancelled on every open handle before the new
    /// one is registered, so old and new handlers can never both fire for one
    /// event. The binding also covers ports opened later.
    pub fn set_callback<F>(&self, handler: F)
    where
        F: Fn(&RawMessage, f64) + Send + Sync + 'static,
    {
        self.install(CallbackBinding::Plain(Arc::new(handler)));
    }

    /// Install `handler` receiving the source port as its first argument:
    /// `(source, message, delta_seconds)`. `mode` selects whether the source
    /// is the port's display name or its index.
    pub fn set_callback_with_source<F>(&self, handler: F, mode: SourceMode)
    where
        F: Fn(&Source, &RawMessage, f64) + Send + Sync + 'static,
    {
        self.install(CallbackBinding::WithSource(Arc::new(handler), mode));
    }

    /// Cancel the hub-wide callback. Effective once this returns: no further
    /// handler invocation begins, though one already in flight on a provider
    /// thread is allowed to complete.
    pub fn clear_callback(&self) {
        let mut state = self.state.lock();
        Self::cancel_all(&self.provider, &mut state.ports);
        state.binding = None;
    }

    /// A multi-port hub has no single blocking source; use the single-port
    /// [`MidiIn`](crate::MidiIn) for blocking reads.
    pub fn get_message(&self) -> Result<(RawMessage, f64)> {
        Err(Error::UnsupportedOperation(
            "blocking reads are not defined on a multi-port hub",
        ))
    }

    pub fn open_port_count(&self) -> usize {
        self.state.lock().ports.len()
    }

    /// Indices of currently open ports, in open order.
    pub fn open_indices(&self) -> Vec<usize> {
        self.state.lock().ports.iter().map(|p| p.index).collect()
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.state.lock().ports.iter().any(|p| p.index == index)
    }

    fn install(&self, binding: CallbackBinding) {
        let mut state = self.state.lock();
        // Cancel-all strictly precedes any new registration.
        Self::cancel_all(&self.provider, &mut state.ports);
        for port in state.ports.iter_mut() {
            self.register_trampoline(port, &binding);
        }
        state.binding = Some(binding);
    }

    fn cancel_all(provider: &P, ports: &mut [OpenPort<P::Handle>]) {
        for port in ports.iter_mut() {
            if port.callback_active {
                provider.cancel_callback(&port.handle);
                port.callback_active = false;
            }
        }
    }

    // The per-port context (source identity) is resolved here, once per
    // registration; the trampoline owns it and never touches hub state.
    fn register_trampoline(&self, port: &mut OpenPort<P::Handle>, binding: &CallbackBinding) {
        let trampoline: RawCallback = match binding {
            CallbackBinding::Plain(handler) => {
                let handler = handler.clone();
                Arc::new(move |delta, bytes: &[u8]| {
                    let message = RawMessage::from_bytes(bytes);
                    handler(&message, delta);
                })
            }
            CallbackBinding::WithSource(handler, mode) => {
                let handler = handler.clone();
                let source = match mode {
                    SourceMode::Name => Source::Name(port.name.clone()),
                    SourceMode::Index => Source::Index(port.index),
                };
                Arc::new(move |delta, bytes: &[u8]| {
                    let message = RawMessage::from_bytes(bytes);
                    handler(&source, &message, delta);
                })
            }
        };
        self.provider.register_callback(&port.handle, trampoline);
        port.callback_active = true;
    }
}

impl<P: InputProvider> Drop for MultiPortInputHub<P> {
    fn drop(&mut self) {
        self.close_ports();
    }
}

impl<P: InputProvider> fmt::Debug for MultiPortInputHub<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MultiPortInputHub")
            .field("open_ports", &state.ports.len())
            .field("has_callback", &state.binding.is_some())
            .finish()
    }
}
