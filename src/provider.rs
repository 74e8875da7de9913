//! The port provider seam: enumeration, open/close, raw callbacks, send.
//!
//! The hub and the single-port components are generic over these traits so
//! they can run against the midir backend (`midi-io` feature) or any fake
//! provider in tests. Callbacks fire on whatever thread the provider uses for
//! a given handle; no thread identity is guaranteed across a handle's
//! lifetime.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A raw per-handle callback: `(delta_seconds, bytes)`.
///
/// The timestamp is the provider-reported delta in seconds since the previous
/// message on the same handle. The byte slice is only valid for the duration
/// of the call.
pub type RawCallback = Arc<dyn Fn(f64, &[u8]) + Send + Sync>;

/// An enumerated port: a provider-assigned index and a display name.
///
/// Names are not guaranteed unique, and indices are only stable until devices
/// are plugged or unplugged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    pub index: usize,
    pub name: String,
}

/// Input side of a port provider.
///
/// Enumeration (`port_count`, `port_name`) must use an inspection client
/// distinct from any opened handle, and must never register callbacks on it.
///
/// `cancel_callback` must be immediately effective: once it returns, no new
/// invocation of the cancelled callback may begin (an invocation already in
/// flight is allowed to complete).
pub trait InputProvider {
    type Handle: Send;

    fn port_count(&self) -> usize;

    fn port_name(&self, index: usize) -> Result<String>;

    /// Open a connection to the port at `index`.
    fn open(&self, index: usize) -> Result<Self::Handle>;

    /// Create a virtual input port visible to other applications.
    fn open_virtual(&self, name: &str) -> Result<Self::Handle>;

    /// Install `callback` on `handle`, replacing any previous one.
    fn register_callback(&self, handle: &Self::Handle, callback: RawCallback);

    fn cancel_callback(&self, handle: &Self::Handle);

    /// Close the connection. Consumes the handle, so a handle is closed at
    /// most once.
    fn close(&self, handle: Self::Handle);
}

/// Output side of a port provider.
pub trait OutputProvider {
    type Handle: Send;

    fn port_count(&self) -> usize;

    fn port_name(&self, index: usize) -> Result<String>;

    fn open(&self, index: usize) -> Result<Self::Handle>;

    /// Create a virtual output port visible to other applications.
    fn open_virtual(&self, name: &str) -> Result<Self::Handle>;

    fn send(&self, handle: &mut Self::Handle, bytes: &[u8]) -> Result<()>;

    fn close(&self, handle: Self::Handle);
}
