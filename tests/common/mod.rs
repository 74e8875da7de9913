//! Fake providers for exercising the hub and single-port components without
//! hardware. A shared registry records opens, closes and callback
//! registrations, and lets tests inject synthetic events on any open handle.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Once};

use parking_lot::Mutex;

use midimux::provider::{InputProvider, OutputProvider, RawCallback};
use midimux::{Error, Result};

static TRACING: Once = Once::new();

/// Route the crate's `tracing` output through the test harness capture.
/// Callable from every test; the subscriber installs once per binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .try_init();
    });
}

// ---------------------------------------------------------------------------
// Input side
// ---------------------------------------------------------------------------

pub struct InputRegistry {
    names: Vec<String>,
    inner: Mutex<InputRegistryState>,
}

#[derive(Default)]
struct InputRegistryState {
    next_handle: usize,
    slots: HashMap<usize, SlotEntry>,
    opened: Vec<usize>,
    closed: Vec<usize>,
    registrations: usize,
    cancellations: usize,
}

struct SlotEntry {
    index: usize,
    callback: Option<RawCallback>,
}

impl InputRegistry {
    pub fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            inner: Mutex::new(InputRegistryState::default()),
        })
    }

    /// Fire a synthetic event on every open handle bound to `index`, the way
    /// a provider thread would. Returns the number of callbacks invoked.
    pub fn inject(&self, index: usize, bytes: &[u8], delta: f64) -> usize {
        // Clone the callbacks out so user handlers run without the registry
        // lock held.
        let callbacks: Vec<RawCallback> = self
            .inner
            .lock()
            .slots
            .values()
            .filter(|slot| slot.index == index)
            .filter_map(|slot| slot.callback.clone())
            .collect();
        for callback in &callbacks {
            callback(delta, bytes);
        }
        callbacks.len()
    }

    pub fn opened(&self) -> Vec<usize> {
        self.inner.lock().opened.clone()
    }

    pub fn closed(&self) -> Vec<usize> {
        self.inner.lock().closed.clone()
    }

    pub fn open_handle_count(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn registrations(&self) -> usize {
        self.inner.lock().registrations
    }

    pub fn cancellations(&self) -> usize {
        self.inner.lock().cancellations
    }
}

pub struct FakeInputProvider {
    pub registry: Arc<InputRegistry>,
}

impl FakeInputProvider {
    pub fn new(registry: Arc<InputRegistry>) -> Self {
        Self { registry }
    }
}

#[derive(Debug)]
pub struct FakeInputHandle {
    id: usize,
}

impl InputProvider for FakeInputProvider {
    type Handle = FakeInputHandle;

    fn port_count(&self) -> usize {
        self.registry.names.len()
    }

    fn port_name(&self, index: usize) -> Result<String> {
        self.registry
            .names
            .get(index)
            .cloned()
            .ok_or(Error::OutOfRange {
                index,
                count: self.registry.names.len(),
            })
    }

    fn open(&self, index: usize) -> Result<FakeInputHandle> {
        let mut inner = self.registry.inner.lock();
        let id = inner.next_handle;
        inner.next_handle += 1;
        inner.slots.insert(
            id,
            SlotEntry {
                index,
                callback: None,
            },
        );
        inner.opened.push(index);
        Ok(FakeInputHandle { id })
    }

    fn open_virtual(&self, _name: &str) -> Result<FakeInputHandle> {
        Err(Error::Backend("fake provider has no virtual ports".into()))
    }

    fn register_callback(&self, handle: &FakeInputHandle, callback: RawCallback) {
        let mut inner = self.registry.inner.lock();
        inner.registrations += 1;
        inner
            .slots
            .get_mut(&handle.id)
            .expect("registering on a closed handle")
            .callback = Some(callback);
    }

    fn cancel_callback(&self, handle: &FakeInputHandle) {
        let mut inner = self.registry.inner.lock();
        inner.cancellations += 1;
        if let Some(slot) = inner.slots.get_mut(&handle.id) {
            slot.callback = None;
        }
    }

    fn close(&self, handle: FakeInputHandle) {
        let mut inner = self.registry.inner.lock();
        if let Some(slot) = inner.slots.remove(&handle.id) {
            inner.closed.push(slot.index);
        }
    }
}

// ---------------------------------------------------------------------------
// Output side
// ---------------------------------------------------------------------------

pub struct OutputRegistry {
    names: Vec<String>,
    inner: Mutex<OutputRegistryState>,
}

#[derive(Default)]
struct OutputRegistryState {
    sent: Vec<(usize, Vec<u8>)>,
    opened: Vec<usize>,
    closed: Vec<usize>,
}

impl OutputRegistry {
    pub fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            inner: Mutex::new(OutputRegistryState::default()),
        })
    }

    /// Everything sent so far, as `(port_index, bytes)` in send order.
    pub fn sent(&self) -> Vec<(usize, Vec<u8>)> {
        self.inner.lock().sent.clone()
    }

    pub fn opened(&self) -> Vec<usize> {
        self.inner.lock().opened.clone()
    }

    pub fn closed(&self) -> Vec<usize> {
        self.inner.lock().closed.clone()
    }
}

pub struct FakeOutputProvider {
    pub registry: Arc<OutputRegistry>,
}

impl FakeOutputProvider {
    pub fn new(registry: Arc<OutputRegistry>) -> Self {
        Self { registry }
    }
}

#[derive(Debug)]
pub struct FakeOutputHandle {
    index: usize,
}

impl OutputProvider for FakeOutputProvider {
    type Handle = FakeOutputHandle;

    fn port_count(&self) -> usize {
        self.registry.names.len()
    }

    fn port_name(&self, index: usize) -> Result<String> {
        self.registry
            .names
            .get(index)
            .cloned()
            .ok_or(Error::OutOfRange {
                index,
                count: self.registry.names.len(),
            })
    }

    fn open(&self, index: usize) -> Result<FakeOutputHandle> {
        self.registry.inner.lock().opened.push(index);
        Ok(FakeOutputHandle { index })
    }

    fn open_virtual(&self, _name: &str) -> Result<FakeOutputHandle> {
        Err(Error::Backend("fake provider has no virtual ports".into()))
    }

    fn send(&self, handle: &mut FakeOutputHandle, bytes: &[u8]) -> Result<()> {
        self.registry
            .inner
            .lock()
            .sent
            .push((handle.index, bytes.to_vec()));
        Ok(())
    }

    fn close(&self, handle: FakeOutputHandle) {
        self.registry.inner.lock().closed.push(handle.index);
    }
}
