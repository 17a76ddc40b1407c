//! Listener registry for transport implementations.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::events::{EventKind, TransportEvent};
use crate::transport::{EventHandler, HandlerId};

/// A listener registry keyed by [`EventKind`].
///
/// Concrete transports can embed an `EventBus` to satisfy the
/// `on`/`off`/`emit` half of the [`Transport`](crate::Transport) contract.
/// Listeners may register or deregister other listeners from inside a
/// callback; dispatch works from a snapshot, so such changes take effect on
/// the next emit.
pub struct EventBus {
    inner: Mutex<BusInner>,
}

struct BusInner {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<(HandlerId, EventHandler)>>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BusInner {
                next_id: 0,
                listeners: HashMap::new(),
            }),
        }
    }

    /// Registers a listener for the given event kind.
    pub fn on(&self, kind: EventKind, handler: EventHandler) -> HandlerId {
        let mut inner = self.inner.lock().unwrap();
        let id = HandlerId::from_raw(inner.next_id);
        inner.next_id += 1;
        inner.listeners.entry(kind).or_default().push((id, handler));
        id
    }

    /// Removes a listener by its token. Unknown ids are ignored.
    pub fn off(&self, kind: EventKind, id: HandlerId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entries) = inner.listeners.get_mut(&kind) {
            entries.retain(|(entry_id, _)| *entry_id != id);
        }
    }

    /// Delivers an event to every listener registered for its kind.
    ///
    /// If a listener panics, the panic is caught and the remaining listeners
    /// still run, so one misbehaving listener cannot starve the others.
    pub fn emit(&self, event: &TransportEvent) {
        let handlers: Vec<EventHandler> = {
            let inner = self.inner.lock().unwrap();
            inner
                .listeners
                .get(&event.kind())
                .map(|entries| entries.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(event);
            }));
        }
    }

    /// Returns the number of listeners registered for the given kind.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.listeners.get(&kind).map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        let counts: HashMap<&'static str, usize> = inner
            .listeners
            .iter()
            .map(|(kind, entries)| (kind.as_str(), entries.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}
