//! The capability contract a wrapped connection object must satisfy.

use std::sync::Arc;

use crate::events::{EventKind, TransportEvent};

/// A listener attached to a transport's event surface.
pub type EventHandler = Arc<dyn Fn(&TransportEvent) + Send + Sync>;

/// Token identifying a registered listener, returned by [`Transport::on`]
/// and consumed by [`Transport::off`].
///
/// Closures are not comparable, so deregistration goes through this token
/// rather than through the handler itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Builds a token from a raw id. Transports minting their own ids must
    /// keep them unique per event surface.
    pub fn from_raw(raw: u64) -> Self {
        HandlerId(raw)
    }

    /// Returns the raw id.
    pub fn into_raw(self) -> u64 {
        self.0
    }
}

/// The capability set of a long-lived bidirectional connection object.
///
/// All methods take `&self`: implementations are expected to use interior
/// mutability, and the reconnection controller shares the transport with its
/// timer tasks. Lifecycle events are delivered to listeners registered via
/// [`on`](Transport::on); `emit` publishes an event to the transport's own
/// listeners and is also how the controller republishes reconnection events,
/// so consuming code only ever observes the transport.
pub trait Transport: Send + Sync + 'static {
    /// Initiates a (re)connection.
    fn open(&self);

    /// Closes the current connection. A `Close` event is expected to follow.
    fn close(&self);

    /// Registers a listener for the given event kind.
    fn on(&self, kind: EventKind, handler: EventHandler) -> HandlerId;

    /// Removes a previously registered listener. Unknown ids are ignored.
    fn off(&self, kind: EventKind, id: HandlerId);

    /// Publishes an event to this transport's listeners.
    fn emit(&self, event: &TransportEvent);

    /// Whether this transport already carries reconnection behavior.
    ///
    /// Raw transports report `false`; a reconnection wrapper reports `true`
    /// so that installing a second controller fails fast instead of stacking.
    fn supports_reconnect(&self) -> bool {
        false
    }
}
