//! Normalized lifecycle and reconnection events.

use std::sync::Arc;
use std::time::Duration;

/// Shared, cloneable error payload carried by error-bearing events.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Identifies an event slot on a transport without carrying a payload.
///
/// Used as the key for listener registration and for the controller's
/// rebind bookkeeping (at most one controller listener per kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The connection was established.
    Open,
    /// The connection was closed.
    Close,
    /// The connection reported an error.
    Error,
    /// An inbound message was delivered.
    Message,
    /// A reconnect attempt is starting.
    Reconnecting,
    /// A reconnect attempt succeeded.
    Reconnect,
    /// A reconnect attempt failed with an error.
    ReconnectError,
    /// The retry budget was exhausted.
    ReconnectFailed,
    /// A reconnect attempt hit the per-attempt timeout.
    ReconnectTimeout,
    /// An error arrived mid-retry with no attempt in flight.
    ConnectError,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 10] = [
        EventKind::Open,
        EventKind::Close,
        EventKind::Error,
        EventKind::Message,
        EventKind::Reconnecting,
        EventKind::Reconnect,
        EventKind::ReconnectError,
        EventKind::ReconnectFailed,
        EventKind::ReconnectTimeout,
        EventKind::ConnectError,
    ];

    /// Returns the wire-style name of this event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Open => "open",
            EventKind::Close => "close",
            EventKind::Error => "error",
            EventKind::Message => "message",
            EventKind::Reconnecting => "reconnecting",
            EventKind::Reconnect => "reconnect",
            EventKind::ReconnectError => "reconnect_error",
            EventKind::ReconnectFailed => "reconnect_failed",
            EventKind::ReconnectTimeout => "reconnect_timeout",
            EventKind::ConnectError => "connect_error",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events flowing over a transport's event surface.
///
/// The first four variants are produced by the transport itself; the rest are
/// republished on the same surface by the reconnection controller, so callers
/// only ever listen on the transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The connection was established.
    Open,
    /// The connection was closed.
    Close {
        /// Short machine-readable cause, e.g. `"transport close"`.
        reason: String,
        /// Optional human-readable detail.
        description: Option<String>,
    },
    /// The connection reported an error.
    Error {
        /// The underlying error.
        error: SharedError,
    },
    /// An inbound message was delivered.
    Message {
        /// Raw message payload.
        payload: Vec<u8>,
    },
    /// A reconnect attempt is starting. Fired before the backoff wait.
    Reconnecting {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// A reconnect attempt succeeded.
    Reconnect {
        /// The attempt number that succeeded.
        attempt: u32,
    },
    /// A reconnect attempt's open call failed; another attempt follows if the
    /// retry budget allows.
    ReconnectError {
        /// The error reported by the failed open.
        error: SharedError,
    },
    /// The retry budget was exhausted; the controller has gone idle.
    ReconnectFailed,
    /// The per-attempt watchdog expired and the attempt was force-closed.
    ReconnectTimeout {
        /// The configured per-attempt timeout.
        timeout: Duration,
    },
    /// A late error arrived while mid-retry with no attempt in flight.
    ConnectError {
        /// The underlying error.
        error: SharedError,
    },
}

impl TransportEvent {
    /// Returns the kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            TransportEvent::Open => EventKind::Open,
            TransportEvent::Close { .. } => EventKind::Close,
            TransportEvent::Error { .. } => EventKind::Error,
            TransportEvent::Message { .. } => EventKind::Message,
            TransportEvent::Reconnecting { .. } => EventKind::Reconnecting,
            TransportEvent::Reconnect { .. } => EventKind::Reconnect,
            TransportEvent::ReconnectError { .. } => EventKind::ReconnectError,
            TransportEvent::ReconnectFailed => EventKind::ReconnectFailed,
            TransportEvent::ReconnectTimeout { .. } => EventKind::ReconnectTimeout,
            TransportEvent::ConnectError { .. } => EventKind::ConnectError,
        }
    }
}
