//! Automatic reconnection for event-driven transports.
//!
//! This crate wraps a long-lived connection object (anything implementing the
//! [`Transport`] capability set) and drives a retry loop when the connection
//! drops:
//!
//! - **Linear backoff**: attempt `k` waits `k × delay`, capped at `delay_max`
//! - **Per-attempt timeouts**: a watchdog force-closes a hung open and
//!   reports `reconnect_timeout`
//! - **Intentional-close suppression**: a caller-initiated `close` never
//!   triggers a retry
//! - **Idempotent listener rebinding**: repeated attempts replace the
//!   controller's listeners instead of stacking them
//!
//! Reconnection progress is republished on the wrapped transport's own event
//! surface, so consuming code only ever listens on the transport. Per attempt
//! the order is `reconnecting` then either `reconnect`, or
//! `reconnect_error`/`reconnect_timeout`; a bounded retry budget ends with a
//! single `reconnect_failed`.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use transport_reconnect::ReconnectConfig;
//!
//! let config = ReconnectConfig::builder()
//!     .max_attempts(10)
//!     .delay(Duration::from_millis(500))
//!     .delay_max(Duration::from_secs(5))
//!     .timeout(Duration::from_secs(10))
//!     .build();
//! ```
//!
//! Wrapping a transport (any [`Transport`] implementation):
//!
//! ```rust,ignore
//! use transport_reconnect::{ReconnectConfig, ReconnectTransport};
//! use transport_reconnect_core::EventKind;
//!
//! let transport = ReconnectTransport::wrap(socket, ReconnectConfig::default())?;
//! transport.on(EventKind::Reconnect, std::sync::Arc::new(|event| {
//!     println!("back online: {event:?}");
//! }));
//! ```

mod config;
mod controller;
mod error;
mod policy;
mod state;

pub use config::{ReconnectConfig, ReconnectConfigBuilder};
pub use controller::ReconnectTransport;
pub use error::InstallError;
pub use policy::Backoff;
pub use state::{ConnectionState, ReconnectState};

// Re-export the collaborator contract for convenience
pub use transport_reconnect_core::{
    EventBus, EventHandler, EventKind, HandlerId, SharedError, Transport, TransportEvent,
};
