//! Core infrastructure for transport-reconnect.
//!
//! This crate defines the contract between a reconnection controller and the
//! connection object it wraps:
//!
//! - [`Transport`]: the capability set a long-lived socket abstraction must
//!   provide (`open`, `close`, `on`, `off`, `emit`)
//! - [`TransportEvent`] / [`EventKind`]: the normalized lifecycle and
//!   reconnection event surface
//! - [`EventBus`]: a reusable listener registry concrete transports can embed
//!   to satisfy the `on`/`off`/`emit` half of the contract

mod bus;
mod events;
mod transport;

pub use bus::EventBus;
pub use events::{EventKind, SharedError, TransportEvent};
pub use transport::{EventHandler, HandlerId, Transport};
