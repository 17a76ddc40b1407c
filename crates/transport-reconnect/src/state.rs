//! Connection state tracking for the reconnection controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Connection state as observed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no retry loop in flight.
    Idle,

    /// Connected; set only between a successful (re)connect and the next close.
    Connected,

    /// A caller-initiated close is in progress.
    Closing,

    /// A retry loop is in flight.
    Reconnecting,
}

/// Shared controller state.
///
/// Cloned handles observe the same underlying state; the controller, its
/// timer tasks, and callers holding the wrapper all read through this.
#[derive(Clone)]
pub struct ReconnectState {
    /// Current connection state
    state: Arc<AtomicU8>,

    /// Current retry count; reset to 0 on successful reconnect
    attempt: Arc<AtomicU32>,

    /// Whether an open call is currently awaiting open/error/timeout
    attempt_in_flight: Arc<AtomicBool>,
}

impl ReconnectState {
    /// Creates state for a freshly constructed controller.
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(Self::encode_state(ConnectionState::Idle))),
            attempt: Arc::new(AtomicU32::new(0)),
            attempt_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        Self::decode_state(self.state.load(Ordering::Acquire))
    }

    /// Sets the connection state.
    pub fn set_state(&self, state: ConnectionState) {
        self.state
            .store(Self::encode_state(state), Ordering::Release);
    }

    /// Returns the current attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::Acquire)
    }

    /// Increments and returns the attempt number.
    pub fn increment_attempt(&self) -> u32 {
        self.attempt.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Marks a successful (re)connect: attempt resets to 0.
    pub fn mark_connected(&self) {
        self.set_state(ConnectionState::Connected);
        self.attempt.store(0, Ordering::Release);
    }

    /// Drops `Connected` on delivery of a close event; other states are left
    /// for the branch that follows to resolve.
    pub fn mark_disconnected(&self) {
        let _ = self.state.compare_exchange(
            Self::encode_state(ConnectionState::Connected),
            Self::encode_state(ConnectionState::Idle),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Marks the retry loop as in flight.
    pub fn mark_reconnecting(&self) {
        self.set_state(ConnectionState::Reconnecting);
    }

    /// Marks a caller-initiated close as in progress.
    pub fn mark_closing(&self) {
        self.set_state(ConnectionState::Closing);
    }

    /// Marks the controller idle.
    pub fn mark_idle(&self) {
        self.set_state(ConnectionState::Idle);
    }

    /// Records that an open call is now awaiting open/error/timeout.
    pub fn begin_attempt(&self) {
        self.attempt_in_flight.store(true, Ordering::Release);
    }

    /// Claims the in-flight attempt. Returns `true` for exactly one caller,
    /// so a race between the open listener, the error listener, and the
    /// watchdog resolves each attempt once.
    pub fn finish_attempt(&self) -> bool {
        self.attempt_in_flight.swap(false, Ordering::AcqRel)
    }

    /// Returns whether the controller currently holds a live connection.
    pub fn connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Returns whether a retry loop is in flight.
    pub fn reconnecting(&self) -> bool {
        self.state() == ConnectionState::Reconnecting
    }

    fn encode_state(state: ConnectionState) -> u8 {
        match state {
            ConnectionState::Idle => 0,
            ConnectionState::Connected => 1,
            ConnectionState::Closing => 2,
            ConnectionState::Reconnecting => 3,
        }
    }

    fn decode_state(encoded: u8) -> ConnectionState {
        match encoded {
            1 => ConnectionState::Connected,
            2 => ConnectionState::Closing,
            3 => ConnectionState::Reconnecting,
            _ => ConnectionState::Idle,
        }
    }
}

impl Default for ReconnectState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReconnectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectState")
            .field("state", &self.state())
            .field("attempt", &self.attempt())
            .finish()
    }
}
