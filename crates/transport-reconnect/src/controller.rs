//! The reconnection controller: a wrapper around a [`Transport`] that drives
//! the retry loop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use transport_reconnect_core::{
    EventHandler, EventKind, HandlerId, SharedError, Transport, TransportEvent,
};

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::config::ReconnectConfig;
use crate::error::InstallError;
use crate::state::{ConnectionState, ReconnectState};

/// Who forced the close currently in flight.
///
/// Recorded before the close is delegated, consumed by the resulting close
/// event. Either initiator suppresses a retry for that close; a close with no
/// recorded initiator came from the transport itself and reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseInitiator {
    /// The caller requested the close.
    User,
    /// The per-attempt watchdog force-closed a hung open.
    Watchdog,
}

/// Backoff and watchdog timer slots.
///
/// At most one of each kind is live; generation counters make a superseded
/// timer inert even if its task already left the sleep before the abort.
#[derive(Default)]
struct Timers {
    backoff: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
    backoff_generation: u64,
    watchdog_generation: u64,
}

struct Core<T: Transport> {
    weak_self: Weak<Core<T>>,
    io: T,
    config: Mutex<ReconnectConfig>,
    state: ReconnectState,
    pending_close: Mutex<Option<CloseInitiator>>,
    timers: Mutex<Timers>,
    /// Event slot -> currently installed controller listener.
    slots: Mutex<HashMap<EventKind, HandlerId>>,
}

/// A [`Transport`] wrapper that reconnects automatically.
///
/// Wraps an underlying transport and is itself a `Transport`: `open`, `on`,
/// `off`, and `emit` delegate to the wrapped instance, while `close` records
/// the caller's intent before delegating so the resulting close event never
/// triggers a retry. Reconnection progress is republished as events on the
/// wrapped transport's own surface (`reconnecting`, `reconnect`,
/// `reconnect_error`, `reconnect_failed`, `reconnect_timeout`,
/// `connect_error`), so consuming code only ever listens on the transport.
///
/// Clones share the same controller. Retry timing is driven by tokio timers,
/// so the wrapper must live inside a tokio runtime.
pub struct ReconnectTransport<T: Transport> {
    core: Arc<Core<T>>,
}

impl<T: Transport> ReconnectTransport<T> {
    /// Installs reconnection behavior on the given transport.
    ///
    /// Fails with [`InstallError::AlreadyInstalled`] if the transport already
    /// reports the reconnect capability, so controllers never stack.
    pub fn wrap(io: T, config: ReconnectConfig) -> Result<Self, InstallError> {
        if io.supports_reconnect() {
            return Err(InstallError::AlreadyInstalled);
        }
        let core = Arc::new_cyclic(|weak| Core {
            weak_self: weak.clone(),
            io,
            config: Mutex::new(config),
            state: ReconnectState::new(),
            pending_close: Mutex::new(None),
            timers: Mutex::new(Timers::default()),
            slots: Mutex::new(HashMap::new()),
        });
        core.bind();
        Ok(Self { core })
    }

    /// Installs reconnection behavior with the default configuration.
    pub fn with_defaults(io: T) -> Result<Self, InstallError> {
        Self::wrap(io, ReconnectConfig::default())
    }

    /// Manually starts a reconnect cycle.
    ///
    /// An explicit restart also recovers from a close that the wrapped
    /// transport never confirmed: any recorded close intent is discarded and
    /// a lingering `Closing` state is released before the cycle begins.
    pub fn reconnect(&self) -> &Self {
        self.core.manual_reconnect();
        self
    }

    /// Returns whether automatic reconnection is enabled.
    pub fn reconnection(&self) -> bool {
        self.core.config.lock().unwrap().reconnection
    }

    /// Enables or disables automatic reconnection.
    pub fn set_reconnection(&self, reconnection: bool) -> &Self {
        self.core.config.lock().unwrap().reconnection = reconnection;
        self
    }

    /// Returns the maximum number of reconnect attempts, if bounded.
    pub fn reconnection_attempts(&self) -> Option<u32> {
        self.core.config.lock().unwrap().max_attempts
    }

    /// Sets the maximum number of reconnect attempts; `None` means unlimited.
    pub fn set_reconnection_attempts(&self, attempts: Option<u32>) -> &Self {
        self.core.config.lock().unwrap().max_attempts = attempts;
        self
    }

    /// Returns the base delay between attempts.
    pub fn reconnection_delay(&self) -> Duration {
        self.core.config.lock().unwrap().delay
    }

    /// Sets the base delay between attempts.
    pub fn set_reconnection_delay(&self, delay: Duration) -> &Self {
        self.core.config.lock().unwrap().delay = delay;
        self
    }

    /// Returns the cap on the computed backoff delay.
    pub fn reconnection_delay_max(&self) -> Duration {
        self.core.config.lock().unwrap().delay_max
    }

    /// Sets the cap on the computed backoff delay.
    pub fn set_reconnection_delay_max(&self, delay_max: Duration) -> &Self {
        self.core.config.lock().unwrap().delay_max = delay_max;
        self
    }

    /// Returns the per-attempt connect timeout, if enabled.
    pub fn reconnection_timeout(&self) -> Option<Duration> {
        self.core.config.lock().unwrap().timeout
    }

    /// Sets the per-attempt connect timeout; `None` disables the watchdog.
    pub fn set_reconnection_timeout(&self, timeout: Option<Duration>) -> &Self {
        self.core.config.lock().unwrap().timeout = timeout;
        self
    }

    /// Returns a snapshot of the current configuration.
    pub fn config(&self) -> ReconnectConfig {
        self.core.config.lock().unwrap().clone()
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.core.state.state()
    }

    /// Returns the current attempt number.
    ///
    /// Resets to 0 only on a successful reconnect. An exhausted retry bound
    /// or a watchdog timeout leaves the count in place, so a later transport
    /// close resumes counting from it rather than starting over.
    pub fn attempts(&self) -> u32 {
        self.core.state.attempt()
    }

    /// Returns whether the controller currently holds a live connection.
    pub fn connected(&self) -> bool {
        self.core.state.connected()
    }

    /// Returns whether a retry loop is in flight.
    pub fn reconnecting(&self) -> bool {
        self.core.state.reconnecting()
    }

    /// Returns a reference to the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.core.io
    }
}

impl<T: Transport> Transport for ReconnectTransport<T> {
    fn open(&self) {
        self.core.io.open();
    }

    fn close(&self) {
        self.core.close();
    }

    fn on(&self, kind: EventKind, handler: EventHandler) -> HandlerId {
        self.core.io.on(kind, handler)
    }

    fn off(&self, kind: EventKind, id: HandlerId) {
        self.core.io.off(kind, id);
    }

    fn emit(&self, event: &TransportEvent) {
        self.core.io.emit(event);
    }

    fn supports_reconnect(&self) -> bool {
        true
    }
}

impl<T: Transport> Clone for ReconnectTransport<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T: Transport> std::fmt::Debug for ReconnectTransport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectTransport")
            .field("state", &self.core.state)
            .field("config", &*self.core.config.lock().unwrap())
            .finish()
    }
}

impl<T: Transport> Core<T> {
    /// Upgrades the self-reference for handlers and timer tasks.
    fn weak(&self) -> Weak<Core<T>> {
        self.weak_self.clone()
    }

    /// Installs the controller's close listener on the wrapped transport.
    fn bind(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("binding reconnect close listener");

        let weak = self.weak();
        self.rebind(
            EventKind::Close,
            Arc::new(move |event| {
                if let Some(core) = weak.upgrade() {
                    if matches!(event, TransportEvent::Close { .. }) {
                        core.on_close();
                    }
                }
            }),
        );
    }

    /// Replaces the controller's listener for an event slot.
    ///
    /// Unregisters whatever listener is currently recorded for the slot
    /// before registering the new one, so repeated attempts never stack
    /// listeners on the wrapped transport.
    fn rebind(&self, kind: EventKind, handler: EventHandler) {
        let previous = self.slots.lock().unwrap().remove(&kind);
        if let Some(previous) = previous {
            self.io.off(kind, previous);
        }
        let id = self.io.on(kind, handler);
        self.slots.lock().unwrap().insert(kind, id);
    }

    /// Caller-initiated close: record intent, cancel timers, delegate.
    fn close(&self) {
        self.state.mark_closing();
        *self.pending_close.lock().unwrap() = Some(CloseInitiator::User);
        self.clear_timers();
        self.io.close();
    }

    /// Delivery of the transport's close event.
    fn on_close(&self) {
        self.state.mark_disconnected();
        let initiator = self.pending_close.lock().unwrap().take();
        let reconnection = self.config.lock().unwrap().reconnection;
        if initiator.is_none() && reconnection {
            self.reconnect();
        } else {
            self.clear_timers();
            self.state.mark_idle();
        }
    }

    /// Caller-requested restart. Discards any stale close intent first, so a
    /// close the transport never confirmed cannot wedge the controller in
    /// `Closing` or swallow the next genuine transport close.
    fn manual_reconnect(&self) {
        *self.pending_close.lock().unwrap() = None;
        if self.state.state() == ConnectionState::Closing {
            self.state.mark_idle();
        }
        self.reconnect();
    }

    /// One cycle of the retry loop: count the attempt, report it, and either
    /// give up or schedule the backoff wait.
    fn reconnect(&self) {
        if self.state.state() == ConnectionState::Closing {
            // A caller-initiated close is in flight; no retry may be scheduled.
            return;
        }
        self.clear_timers();

        let attempt = self.state.increment_attempt();
        let (max_attempts, backoff) = {
            let config = self.config.lock().unwrap();
            (config.max_attempts, config.backoff())
        };

        if let Some(max) = max_attempts {
            if attempt > max {
                #[cfg(feature = "tracing")]
                tracing::info!(attempt, max, "reconnect attempts exhausted");
                #[cfg(feature = "metrics")]
                counter!("transport_reconnect_failures_total").increment(1);

                self.state.mark_idle();
                self.io.emit(&TransportEvent::ReconnectFailed);
                return;
            }
        }

        self.state.mark_reconnecting();
        self.io.emit(&TransportEvent::Reconnecting { attempt });
        #[cfg(feature = "metrics")]
        counter!("transport_reconnect_attempts_total").increment(1);

        let delay = backoff.delay_for_attempt(attempt);
        #[cfg(feature = "tracing")]
        tracing::debug!(?delay, attempt, "waiting before reconnect attempt");
        self.schedule_backoff(delay);
    }

    /// The backoff wait has elapsed: open the transport and watch the outcome.
    fn begin_attempt(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("attempting reconnect");

        let weak = self.weak();
        self.rebind(
            EventKind::Open,
            Arc::new(move |event| {
                if let Some(core) = weak.upgrade() {
                    if matches!(event, TransportEvent::Open) {
                        core.on_attempt_open();
                    }
                }
            }),
        );
        let weak = self.weak();
        self.rebind(
            EventKind::Error,
            Arc::new(move |event| {
                if let Some(core) = weak.upgrade() {
                    if let TransportEvent::Error { error } = event {
                        core.on_attempt_error(error.clone());
                    }
                }
            }),
        );

        self.state.begin_attempt();
        let timeout = self.config.lock().unwrap().timeout;
        if let Some(timeout) = timeout {
            #[cfg(feature = "tracing")]
            tracing::debug!(?timeout, "connect attempt will time out");
            self.schedule_watchdog(timeout);
        }
        self.io.open();
    }

    /// The attempt's open call succeeded.
    fn on_attempt_open(&self) {
        if !self.state.finish_attempt() {
            return;
        }
        self.cancel_watchdog();

        let attempt = self.state.attempt();
        self.state.mark_connected();

        #[cfg(feature = "tracing")]
        tracing::info!(attempt, "reconnect success");
        #[cfg(feature = "metrics")]
        counter!("transport_reconnect_success_total").increment(1);

        self.io.emit(&TransportEvent::Reconnect { attempt });
    }

    /// The attempt's open call failed, or a late error arrived mid-retry.
    fn on_attempt_error(&self, error: SharedError) {
        if self.state.finish_attempt() {
            self.cancel_watchdog();

            #[cfg(feature = "tracing")]
            tracing::debug!("reconnect attempt error");

            self.io.emit(&TransportEvent::ReconnectError { error });
            self.reconnect();
        } else if self.state.reconnecting() {
            // Late error from a superseded attempt; report, don't count.
            self.io.emit(&TransportEvent::ConnectError { error });
        }
    }

    /// The per-attempt watchdog expired before open or error resolved.
    fn watchdog_fired(&self, generation: u64, timeout: Duration) {
        {
            let mut timers = self.timers.lock().unwrap();
            if timers.watchdog_generation != generation {
                return;
            }
            timers.watchdog = None;
        }
        if !self.state.finish_attempt() {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(?timeout, "connect attempt timed out");

        *self.pending_close.lock().unwrap() = Some(CloseInitiator::Watchdog);
        self.io.close();
        self.clear_timers();
        self.io.emit(&TransportEvent::ReconnectTimeout { timeout });
    }

    fn schedule_backoff(&self, delay: Duration) {
        let generation = {
            let mut timers = self.timers.lock().unwrap();
            if let Some(handle) = timers.backoff.take() {
                handle.abort();
            }
            timers.backoff_generation += 1;
            timers.backoff_generation
        };
        let weak = self.weak();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(core) = weak.upgrade() {
                core.backoff_elapsed(generation);
            }
        });
        self.timers.lock().unwrap().backoff = Some(handle);
    }

    fn backoff_elapsed(&self, generation: u64) {
        {
            let mut timers = self.timers.lock().unwrap();
            if timers.backoff_generation != generation {
                return;
            }
            timers.backoff = None;
        }
        self.begin_attempt();
    }

    fn schedule_watchdog(&self, timeout: Duration) {
        let generation = {
            let mut timers = self.timers.lock().unwrap();
            if let Some(handle) = timers.watchdog.take() {
                handle.abort();
            }
            timers.watchdog_generation += 1;
            timers.watchdog_generation
        };
        let weak = self.weak();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(core) = weak.upgrade() {
                core.watchdog_fired(generation, timeout);
            }
        });
        self.timers.lock().unwrap().watchdog = Some(handle);
    }

    fn cancel_watchdog(&self) {
        let mut timers = self.timers.lock().unwrap();
        timers.watchdog_generation += 1;
        if let Some(handle) = timers.watchdog.take() {
            handle.abort();
        }
    }

    /// Cancels every timer. Entering idle, an intentional close, and the
    /// start of a fresh cycle all come through here.
    fn clear_timers(&self) {
        let mut timers = self.timers.lock().unwrap();
        timers.backoff_generation += 1;
        timers.watchdog_generation += 1;
        if let Some(handle) = timers.backoff.take() {
            handle.abort();
        }
        if let Some(handle) = timers.watchdog.take() {
            handle.abort();
        }
    }
}

impl<T: Transport> Drop for Core<T> {
    fn drop(&mut self) {
        self.clear_timers();
    }
}
