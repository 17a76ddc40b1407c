//! A controllable transport double.
//!
//! Open outcomes are scripted per call; lifecycle events are delivered
//! synchronously through an embedded [`EventBus`], which matches how the
//! controller is driven in production: every state transition happens on
//! delivery of a timer callback or a transport event.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use transport_reconnect_core::{
    EventBus, EventHandler, EventKind, HandlerId, Transport, TransportEvent,
};

/// What the next `open` call should do.
#[derive(Debug, Clone)]
pub enum OpenOutcome {
    /// Emit `open` synchronously.
    Succeed,
    /// Emit `error` synchronously with the given message.
    Fail(&'static str),
    /// Emit nothing; the attempt hangs until the watchdog intervenes.
    Hang,
}

#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

struct MockInner {
    bus: EventBus,
    script: Mutex<VecDeque<OpenOutcome>>,
    default_outcome: Mutex<OpenOutcome>,
    quiet_close: AtomicBool,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockInner {
                bus: EventBus::new(),
                script: Mutex::new(VecDeque::new()),
                default_outcome: Mutex::new(OpenOutcome::Succeed),
                quiet_close: AtomicBool::new(false),
                opens: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
            }),
        }
    }

    /// Queues outcomes for upcoming `open` calls; once the queue drains, the
    /// default outcome applies.
    pub fn script(&self, outcomes: impl IntoIterator<Item = OpenOutcome>) {
        self.inner.script.lock().unwrap().extend(outcomes);
    }

    /// Sets the outcome used when the script queue is empty.
    pub fn set_default_outcome(&self, outcome: OpenOutcome) {
        *self.inner.default_outcome.lock().unwrap() = outcome;
    }

    /// Makes `close` calls go unconfirmed: the close is counted but no
    /// `close` event follows.
    pub fn set_quiet_close(&self, quiet: bool) {
        self.inner.quiet_close.store(quiet, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.inner.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.bus.listener_count(kind)
    }

    /// Simulates the server side dropping the connection.
    pub fn drop_connection(&self) {
        self.inner.bus.emit(&TransportEvent::Close {
            reason: "transport close".to_string(),
            description: None,
        });
    }

    /// Emits a stray error event outside any open call.
    pub fn emit_error(&self, message: &'static str) {
        self.inner.bus.emit(&TransportEvent::Error {
            error: Arc::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                message,
            )),
        });
    }
}

impl Transport for MockTransport {
    fn open(&self) {
        self.inner.opens.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .inner
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.inner.default_outcome.lock().unwrap().clone());
        match outcome {
            OpenOutcome::Succeed => self.inner.bus.emit(&TransportEvent::Open),
            OpenOutcome::Fail(message) => self.inner.bus.emit(&TransportEvent::Error {
                error: Arc::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    message,
                )),
            }),
            OpenOutcome::Hang => {}
        }
    }

    fn close(&self) {
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
        if self.inner.quiet_close.load(Ordering::SeqCst) {
            return;
        }
        self.inner.bus.emit(&TransportEvent::Close {
            reason: "forced close".to_string(),
            description: None,
        });
    }

    fn on(&self, kind: EventKind, handler: EventHandler) -> HandlerId {
        self.inner.bus.on(kind, handler)
    }

    fn off(&self, kind: EventKind, id: HandlerId) {
        self.inner.bus.off(kind, id);
    }

    fn emit(&self, event: &TransportEvent) {
        self.inner.bus.emit(event);
    }
}

/// Records every reconnection-related event in arrival order.
pub fn record_events(transport: &impl Transport) -> Arc<Mutex<Vec<TransportEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        EventKind::Reconnecting,
        EventKind::Reconnect,
        EventKind::ReconnectError,
        EventKind::ReconnectFailed,
        EventKind::ReconnectTimeout,
        EventKind::ConnectError,
    ] {
        let sink = Arc::clone(&log);
        transport.on(
            kind,
            Arc::new(move |event| {
                sink.lock().unwrap().push(event.clone());
            }),
        );
    }
    log
}

/// Collapses a recorded log to its event kinds.
pub fn kinds(log: &Arc<Mutex<Vec<TransportEvent>>>) -> Vec<EventKind> {
    log.lock().unwrap().iter().map(TransportEvent::kind).collect()
}
