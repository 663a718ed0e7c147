//! Recording fakes for the transport and timer capabilities.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::config::Endpoint;
use crate::error::TransportError;
use crate::event::{
    ClientEvent, CloseEvent, ErrorEvent, EventKind, ListenerId, MessageEvent, OpenEvent, Payload,
    TimerId, TransportEvent,
};
use crate::timer::Scheduler;
use crate::transport::Transport;

/// Everything the fake transport has been asked to do.
#[derive(Debug, Default)]
pub struct TransportLog {
    pub opened: Vec<String>,
    pub close_calls: usize,
    pub dropped: usize,
    pub unsubscribe_calls: usize,
    pub sent: Vec<(u64, Payload)>,
    pub fail_sends: bool,
    subscriptions: HashMap<u64, Vec<(EventKind, ListenerId)>>,
}

impl TransportLog {
    /// Number of listeners currently subscribed on a connection.
    pub fn subscribed(&self, conn: u64) -> usize {
        self.subscriptions.get(&conn).map_or(0, Vec::len)
    }

    /// Listener currently subscribed for `kind` on a connection.
    pub fn listener(&self, conn: u64, kind: EventKind) -> Option<ListenerId> {
        self.subscriptions
            .get(&conn)?
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
    }

    /// Handles that have been opened and not yet released.
    pub fn live_connections(&self) -> usize {
        self.opened.len() - self.dropped
    }

    /// Id of the most recently opened connection.
    pub fn last_connection(&self) -> u64 {
        self.opened.len() as u64
    }
}

/// Handle issued by [`FakeTransport`]. Dropping it counts as a release.
#[derive(Debug)]
pub struct FakeHandle {
    id: u64,
    log: Arc<Mutex<TransportLog>>,
}

impl FakeHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.log.lock().dropped += 1;
    }
}

/// In-memory transport that records calls and lets tests emit notifications.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, TransportLog> {
        self.log.lock()
    }

    pub fn fail_sends(&self) {
        self.log.lock().fail_sends = true;
    }

    /// Build the client event the transport would deliver for `event` on
    /// `conn`, or `None` if no listener is subscribed for its kind.
    pub fn emit(&self, conn: u64, event: TransportEvent) -> Option<ClientEvent> {
        let listener = self.log.lock().listener(conn, event.kind())?;
        Some(ClientEvent::Transport { listener, event })
    }

    pub fn emit_open(&self, conn: u64) -> Option<ClientEvent> {
        let endpoint = {
            let log = self.log.lock();
            conn.checked_sub(1)
                .and_then(|index| log.opened.get(index as usize).cloned())
                .unwrap_or_default()
        };
        self.emit(conn, TransportEvent::Open(OpenEvent { endpoint }))
    }

    pub fn emit_message(&self, conn: u64, payload: impl Into<Payload>) -> Option<ClientEvent> {
        self.emit(
            conn,
            TransportEvent::Message(MessageEvent {
                payload: payload.into(),
            }),
        )
    }

    pub fn emit_error(&self, conn: u64, message: &str) -> Option<ClientEvent> {
        self.emit(
            conn,
            TransportEvent::Error(ErrorEvent {
                message: message.to_string(),
            }),
        )
    }

    pub fn emit_close(&self, conn: u64) -> Option<ClientEvent> {
        self.emit(conn, TransportEvent::Close(CloseEvent::abnormal()))
    }
}

impl Transport for FakeTransport {
    type Handle = FakeHandle;

    fn open(&mut self, endpoint: &Endpoint) -> FakeHandle {
        let mut log = self.log.lock();
        log.opened.push(endpoint.to_string());
        FakeHandle {
            id: log.opened.len() as u64,
            log: Arc::clone(&self.log),
        }
    }

    fn subscribe(&mut self, handle: &FakeHandle, kind: EventKind, listener: ListenerId) {
        self.log
            .lock()
            .subscriptions
            .entry(handle.id)
            .or_default()
            .push((kind, listener));
    }

    fn unsubscribe(&mut self, handle: &FakeHandle, listener: ListenerId) {
        let mut log = self.log.lock();
        log.unsubscribe_calls += 1;
        if let Some(entries) = log.subscriptions.get_mut(&handle.id) {
            entries.retain(|(_, id)| *id != listener);
        }
    }

    fn send(&mut self, handle: &FakeHandle, payload: Payload) -> Result<(), TransportError> {
        let mut log = self.log.lock();
        if log.fail_sends {
            return Err(TransportError::new("send refused"));
        }
        log.sent.push((handle.id, payload));
        Ok(())
    }

    fn close(&mut self, handle: FakeHandle) {
        self.log.lock().close_calls += 1;
        drop(handle);
    }
}

/// Everything the fake scheduler has been asked to do.
#[derive(Debug, Default)]
pub struct TimerLog {
    pub scheduled: Vec<(TimerId, Duration)>,
    pub cancelled: Vec<TimerId>,
    pub fired: Vec<TimerId>,
}

impl TimerLog {
    /// Timers scheduled and neither cancelled nor fired.
    pub fn pending(&self) -> Vec<TimerId> {
        self.scheduled
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| !self.cancelled.contains(id) && !self.fired.contains(id))
            .collect()
    }
}

/// Timer handle issued by [`FakeScheduler`].
#[derive(Debug)]
pub struct FakeTimer(pub TimerId);

/// Scheduler with a hand-driven clock.
#[derive(Debug, Clone, Default)]
pub struct FakeScheduler {
    log: Arc<Mutex<TimerLog>>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, TimerLog> {
        self.log.lock()
    }

    /// Fire the most recently scheduled pending timer.
    pub fn fire(&self) -> Option<ClientEvent> {
        let mut log = self.log.lock();
        let id = *log.pending().last()?;
        log.fired.push(id);
        Some(ClientEvent::TimerFired(id))
    }
}

impl Scheduler for FakeScheduler {
    type Timer = FakeTimer;

    fn schedule(&mut self, delay: Duration, id: TimerId) -> FakeTimer {
        self.log.lock().scheduled.push((id, delay));
        FakeTimer(id)
    }

    fn cancel(&mut self, timer: FakeTimer) {
        self.log.lock().cancelled.push(timer.0);
    }
}
