//! The reconnecting socket client state machine.
//!
//! [`ReconnectingSocketClient`] owns at most one connection and at most one
//! pending reconnect timer. It never blocks: the host feeds it
//! [`ClientEvent`]s one at a time through [`dispatch`](ReconnectingSocketClient::dispatch)
//! and issues [`start`](ReconnectingSocketClient::start) /
//! [`stop`](ReconnectingSocketClient::stop) between them.

use tracing::{debug, info, warn};

use crate::config::{ClientConfig, Endpoint, Handlers};
use crate::error::{ClientError, ClientResult};
use crate::event::{ClientEvent, CloseEvent, ListenerId, Payload, TimerId, TransportEvent};
use crate::state::{ClientPhase, ClientStatus};
use crate::timer::Scheduler;
use crate::transport::{Bindings, Transport};

/// One live connection and the listeners attached to it.
struct Session<H> {
    handle: H,
    bindings: Bindings,
    open: bool,
}

/// A scheduled reconnect.
struct PendingReconnect<Tm> {
    id: TimerId,
    timer: Tm,
}

/// A client that keeps one connection to a fixed endpoint alive, retrying
/// with a fixed delay after each unexpected close.
pub struct ReconnectingSocketClient<T: Transport, S: Scheduler> {
    transport: T,
    scheduler: S,
    config: Option<ClientConfig>,
    session: Option<Session<T::Handle>>,
    pending: Option<PendingReconnect<S::Timer>>,
    reconnect_attempts: u32,
    next_id: u64,
}

impl<T: Transport, S: Scheduler> ReconnectingSocketClient<T, S> {
    /// Create an idle client over the given capabilities.
    #[must_use]
    pub const fn new(transport: T, scheduler: S) -> Self {
        Self {
            transport,
            scheduler,
            config: None,
            session: None,
            pending: None,
            reconnect_attempts: 0,
            next_id: 0,
        }
    }

    /// Begin a new cycle with `config`.
    ///
    /// Any previous cycle is torn down first: the pending timer is cancelled,
    /// listeners are detached and the connection is closed. Calling this
    /// again with a new endpoint or handler set is how configuration changes.
    pub fn start(&mut self, config: ClientConfig) {
        self.teardown();

        info!(
            endpoint = %config.endpoint,
            should_reconnect = config.policy.should_reconnect,
            interval_ms = config.policy.reconnect_interval_ms,
            max_attempts = config.policy.max_reconnect_attempts,
            "starting client"
        );

        self.reconnect_attempts = 0;
        self.config = Some(config);
        self.connect();
    }

    /// Cancel any pending reconnect, detach and close the connection, and
    /// return to idle. Does nothing when already idle.
    pub fn stop(&mut self) {
        if self.teardown() {
            info!("client stopped");
        }
        self.config = None;
        self.reconnect_attempts = 0;
    }

    /// Send a payload on the open connection.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] unless the connection has
    /// reported open, or [`ClientError::Transport`] if the transport refuses
    /// the payload.
    pub fn send(&mut self, payload: impl Into<Payload>) -> ClientResult<()> {
        match self.session.as_ref() {
            Some(session) if session.open => {
                self.transport.send(&session.handle, payload.into())?;
                Ok(())
            }
            _ => Err(ClientError::NotConnected),
        }
    }

    /// React to one transport notification or timer firing.
    pub fn dispatch(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Transport { listener, event } => self.on_transport_event(listener, event),
            ClientEvent::TimerFired(id) => self.on_timer_fired(id),
        }
    }

    /// The current connection handle, if any.
    #[must_use]
    pub fn connection(&self) -> Option<&T::Handle> {
        self.session.as_ref().map(|session| &session.handle)
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> ClientPhase {
        match &self.session {
            Some(session) if session.open => ClientPhase::Open,
            Some(_) => ClientPhase::Connecting,
            None if self.pending.is_some() => ClientPhase::Closed,
            None => ClientPhase::Idle,
        }
    }

    /// Consecutive reconnect attempts since the last successful open.
    #[must_use]
    pub const fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Endpoint of the active cycle.
    #[must_use]
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.config.as_ref().map(|config| &config.endpoint)
    }

    /// Whether a reconnect timer is pending.
    #[must_use]
    pub const fn has_pending_reconnect(&self) -> bool {
        self.pending.is_some()
    }

    /// A snapshot of the client's state.
    #[must_use]
    pub fn status(&self) -> ClientStatus {
        ClientStatus {
            phase: self.phase(),
            reconnect_attempts: self.reconnect_attempts,
            endpoint: self.endpoint().map(ToString::to_string),
            reconnect_pending: self.pending.is_some(),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn handlers(&mut self) -> Option<&mut Handlers> {
        self.config.as_mut().map(|config| &mut config.handlers)
    }

    fn connect(&mut self) {
        self.release_session();

        let Some(config) = self.config.as_ref() else {
            return;
        };

        debug!(
            endpoint = %config.endpoint,
            attempt = self.reconnect_attempts,
            "opening connection"
        );

        let handle = self.transport.open(&config.endpoint);
        let next_id = &mut self.next_id;
        let bindings = Bindings::attach(&mut self.transport, &handle, || {
            *next_id += 1;
            ListenerId(*next_id)
        });

        self.session = Some(Session {
            handle,
            bindings,
            open: false,
        });
    }

    /// Detach listeners and drop the handle without closing it.
    fn release_session(&mut self) {
        if let Some(Session {
            handle, bindings, ..
        }) = self.session.take()
        {
            bindings.detach(&mut self.transport, &handle);
        }
    }

    /// Cancel the timer and close the connection. Returns whether anything
    /// was live.
    fn teardown(&mut self) -> bool {
        let mut was_live = false;

        if let Some(pending) = self.pending.take() {
            debug!(timer = %pending.id, "cancelling pending reconnect");
            self.scheduler.cancel(pending.timer);
            was_live = true;
        }

        if let Some(Session {
            handle, bindings, ..
        }) = self.session.take()
        {
            bindings.detach(&mut self.transport, &handle);
            self.transport.close(handle);
            was_live = true;
        }

        was_live
    }

    fn on_transport_event(&mut self, listener: ListenerId, event: TransportEvent) {
        let bound = self
            .session
            .as_ref()
            .and_then(|session| session.bindings.kind_of(listener));

        if bound != Some(event.kind()) {
            debug!(
                listener = %listener,
                kind = ?event.kind(),
                "dropping event from detached listener"
            );
            return;
        }

        match event {
            TransportEvent::Open(event) => {
                self.reconnect_attempts = 0;
                if let Some(session) = self.session.as_mut() {
                    session.open = true;
                }
                info!(endpoint = %event.endpoint, "connection open");
                if let Some(handlers) = self.handlers() {
                    handlers.open(&event);
                }
            }
            TransportEvent::Message(event) => {
                if let Some(handlers) = self.handlers() {
                    handlers.message(&event);
                }
            }
            TransportEvent::Error(event) => {
                warn!(error = %event.message, "transport error");
                if let Some(handlers) = self.handlers() {
                    handlers.error(&event);
                }
            }
            TransportEvent::Close(event) => self.on_close(&event),
        }
    }

    fn on_close(&mut self, event: &CloseEvent) {
        info!(
            code = event.code,
            reason = %event.reason,
            clean = event.was_clean,
            "connection closed"
        );

        if let Some(handlers) = self.handlers() {
            handlers.close(event);
        }

        self.release_session();

        let Some(policy) = self.config.as_ref().map(|config| config.policy) else {
            return;
        };

        if !policy.allows_attempt(self.reconnect_attempts) {
            if policy.should_reconnect {
                warn!(
                    attempts = self.reconnect_attempts,
                    "reconnect attempts exhausted, client idle"
                );
            } else {
                debug!("reconnect disabled, client idle");
            }
            return;
        }

        if let Some(previous) = self.pending.take() {
            self.scheduler.cancel(previous.timer);
        }

        self.reconnect_attempts += 1;
        let id = TimerId(self.next_id());
        info!(
            attempt = self.reconnect_attempts,
            max_attempts = policy.max_reconnect_attempts,
            delay_ms = policy.reconnect_interval_ms,
            "scheduling reconnect"
        );

        let timer = self.scheduler.schedule(policy.interval(), id);
        self.pending = Some(PendingReconnect { id, timer });
    }

    fn on_timer_fired(&mut self, id: TimerId) {
        match self.pending.as_ref() {
            Some(pending) if pending.id == id => {
                self.pending = None;
                self.connect();
            }
            _ => debug!(timer = %id, "ignoring stale reconnect timer"),
        }
    }
}

impl<T: Transport, S: Scheduler> Drop for ReconnectingSocketClient<T, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<T: Transport, S: Scheduler> std::fmt::Debug for ReconnectingSocketClient<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectingSocketClient")
            .field("endpoint", &self.endpoint().map(Endpoint::as_str))
            .field("phase", &self.phase())
            .field("reconnect_attempts", &self.reconnect_attempts)
            .finish_non_exhaustive()
    }
}
