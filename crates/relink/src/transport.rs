//! The transport capability the client drives, and the listener bindings it
//! keeps for each connection.

use crate::config::Endpoint;
use crate::error::TransportError;
use crate::event::{EventKind, ListenerId, Payload};

/// An underlying bidirectional message channel.
///
/// Implementations deliver notifications for a handle as
/// [`ClientEvent::Transport`](crate::event::ClientEvent::Transport) values,
/// tagged with the listener subscribed for that event kind. Notifications of a
/// kind with no subscribed listener are discarded by the transport.
pub trait Transport {
    /// Handle to one connection.
    type Handle;

    /// Begin connecting to `endpoint`. Completion or failure is reported
    /// later through the open, error and close notifications.
    fn open(&mut self, endpoint: &Endpoint) -> Self::Handle;

    /// Route notifications of `kind` on `handle` to `listener`.
    fn subscribe(&mut self, handle: &Self::Handle, kind: EventKind, listener: ListenerId);

    /// Stop routing notifications to `listener`.
    fn unsubscribe(&mut self, handle: &Self::Handle, listener: ListenerId);

    /// Queue a payload on an open connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection can no longer accept payloads.
    fn send(&mut self, handle: &Self::Handle, payload: Payload) -> Result<(), TransportError>;

    /// Close the connection and release the handle.
    fn close(&mut self, handle: Self::Handle);
}

/// The listener registrations made for one connection.
///
/// Detaching them is the teardown step that must run before the connection
/// is closed or replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    entries: [(EventKind, ListenerId); 4],
}

impl Bindings {
    /// Subscribe one listener per [`EventKind`] on `handle`, drawing ids from
    /// `next_id`.
    pub fn attach<T: Transport>(
        transport: &mut T,
        handle: &T::Handle,
        mut next_id: impl FnMut() -> ListenerId,
    ) -> Self {
        let entries = EventKind::ALL.map(|kind| (kind, next_id()));
        for (kind, listener) in entries {
            transport.subscribe(handle, kind, listener);
        }
        Self { entries }
    }

    /// Unsubscribe every listener from `handle`.
    pub fn detach<T: Transport>(self, transport: &mut T, handle: &T::Handle) {
        for (_, listener) in self.entries {
            transport.unsubscribe(handle, listener);
        }
    }

    /// The event kind `listener` was bound for, if it belongs to this set.
    #[must_use]
    pub fn kind_of(&self, listener: ListenerId) -> Option<EventKind> {
        self.entries
            .iter()
            .find(|(_, id)| *id == listener)
            .map(|(kind, _)| *kind)
    }

    /// The listener bound for `kind`.
    #[must_use]
    pub fn listener_for(&self, kind: EventKind) -> ListenerId {
        let index = match kind {
            EventKind::Open => 0,
            EventKind::Message => 1,
            EventKind::Error => 2,
            EventKind::Close => 3,
        };
        self.entries[index].1
    }
}
