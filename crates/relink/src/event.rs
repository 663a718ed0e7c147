//! Event types flowing from the transport and timer into the client.

use std::fmt;

use tokio::sync::mpsc;

/// Close code used when a connection ends without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close code used when a close frame carried no status.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// Close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// An opaque message payload. The client never parses or frames it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

impl Payload {
    /// Returns the text content if this is a text payload.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Length of the payload in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(data) => data.len(),
        }
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self::Binary(data)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Binary(data) => write!(f, "<{} bytes>", data.len()),
        }
    }
}

/// The connection to the endpoint was established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenEvent {
    /// Endpoint the connection was opened to.
    pub endpoint: String,
}

/// A message arrived on the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    /// The payload exactly as received.
    pub payload: Payload,
}

/// The transport reported a failure. A close normally follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    /// Human-readable description from the transport.
    pub message: String,
}

/// The connection closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    /// RFC 6455 close code.
    pub code: u16,
    /// Close reason sent by the peer, possibly empty.
    pub reason: String,
    /// Whether a close frame was exchanged.
    pub was_clean: bool,
}

impl CloseEvent {
    /// A close without a close frame (dropped connection, failed connect).
    #[must_use]
    pub fn abnormal() -> Self {
        Self {
            code: CLOSE_ABNORMAL,
            reason: String::new(),
            was_clean: false,
        }
    }
}

/// The four notification kinds a transport emits for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Connection established.
    Open,
    /// Message received.
    Message,
    /// Transport error.
    Error,
    /// Connection closed.
    Close,
}

impl EventKind {
    /// All kinds, in the order listeners are attached.
    pub const ALL: [Self; 4] = [Self::Open, Self::Message, Self::Error, Self::Close];
}

/// A notification emitted by a transport for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// See [`OpenEvent`].
    Open(OpenEvent),
    /// See [`MessageEvent`].
    Message(MessageEvent),
    /// See [`ErrorEvent`].
    Error(ErrorEvent),
    /// See [`CloseEvent`].
    Close(CloseEvent),
}

impl TransportEvent {
    /// The kind of this notification.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Open(_) => EventKind::Open,
            Self::Message(_) => EventKind::Message,
            Self::Error(_) => EventKind::Error,
            Self::Close(_) => EventKind::Close,
        }
    }
}

/// Identifies one listener registration on a transport handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Identifies one scheduled reconnect timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Everything the client reacts to, delivered one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A transport notification delivered to a subscribed listener.
    Transport {
        /// The listener the transport delivered to.
        listener: ListenerId,
        /// The notification.
        event: TransportEvent,
    },
    /// A scheduled reconnect timer elapsed.
    TimerFired(TimerId),
}

/// Sending half of the event queue shared by transports and timers.
pub type EventSender = mpsc::UnboundedSender<ClientEvent>;

/// Receiving half of the event queue, drained by the driver.
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

/// Create the event queue connecting capabilities to a driver.
#[must_use]
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_text_accessors() {
        let payload = Payload::from("ping");
        assert_eq!(payload.as_text(), Some("ping"));
        assert_eq!(payload.len(), 4);
        assert!(!payload.is_empty());
        assert_eq!(payload.to_string(), "ping");
    }

    #[test]
    fn test_payload_binary_accessors() {
        let payload = Payload::from(vec![1u8, 2, 3]);
        assert_eq!(payload.as_text(), None);
        assert_eq!(payload.len(), 3);
        assert_eq!(payload.to_string(), "<3 bytes>");
    }

    #[test]
    fn test_abnormal_close() {
        let close = CloseEvent::abnormal();
        assert_eq!(close.code, CLOSE_ABNORMAL);
        assert!(!close.was_clean);
        assert!(close.reason.is_empty());
    }

    #[test]
    fn test_transport_event_kind() {
        let open = TransportEvent::Open(OpenEvent {
            endpoint: "ws://localhost:8081".to_string(),
        });
        assert_eq!(open.kind(), EventKind::Open);

        let message = TransportEvent::Message(MessageEvent {
            payload: Payload::from("hi"),
        });
        assert_eq!(message.kind(), EventKind::Message);

        let error = TransportEvent::Error(ErrorEvent {
            message: "boom".to_string(),
        });
        assert_eq!(error.kind(), EventKind::Error);

        let close = TransportEvent::Close(CloseEvent::abnormal());
        assert_eq!(close.kind(), EventKind::Close);
    }

    #[test]
    fn test_event_kind_all_is_complete() {
        assert_eq!(EventKind::ALL.len(), 4);
        assert_eq!(EventKind::ALL[0], EventKind::Open);
        assert_eq!(EventKind::ALL[3], EventKind::Close);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ListenerId(7).to_string(), "listener-7");
        assert_eq!(TimerId(3).to_string(), "timer-3");
    }

    #[tokio::test]
    async fn test_event_channel_delivers_in_order() {
        let (tx, mut rx) = event_channel();
        tx.send(ClientEvent::TimerFired(TimerId(1))).expect("send");
        tx.send(ClientEvent::TimerFired(TimerId(2))).expect("send");

        assert_eq!(rx.recv().await, Some(ClientEvent::TimerFired(TimerId(1))));
        assert_eq!(rx.recv().await, Some(ClientEvent::TimerFired(TimerId(2))));
    }
}
