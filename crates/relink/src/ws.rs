//! WebSocket transport built on tokio-tungstenite.
//!
//! Every [`open`](Transport::open) spawns one task that owns the socket.
//! The task reports notifications into the shared event queue, tagged with
//! whatever listener is subscribed for the kind at the moment of delivery,
//! and takes outbound payloads and the close request over a command channel.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::config::Endpoint;
use crate::error::TransportError;
use crate::event::{
    ClientEvent, CloseEvent, ErrorEvent, EventKind, EventSender, ListenerId, MessageEvent,
    OpenEvent, Payload, TransportEvent, CLOSE_NO_STATUS,
};
use crate::transport::Transport;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Command {
    Send(Payload),
    Close,
}

/// Listener table for one connection.
#[derive(Debug, Default)]
struct Routes {
    listeners: HashMap<EventKind, ListenerId>,
    activate: Option<oneshot::Sender<()>>,
}

/// Handle to one WebSocket connection task.
#[derive(Debug)]
pub struct WsHandle {
    id: u64,
    routes: Arc<Mutex<Routes>>,
    commands: mpsc::UnboundedSender<Command>,
}

impl WsHandle {
    /// Connection number, unique per transport.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for WsHandle {
    fn drop(&mut self) {
        // A task still waiting to dial gives up once its handle is gone.
        self.routes.lock().activate.take();
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Send(payload) => write!(f, "Send({} bytes)", payload.len()),
            Self::Close => f.write_str("Close"),
        }
    }
}

/// [`Transport`] over real WebSocket connections.
///
/// A connection task does not dial until a listener is subscribed for every
/// [`EventKind`], so no notification can race ahead of its listener.
#[derive(Debug, Clone)]
pub struct WsTransport {
    events: EventSender,
    next_conn: u64,
}

impl WsTransport {
    /// Create a transport delivering into `events`.
    #[must_use]
    pub const fn new(events: EventSender) -> Self {
        Self {
            events,
            next_conn: 0,
        }
    }
}

impl Transport for WsTransport {
    type Handle = WsHandle;

    fn open(&mut self, endpoint: &Endpoint) -> WsHandle {
        self.next_conn += 1;
        let id = self.next_conn;

        let (activate_tx, activate_rx) = oneshot::channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let routes = Arc::new(Mutex::new(Routes {
            listeners: HashMap::new(),
            activate: Some(activate_tx),
        }));

        let task = ConnectionTask {
            id,
            endpoint: endpoint.to_string(),
            routes: Arc::clone(&routes),
            events: self.events.clone(),
        };
        tokio::spawn(task.run(activate_rx, command_rx));

        WsHandle {
            id,
            routes,
            commands: command_tx,
        }
    }

    fn subscribe(&mut self, handle: &WsHandle, kind: EventKind, listener: ListenerId) {
        let mut routes = handle.routes.lock();
        routes.listeners.insert(kind, listener);
        if routes.listeners.len() == EventKind::ALL.len() {
            if let Some(activate) = routes.activate.take() {
                let _ = activate.send(());
            }
        }
    }

    fn unsubscribe(&mut self, handle: &WsHandle, listener: ListenerId) {
        handle
            .routes
            .lock()
            .listeners
            .retain(|_, bound| *bound != listener);
    }

    fn send(&mut self, handle: &WsHandle, payload: Payload) -> Result<(), TransportError> {
        handle
            .commands
            .send(Command::Send(payload))
            .map_err(|_| TransportError::new("connection task has exited"))
    }

    fn close(&mut self, handle: WsHandle) {
        if handle.commands.send(Command::Close).is_err() {
            trace!(conn = handle.id, "close requested after connection ended");
        }
    }
}

struct ConnectionTask {
    id: u64,
    endpoint: String,
    routes: Arc<Mutex<Routes>>,
    events: EventSender,
}

impl ConnectionTask {
    async fn run(
        self,
        activate: oneshot::Receiver<()>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        if activate.await.is_err() {
            debug!(conn = self.id, "connection released before activation");
            return;
        }

        let connect = tokio_tungstenite::connect_async(self.endpoint.as_str());
        tokio::pin!(connect);

        let stream = loop {
            tokio::select! {
                result = &mut connect => match result {
                    Ok((stream, _)) => break stream,
                    Err(e) => {
                        self.fail(format!("connect to {} failed: {e}", self.endpoint));
                        return;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Send(_)) => {
                        warn!(conn = self.id, "dropping payload sent before open");
                    }
                    Some(Command::Close) | None => {
                        debug!(conn = self.id, "connection abandoned while connecting");
                        return;
                    }
                },
            }
        };

        debug!(conn = self.id, endpoint = %self.endpoint, "websocket connected");
        self.emit(TransportEvent::Open(OpenEvent {
            endpoint: self.endpoint.clone(),
        }));

        let (write, read) = stream.split();
        self.pump(write, read, &mut commands).await;
    }

    async fn pump(
        &self,
        mut write: SplitSink<WsStream, Message>,
        mut read: SplitStream<WsStream>,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) {
        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.emit_message(Payload::Text(text.to_string()));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        self.emit_message(Payload::Binary(data.to_vec()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame.map_or_else(
                            || (CLOSE_NO_STATUS, String::new()),
                            |frame| (u16::from(frame.code), frame.reason.to_string()),
                        );
                        // Flush the close reply tungstenite queued.
                        let _ = write.close().await;
                        self.emit(TransportEvent::Close(CloseEvent {
                            code,
                            reason,
                            was_clean: true,
                        }));
                        return;
                    }
                    Some(Ok(_)) => {
                        // Ping, pong and raw frames are handled by tungstenite.
                    }
                    Some(Err(e)) => {
                        self.fail(format!("websocket error: {e}"));
                        return;
                    }
                    None => {
                        self.emit(TransportEvent::Close(CloseEvent::abnormal()));
                        return;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Send(payload)) => {
                        let message = match payload {
                            Payload::Text(text) => Message::Text(text.into()),
                            Payload::Binary(data) => Message::Binary(data.into()),
                        };
                        if let Err(e) = write.send(message).await {
                            self.fail(format!("write failed: {e}"));
                            return;
                        }
                    }
                    Some(Command::Close) => {
                        let frame = CloseFrame {
                            code: CloseCode::Normal,
                            reason: "".into(),
                        };
                        if let Err(e) = write.send(Message::Close(Some(frame))).await {
                            debug!(conn = self.id, error = %e, "close frame not delivered");
                        }
                        let _ = write.close().await;
                        return;
                    }
                    None => {
                        let _ = write.close().await;
                        return;
                    }
                },
            }
        }
    }

    fn emit_message(&self, payload: Payload) {
        self.emit(TransportEvent::Message(MessageEvent { payload }));
    }

    /// Report an error followed by an abnormal close.
    fn fail(&self, message: String) {
        debug!(conn = self.id, error = %message, "connection failed");
        self.emit(TransportEvent::Error(ErrorEvent { message }));
        self.emit(TransportEvent::Close(CloseEvent::abnormal()));
    }

    fn emit(&self, event: TransportEvent) {
        let listener = self.routes.lock().listeners.get(&event.kind()).copied();
        let Some(listener) = listener else {
            trace!(conn = self.id, kind = ?event.kind(), "no listener, discarding");
            return;
        };

        if self
            .events
            .send(ClientEvent::Transport { listener, event })
            .is_err()
        {
            trace!(conn = self.id, "event queue closed");
        }
    }
}
