//! Echo server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::EchoConfig;
use crate::error::{ServerError, ServerResult};

/// Stops a running [`EchoServer`] and every session it accepted.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Trigger shutdown. Idempotent.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Whether shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Per-session settings shared by every connection.
#[derive(Debug)]
struct SessionConfig {
    prefix: String,
    greeting: String,
    greeting_interval: std::time::Duration,
}

/// A WebSocket server that echoes messages and pushes a periodic greeting.
#[derive(Debug)]
pub struct EchoServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    session: Arc<SessionConfig>,
    shutdown: ShutdownHandle,
}

impl EchoServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidConfig`] if the greeting interval is
    /// zero, or [`ServerError::BindFailed`] if the address cannot be bound.
    pub async fn bind(config: EchoConfig) -> ServerResult<Self> {
        if config.greeting_interval.is_zero() {
            return Err(ServerError::InvalidConfig(
                "greeting interval must be non-zero".to_string(),
            ));
        }

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|e| ServerError::BindFailed(config.bind_addr, e))?;
        let local_addr = listener.local_addr()?;

        let session = Arc::new(SessionConfig {
            greeting: config.greeting_for(local_addr),
            prefix: config.prefix,
            greeting_interval: config.greeting_interval,
        });
        let (tx, _) = watch::channel(false);

        Ok(Self {
            listener,
            local_addr,
            session,
            shutdown: ShutdownHandle { tx: Arc::new(tx) },
        })
    }

    /// The address the server is listening on.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A handle that stops the server.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accept connections until shutdown.
    ///
    /// # Errors
    ///
    /// Accept failures are logged and skipped, so this currently always
    /// returns `Ok` once shutdown is triggered.
    pub async fn serve(self) -> ServerResult<()> {
        let mut stop = self.shutdown.tx.subscribe();
        info!(addr = %self.local_addr, "echo server listening");

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_session(stream, peer),
                    Err(e) => warn!(error = %e, "failed to accept connection"),
                },
                _ = stop.changed() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        info!(addr = %self.local_addr, "echo server stopped");
        Ok(())
    }

    fn spawn_session(&self, stream: TcpStream, peer: SocketAddr) {
        debug!(peer = %peer, "new connection");

        let session = Arc::clone(&self.session);
        let stop = self.shutdown.tx.subscribe();

        tokio::spawn(async move {
            let ws = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "websocket handshake failed");
                    return;
                }
            };

            info!(peer = %peer, "client connected");
            match run_session(ws, &session, stop).await {
                Ok(()) => info!(peer = %peer, "client disconnected"),
                Err(e) => debug!(peer = %peer, error = %e, "session ended with error"),
            }
        });
    }
}

async fn run_session(
    ws: WebSocketStream<TcpStream>,
    session: &SessionConfig,
    mut stop: watch::Receiver<bool>,
) -> ServerResult<()> {
    let (mut write, mut read) = ws.split();

    let period = session.greeting_interval;
    let mut greeting = interval_at(Instant::now() + period, period);
    greeting.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    debug!(message = %text, "received");
                    let reply = format!("{}{}", session.prefix, text);
                    write.send(Message::Text(reply.into())).await?;
                }
                Some(Ok(Message::Binary(data))) => {
                    let mut reply = session.prefix.as_bytes().to_vec();
                    reply.extend_from_slice(&data);
                    write.send(Message::Binary(reply.into())).await?;
                }
                Some(Ok(Message::Close(_))) | None => {
                    let _ = write.close().await;
                    return Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
            _ = greeting.tick() => {
                write.send(Message::Text(session.greeting.clone().into())).await?;
            }
            _ = stop.changed() => {
                let frame = CloseFrame {
                    code: CloseCode::Away,
                    reason: "server shutting down".into(),
                };
                let _ = write.send(Message::Close(Some(frame))).await;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use tokio_tungstenite::connect_async;

    async fn start(config: EchoConfig) -> (SocketAddr, ShutdownHandle, JoinHandle<ServerResult<()>>) {
        let server = EchoServer::bind(config).await.expect("bind");
        let addr = server.local_addr();
        let shutdown = server.shutdown_handle();
        let task = tokio::spawn(server.serve());
        (addr, shutdown, task)
    }

    fn local_config() -> EchoConfig {
        EchoConfig::new(SocketAddr::from(([127, 0, 0, 1], 0)))
    }

    async fn next_message<S>(read: &mut S) -> Message
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        tokio::time::timeout(Duration::from_secs(5), read.next())
            .await
            .expect("timed out")
            .expect("stream ended")
            .expect("read error")
    }

    #[tokio::test]
    async fn test_bind_port_zero_reports_real_port() {
        let server = EchoServer::bind(local_config()).await.expect("bind");
        assert_ne!(server.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_in_use_fails() {
        let first = EchoServer::bind(local_config()).await.expect("bind");
        let err = EchoServer::bind(EchoConfig::new(first.local_addr()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::BindFailed(..)));
    }

    #[tokio::test]
    async fn test_bind_rejects_zero_greeting_interval() {
        let config = local_config().with_greeting_interval(Duration::ZERO);
        let err = EchoServer::bind(config).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_text_is_echoed_with_prefix() {
        let (addr, shutdown, _task) = start(local_config()).await;
        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.expect("connect");

        ws.send(Message::Text("ping".into())).await.expect("send");

        let reply = next_message(&mut ws).await;
        assert_eq!(reply, Message::Text("Echo: ping".into()));
        shutdown.shutdown();
    }

    #[tokio::test]
    async fn test_binary_is_echoed_with_prefix_bytes() {
        let (addr, shutdown, _task) = start(local_config().with_prefix("> ")).await;
        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.expect("connect");

        ws.send(Message::Binary(vec![1u8, 2].into())).await.expect("send");

        let reply = next_message(&mut ws).await;
        assert_eq!(reply, Message::Binary(vec![b'>', b' ', 1, 2].into()));
        shutdown.shutdown();
    }

    #[tokio::test]
    async fn test_greeting_is_pushed_periodically() {
        let config = local_config().with_greeting_interval(Duration::from_millis(50));
        let (addr, shutdown, _task) = start(config).await;
        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.expect("connect");

        let expected = format!("Welcome to the WebSocket {addr}!");
        for _ in 0..2 {
            let push = next_message(&mut ws).await;
            assert_eq!(push, Message::Text(expected.clone().into()));
        }
        shutdown.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_serve_and_closes_sessions() {
        let (addr, shutdown, task) = start(local_config()).await;
        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.expect("connect");

        shutdown.shutdown();
        assert!(shutdown.is_shutdown());

        match next_message(&mut ws).await {
            Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Away),
            other => panic!("expected close frame, got {other:?}"),
        }

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("serve should return")
            .expect("task should not panic")
            .expect("serve should succeed");
        assert!(connect_async(format!("ws://{addr}")).await.is_err());
    }
}
