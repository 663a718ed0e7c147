//! # relink
//!
//! A self-reconnecting persistent WebSocket client.
//!
//! The client keeps one connection to a fixed endpoint. When the connection
//! closes it waits a fixed interval and dials again, up to a bounded number
//! of consecutive attempts. A successful open resets the count. Stopping or
//! restarting the client detaches every listener before the old connection
//! is closed, so no stale notification reaches the new cycle.
//!
//! ## Architecture
//!
//! ```text
//!   ClientHandle ──commands──►┌──────────────┐
//!                             │ ClientDriver │──status──► watch
//!   WsTransport ──events─────►│  (one task)  │
//!   TokioScheduler ──events──►└──────┬───────┘
//!                                    │ dispatch / start / stop / send
//!                         ┌──────────▼──────────────┐
//!                         │ ReconnectingSocketClient│
//!                         └─────────────────────────┘
//! ```
//!
//! [`ReconnectingSocketClient`] is a plain state machine over two injected
//! capabilities, a [`Transport`] and a [`Scheduler`], so its reconnect
//! behavior is testable without sockets or wall-clock time.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use relink::{spawn_ws_client, ClientConfig, Endpoint};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), relink::ClientError> {
//!     let endpoint = Endpoint::parse("ws://127.0.0.1:8081")?;
//!     let config = ClientConfig::new(endpoint)
//!         .on_open(|_| println!("connected"))
//!         .on_message(|event| println!("received: {}", event.payload))
//!         .on_close(|event| println!("closed ({})", event.code));
//!
//!     let (client, _task) = spawn_ws_client();
//!     client.start(config).await?;
//!     client.wait_for(|status| status.is_open()).await?;
//!     client.send("ping").await?;
//!     client.shutdown().await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod runtime;
pub mod state;
pub mod timer;
pub mod transport;
pub mod ws;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ReconnectingSocketClient;
pub use config::{
    ClientConfig, ClientSettings, Endpoint, Handlers, ReconnectPolicy,
    DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL_MS,
};
pub use error::{ClientError, ClientResult, TransportError};
pub use event::{
    event_channel, ClientEvent, CloseEvent, ErrorEvent, EventKind, ListenerId, MessageEvent,
    OpenEvent, Payload, TimerId, TransportEvent,
};
pub use runtime::{spawn_client, spawn_ws_client, ClientDriver, ClientHandle};
pub use state::{ClientPhase, ClientStatus};
pub use timer::{Scheduler, TokioScheduler};
pub use transport::{Bindings, Transport};
pub use ws::WsTransport;
