//! # relink-echo
//!
//! A WebSocket peer for exercising `relink` clients.
//!
//! Every text message is answered with the configured prefix prepended
//! (`"ping"` becomes `"Echo: ping"`). Binary messages get the prefix bytes
//! prepended. Independently of traffic, each connection receives a greeting
//! push once per greeting interval.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use relink_echo::{EchoConfig, EchoServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), relink_echo::ServerError> {
//!     let server = EchoServer::bind(EchoConfig::default()).await?;
//!     let shutdown = server.shutdown_handle();
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         shutdown.shutdown();
//!     });
//!     server.serve().await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod server;

pub use config::{EchoConfig, DEFAULT_BIND_ADDR, DEFAULT_GREETING_INTERVAL, DEFAULT_PREFIX};
pub use error::{ServerError, ServerResult};
pub use server::{EchoServer, ShutdownHandle};
