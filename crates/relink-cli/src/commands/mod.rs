//! CLI command implementations.
//!
//! - [`watch`] - Stay connected and print traffic
//! - [`send`] - One-shot send and reply
//! - [`init_config`] - Write a sample settings file

pub mod init_config;
pub mod send;
pub mod watch;

use std::fmt;

use relink::{Handlers, Payload};
use tokio::sync::mpsc;

pub use init_config::InitConfigCommand;
pub use send::SendCommand;
pub use watch::WatchCommand;

/// A client callback, forwarded out of the driver task for printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Connection opened.
    Open(String),
    /// Message received.
    Message(Payload),
    /// Transport error.
    Error(String),
    /// Connection closed.
    Close {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(endpoint) => write!(f, "connected to {endpoint}"),
            Self::Message(payload) => write!(f, "received: {payload}"),
            Self::Error(message) => write!(f, "error: {message}"),
            Self::Close { code, reason } if reason.is_empty() => write!(f, "closed ({code})"),
            Self::Close { code, reason } => write!(f, "closed ({code}: {reason})"),
        }
    }
}

/// Handlers that forward every callback into `tx`.
#[must_use]
pub fn forwarding_handlers(tx: mpsc::UnboundedSender<Notice>) -> Handlers {
    let open = tx.clone();
    let message = tx.clone();
    let error = tx.clone();
    Handlers::new()
        .on_open(move |event| {
            let _ = open.send(Notice::Open(event.endpoint.clone()));
        })
        .on_message(move |event| {
            let _ = message.send(Notice::Message(event.payload.clone()));
        })
        .on_error(move |event| {
            let _ = error.send(Notice::Error(event.message.clone()));
        })
        .on_close(move |event| {
            let _ = tx.send(Notice::Close {
                code: event.code,
                reason: event.reason.clone(),
            });
        })
}
