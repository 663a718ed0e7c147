//! Error types for the relink client.

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::transport::Transport) when a
/// payload cannot be handed to the underlying connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    /// Create a transport error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors that can occur when configuring or driving a client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint is not a usable WebSocket URL.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The rejected endpoint string.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The client has no open connection to send on.
    #[error("not connected")]
    NotConnected,

    /// The transport refused the payload.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The driver task owning the client has exited.
    #[error("client driver has shut down")]
    Shutdown,
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
