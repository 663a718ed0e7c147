//! CLI error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Client configuration or operation failed.
    #[error(transparent)]
    Client(#[from] relink::ClientError),

    /// The client went idle without an open connection.
    #[error("gave up after {attempts} reconnect attempts")]
    GaveUp {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// A wait did not complete in time.
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, &'static str),

    /// Refusing to overwrite an existing file.
    #[error("{0} already exists (use --force to overwrite)")]
    FileExists(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gave_up_display() {
        let err = CliError::GaveUp { attempts: 10 };
        assert_eq!(err.to_string(), "gave up after 10 reconnect attempts");
    }

    #[test]
    fn test_timeout_display() {
        let err = CliError::Timeout(Duration::from_secs(3), "open");
        assert_eq!(err.to_string(), "timed out after 3s waiting for open");
    }

    #[test]
    fn test_file_exists_display() {
        let err = CliError::FileExists(PathBuf::from("relink.toml"));
        assert!(err.to_string().contains("--force"));
    }

    #[test]
    fn test_client_error_is_transparent() {
        let err: CliError = relink::ClientError::NotConnected.into();
        assert_eq!(err.to_string(), "not connected");
    }
}
