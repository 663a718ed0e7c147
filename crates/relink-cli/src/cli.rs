//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relink::ClientSettings;

use crate::error::CliError;

/// Endpoint used when neither a flag nor a config file names one.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8081";

/// Self-reconnecting WebSocket client.
#[derive(Parser, Debug, Clone)]
#[command(name = "relink")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Endpoint to connect to. Overrides the config file.
    #[arg(short, long, env = "RELINK_ENDPOINT")]
    pub endpoint: Option<String>,

    /// TOML settings file.
    #[arg(short, long, env = "RELINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not reconnect after the connection closes.
    #[arg(long, env = "RELINK_NO_RECONNECT")]
    pub no_reconnect: bool,

    /// Milliseconds to wait between a close and the next attempt.
    #[arg(long, env = "RELINK_INTERVAL_MS")]
    pub interval_ms: Option<u64>,

    /// Consecutive reconnect attempts allowed since the last open.
    #[arg(long, env = "RELINK_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Stay connected and print every message until interrupted.
    Watch,

    /// Wait for the connection, send one message, print the first reply.
    Send {
        /// Text to send.
        payload: String,

        /// Seconds to wait for the connection and for the reply.
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },

    /// Write a sample settings file.
    InitConfig {
        /// Where to write it.
        #[arg(default_value = "relink.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Resolve client settings: config file first, then flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the result
    /// fails validation.
    pub fn settings(&self) -> Result<ClientSettings, CliError> {
        let mut settings = match &self.config {
            Some(path) => ClientSettings::from_file(path)?,
            None => ClientSettings::new(DEFAULT_ENDPOINT),
        };

        if let Some(endpoint) = &self.endpoint {
            settings.endpoint.clone_from(endpoint);
        }
        if self.no_reconnect {
            settings.reconnect.should_reconnect = false;
        }
        if let Some(interval) = self.interval_ms {
            settings.reconnect.reconnect_interval_ms = interval;
        }
        if let Some(max) = self.max_attempts {
            settings.reconnect.max_reconnect_attempts = max;
        }

        settings.validate()?;
        Ok(settings)
    }
}
