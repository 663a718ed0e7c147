//! Echo server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8081";

/// Default prefix prepended to echoed messages.
pub const DEFAULT_PREFIX: &str = "Echo: ";

/// Default period between unsolicited greeting pushes.
pub const DEFAULT_GREETING_INTERVAL: Duration = Duration::from_millis(5000);

/// Configuration for the echo server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoConfig {
    /// Address to listen on. Port 0 picks a free port.
    pub bind_addr: SocketAddr,
    /// Prefix prepended to every echoed message.
    pub prefix: String,
    /// Greeting pushed periodically. `None` uses the default greeting
    /// naming the bound address.
    pub greeting: Option<String>,
    /// Period between greeting pushes. The first push comes one full period
    /// after the connection is accepted.
    pub greeting_interval: Duration,
}

impl EchoConfig {
    /// Create a configuration listening on `bind_addr` with default settings.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            prefix: DEFAULT_PREFIX.to_string(),
            greeting: None,
            greeting_interval: DEFAULT_GREETING_INTERVAL,
        }
    }

    /// Set the echo prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set a fixed greeting.
    #[must_use]
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Set the greeting period.
    #[must_use]
    pub const fn with_greeting_interval(mut self, interval: Duration) -> Self {
        self.greeting_interval = interval;
        self
    }

    /// The greeting text for a server bound to `local_addr`.
    #[must_use]
    pub fn greeting_for(&self, local_addr: SocketAddr) -> String {
        self.greeting
            .clone()
            .unwrap_or_else(|| format!("Welcome to the WebSocket {local_addr}!"))
    }
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8081)))
    }
}
