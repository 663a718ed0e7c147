//! Client configuration.
//!
//! A [`ClientConfig`] is what [`start`](crate::ReconnectingSocketClient::start)
//! consumes: the endpoint, the event handlers and the [`ReconnectPolicy`].
//! [`ClientSettings`] is the serializable subset loaded from a TOML file.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::event::{CloseEvent, ErrorEvent, MessageEvent, OpenEvent};

/// Default delay between a close and the next connect attempt, in milliseconds.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 3000;

/// Default cap on consecutive reconnect attempts since the last open.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// A validated `ws://` or `wss://` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Parse and validate an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidEndpoint`] if the string is not a URL,
    /// uses a scheme other than `ws`/`wss`, or has no host.
    pub fn parse(endpoint: &str) -> ClientResult<Self> {
        let invalid = |reason: String| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;

        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(invalid(format!(
                "scheme must be ws or wss, got '{}'",
                url.scheme()
            )));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }

        Ok(Self(url))
    }

    /// The endpoint as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The parsed URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.0
    }
}

impl FromStr for Endpoint {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When and how often to reconnect after an unexpected close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Whether to attempt recovery after a close.
    pub should_reconnect: bool,
    /// Fixed delay between a close and the next connect attempt.
    pub reconnect_interval_ms: u64,
    /// Consecutive attempts allowed since the last successful open.
    pub max_reconnect_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            should_reconnect: true,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that never reconnects.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            should_reconnect: false,
            ..Self::default()
        }
    }

    /// The fixed reconnect delay.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Check if another attempt may be scheduled after `attempts` so far.
    #[must_use]
    pub const fn allows_attempt(&self, attempts: u32) -> bool {
        self.should_reconnect && attempts < self.max_reconnect_attempts
    }
}

/// Handler invoked when a connection opens.
pub type OpenHandler = Box<dyn FnMut(&OpenEvent) + Send>;
/// Handler invoked for each received message.
pub type MessageHandler = Box<dyn FnMut(&MessageEvent) + Send>;
/// Handler invoked when the transport reports an error.
pub type ErrorHandler = Box<dyn FnMut(&ErrorEvent) + Send>;
/// Handler invoked when a connection closes.
pub type CloseHandler = Box<dyn FnMut(&CloseEvent) + Send>;

/// The optional callbacks a client forwards lifecycle events to.
#[derive(Default)]
pub struct Handlers {
    pub(crate) on_open: Option<OpenHandler>,
    pub(crate) on_message: Option<MessageHandler>,
    pub(crate) on_error: Option<ErrorHandler>,
    pub(crate) on_close: Option<CloseHandler>,
}

impl Handlers {
    /// Create an empty handler set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the open handler.
    #[must_use]
    pub fn on_open(mut self, handler: impl FnMut(&OpenEvent) + Send + 'static) -> Self {
        self.on_open = Some(Box::new(handler));
        self
    }

    /// Set the message handler.
    #[must_use]
    pub fn on_message(mut self, handler: impl FnMut(&MessageEvent) + Send + 'static) -> Self {
        self.on_message = Some(Box::new(handler));
        self
    }

    /// Set the error handler.
    #[must_use]
    pub fn on_error(mut self, handler: impl FnMut(&ErrorEvent) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Set the close handler.
    #[must_use]
    pub fn on_close(mut self, handler: impl FnMut(&CloseEvent) + Send + 'static) -> Self {
        self.on_close = Some(Box::new(handler));
        self
    }

    pub(crate) fn open(&mut self, event: &OpenEvent) {
        if let Some(handler) = self.on_open.as_mut() {
            handler(event);
        }
    }

    pub(crate) fn message(&mut self, event: &MessageEvent) {
        if let Some(handler) = self.on_message.as_mut() {
            handler(event);
        }
    }

    pub(crate) fn error(&mut self, event: &ErrorEvent) {
        if let Some(handler) = self.on_error.as_mut() {
            handler(event);
        }
    }

    pub(crate) fn close(&mut self, event: &CloseEvent) {
        if let Some(handler) = self.on_close.as_mut() {
            handler(event);
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("on_open", &self.on_open.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

/// Everything one start cycle needs.
#[derive(Debug)]
pub struct ClientConfig {
    /// Endpoint to connect to.
    pub endpoint: Endpoint,
    /// Lifecycle callbacks.
    pub handlers: Handlers,
    /// Reconnect behavior.
    pub policy: ReconnectPolicy,
}

impl ClientConfig {
    /// Create a configuration with no handlers and the default policy.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            handlers: Handlers::default(),
            policy: ReconnectPolicy::default(),
        }
    }

    /// Replace the handler set.
    #[must_use]
    pub fn with_handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Replace the reconnect policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the open handler.
    #[must_use]
    pub fn on_open(mut self, handler: impl FnMut(&OpenEvent) + Send + 'static) -> Self {
        self.handlers = self.handlers.on_open(handler);
        self
    }

    /// Set the message handler.
    #[must_use]
    pub fn on_message(mut self, handler: impl FnMut(&MessageEvent) + Send + 'static) -> Self {
        self.handlers = self.handlers.on_message(handler);
        self
    }

    /// Set the error handler.
    #[must_use]
    pub fn on_error(mut self, handler: impl FnMut(&ErrorEvent) + Send + 'static) -> Self {
        self.handlers = self.handlers.on_error(handler);
        self
    }

    /// Set the close handler.
    #[must_use]
    pub fn on_close(mut self, handler: impl FnMut(&CloseEvent) + Send + 'static) -> Self {
        self.handlers = self.handlers.on_close(handler);
        self
    }

    /// Enable or disable reconnecting.
    #[must_use]
    pub fn should_reconnect(mut self, enabled: bool) -> Self {
        self.policy.should_reconnect = enabled;
        self
    }

    /// Set the fixed reconnect delay.
    #[must_use]
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.policy.reconnect_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the attempt budget.
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_reconnect_attempts = attempts;
        self
    }
}

/// Serializable client settings, as stored in a TOML file.
///
/// ```toml
/// endpoint = "ws://127.0.0.1:8081"
///
/// [reconnect]
/// should_reconnect = true
/// reconnect_interval_ms = 3000
/// max_reconnect_attempts = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Endpoint URL.
    pub endpoint: String,
    /// Reconnect policy; missing fields take their defaults.
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

impl ClientSettings {
    /// Create settings for an endpoint with the default policy.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ClientError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> ClientResult<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("invalid TOML: {e}")))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Render the settings as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> ClientResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ClientError::Config(format!("failed to serialize settings: {e}")))
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid ws/wss URL.
    pub fn validate(&self) -> ClientResult<()> {
        if self.endpoint.is_empty() {
            return Err(ClientError::Config("endpoint cannot be empty".to_string()));
        }

        Endpoint::parse(&self.endpoint)?;
        Ok(())
    }

    /// Build a [`ClientConfig`] from these settings and a handler set.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid.
    pub fn into_config(self, handlers: Handlers) -> ClientResult<ClientConfig> {
        let endpoint = Endpoint::parse(&self.endpoint)?;
        Ok(ClientConfig::new(endpoint)
            .with_handlers(handlers)
            .with_policy(self.reconnect))
    }
}
