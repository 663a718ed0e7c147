//! Client phase and status snapshot types.

use std::fmt;

/// Where a client is in its connect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientPhase {
    /// No connection and no reconnect pending.
    #[default]
    Idle,
    /// A connection was opened and has not reported open yet.
    Connecting,
    /// Connected.
    Open,
    /// The connection closed and a reconnect is scheduled.
    Closed,
}

impl fmt::Display for ClientPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A point-in-time view of a client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientStatus {
    /// Current phase.
    pub phase: ClientPhase,
    /// Consecutive reconnect attempts since the last open.
    pub reconnect_attempts: u32,
    /// Endpoint of the active cycle, if any.
    pub endpoint: Option<String>,
    /// Whether a reconnect timer is pending.
    pub reconnect_pending: bool,
}

impl ClientStatus {
    /// Whether the client is connected.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.phase == ClientPhase::Open
    }

    /// Whether the client has stopped trying: idle after a start with the
    /// attempt budget spent or reconnecting disabled.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.phase == ClientPhase::Idle
    }
}
