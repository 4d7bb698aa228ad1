//! Connection lifecycle states.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// State of the gateway session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not connected and not trying to.
    Idle,
    /// Looking up the gateway endpoint.
    ResolvingEndpoint,
    /// Opening the transport.
    Connecting,
    /// Transport open, waiting for HELLO.
    AwaitingHandshake,
    /// HELLO received; heartbeats running.
    Established,
    /// Connection lost; waiting to retry.
    Reconnecting,
    /// Manual disconnect in progress.
    Closing,
    /// Reconnect attempts exhausted.
    Failed,
}

impl ConnectionState {
    /// Whether a connection attempt is in flight.
    #[must_use]
    pub const fn is_connecting(self) -> bool {
        matches!(
            self,
            Self::ResolvingEndpoint | Self::Connecting | Self::AwaitingHandshake | Self::Reconnecting
        )
    }

    const fn from_u32(raw: u32) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::ResolvingEndpoint,
            2 => Self::Connecting,
            3 => Self::AwaitingHandshake,
            4 => Self::Established,
            5 => Self::Reconnecting,
            6 => Self::Closing,
            _ => Self::Failed,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ResolvingEndpoint => "resolving-endpoint",
            Self::Connecting => "connecting",
            Self::AwaitingHandshake => "awaiting-handshake",
            Self::Established => "established",
            Self::Reconnecting => "reconnecting",
            Self::Closing => "closing",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Atomic wrapper so callers can observe the state owned by the driver task.
#[derive(Debug)]
pub struct AtomicConnectionState(AtomicU32);

impl AtomicConnectionState {
    /// Create a new atomic state.
    #[must_use]
    pub const fn new(state: ConnectionState) -> Self {
        Self(AtomicU32::new(state as u32))
    }

    /// Load the current state.
    #[must_use]
    pub fn load(&self) -> ConnectionState {
        ConnectionState::from_u32(self.0.load(Ordering::SeqCst))
    }

    /// Store a new state, returning the previous one.
    pub fn swap(&self, state: ConnectionState) -> ConnectionState {
        ConnectionState::from_u32(self.0.swap(state as u32, Ordering::SeqCst))
    }
}
