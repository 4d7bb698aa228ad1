//! Error types for kook-gateway.

use kook_proto::ProtoError;
use thiserror::Error;

/// Errors surfaced by the gateway session manager and its collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Endpoint lookup failed.
    #[error("failed to get gateway url: {0}")]
    Resolve(String),

    /// Transport could not be opened or closed before the handshake.
    #[error("gateway connection failed: {0}")]
    Connection(String),

    /// Inbound frame could not be decoded.
    #[error("failed to parse message: {0}")]
    Decode(String),

    /// Every automatic reconnect attempt failed.
    #[error("max reconnect attempts reached ({attempts})")]
    ReconnectExhausted {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// The connection dropped and automatic reconnect is turned off.
    #[error("connection lost and auto reconnect is disabled: {reason}")]
    ReconnectDisabled {
        /// Why the connection went away.
        reason: String,
    },

    /// A pending `connect()` was abandoned by a manual disconnect.
    #[error("connect cancelled by disconnect")]
    Cancelled,

    /// The manager's driver task is gone.
    #[error("gateway manager has shut down")]
    Shutdown,

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether this error ends automatic recovery.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ReconnectExhausted { .. } | Self::ReconnectDisabled { .. } | Self::Shutdown
        )
    }
}

impl From<ProtoError> for GatewayError {
    fn from(err: ProtoError) -> Self {
        Self::Decode(err.to_string())
    }
}
