//! Notification payloads delivered to listeners.

use std::sync::Arc;

use kook_proto::{Event, SystemEnvelope};

use crate::error::GatewayError;

/// Payload handed to listeners of a category.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Handshake completed.
    Ready {
        /// Session identifier from HELLO.
        session_id: String,
    },
    /// Diagnostic line.
    Debug(String),
    /// Recoverable or fatal error.
    Error(GatewayError),
    /// Manual disconnect finished.
    Stopped,
    /// Heartbeat acknowledged.
    Pong,
    /// A decoded event. Messages, member presence and the raw `event`
    /// category carry this.
    Event(Arc<Event>),
    /// A system event with its parsed envelope.
    System {
        /// The full event.
        event: Arc<Event>,
        /// Parsed `extra`.
        envelope: Arc<SystemEnvelope>,
    },
}

impl GatewayEvent {
    /// The underlying event, for event-carrying payloads.
    #[must_use]
    pub fn event(&self) -> Option<&Event> {
        match self {
            Self::Event(event) | Self::System { event, .. } => Some(event),
            _ => None,
        }
    }

    /// The system envelope, if this is a system notification.
    #[must_use]
    pub fn envelope(&self) -> Option<&SystemEnvelope> {
        match self {
            Self::System { envelope, .. } => Some(envelope),
            _ => None,
        }
    }
}
