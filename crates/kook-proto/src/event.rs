//! Event payloads carried by EVENT signals.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtoError;
use crate::system::SystemEnvelope;

/// `type` code of system events; their `extra` holds a [`SystemEnvelope`].
pub const SYSTEM_EVENT_TYPE: i64 = 255;

/// Kind of channel an event was delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelKind {
    /// Guild channel.
    Group,
    /// Direct conversation.
    Person,
    /// Broadcast channel.
    Broadcast,
}

/// Payload of the HELLO handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloData {
    /// Server-assigned session identifier.
    pub session_id: String,
    /// Heartbeat interval in milliseconds.
    pub heartbeat_interval: u64,
}

/// Message content types sharing the `type` field with events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Plain text.
    Text,
    /// Image.
    Image,
    /// Video.
    Video,
    /// File attachment.
    File,
    /// Audio.
    Audio,
    /// KMarkdown markup.
    KMarkdown,
    /// Card message.
    Card,
}

impl MessageType {
    /// Map a `type` code to a message type, if it names one.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Text),
            2 => Some(Self::Image),
            3 => Some(Self::Video),
            4 => Some(Self::File),
            8 => Some(Self::Audio),
            9 => Some(Self::KMarkdown),
            10 => Some(Self::Card),
            _ => None,
        }
    }

    /// Wire code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Text => 1,
            Self::Image => 2,
            Self::Video => 3,
            Self::File => 4,
            Self::Audio => 8,
            Self::KMarkdown => 9,
            Self::Card => 10,
        }
    }
}

/// A gateway event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Channel kind the event arrived on.
    pub channel_type: ChannelKind,
    /// Numeric event type.
    #[serde(rename = "type")]
    pub type_code: i64,
    /// Target channel, user or guild id.
    #[serde(default)]
    pub target_id: String,
    /// Author id (`1` for system events).
    #[serde(default)]
    pub author_id: String,
    /// Message content.
    #[serde(default)]
    pub content: String,
    /// Type-dependent extra data.
    #[serde(default)]
    pub extra: Value,
    /// Message id.
    #[serde(default)]
    pub msg_id: String,
    /// Timestamp in milliseconds.
    #[serde(default)]
    pub msg_timestamp: i64,
    /// Random nonce.
    #[serde(default)]
    pub nonce: String,
    /// Webhook verify token, only present on webhook deliveries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_token: Option<String>,
}

impl Event {
    /// Whether this is a system event (`type == 255`).
    #[must_use]
    pub const fn is_system(&self) -> bool {
        self.type_code == SYSTEM_EVENT_TYPE
    }

    /// Message content type, if the `type` code names one.
    #[must_use]
    pub const fn message_type(&self) -> Option<MessageType> {
        MessageType::from_code(self.type_code)
    }

    /// Parse `extra` as a system event envelope.
    ///
    /// Returns `None` for non-system events.
    ///
    /// # Errors
    ///
    /// Fails if `extra` is not an object with a string discriminator.
    pub fn system_envelope(&self) -> Option<Result<SystemEnvelope, ProtoError>> {
        if self.is_system() {
            Some(SystemEnvelope::from_extra(&self.extra))
        } else {
            None
        }
    }
}
