//! # kook-proto
//!
//! Wire definitions for the KOOK bot gateway.
//!
//! Every gateway frame is a JSON object `{ "s": <signal>, "d": <payload>, "sn": <seq> }`.
//! This crate decodes frames into [`Signal`] values, parses event payloads into
//! [`Event`], and discriminates type-255 system events into a [`SystemEnvelope`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bodies;
pub mod error;
pub mod event;
pub mod signal;
pub mod system;

pub use error::ProtoError;
pub use event::{ChannelKind, Event, HelloData, MessageType, SYSTEM_EVENT_TYPE};
pub use signal::{Signal, SignalType};
pub use system::{SystemEnvelope, SystemEventKind};
