//! Error types for the kook-proto crate.

use thiserror::Error;

/// Errors that can occur while encoding or decoding gateway frames.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode a signal.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a frame or payload.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Missing required field.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The payload does not belong to the requested signal type.
    #[error("unexpected signal type: expected {expected}, got {actual}")]
    UnexpectedSignal {
        /// Signal code the caller asked for.
        expected: i64,
        /// Signal code carried by the frame.
        actual: i64,
    },
}
