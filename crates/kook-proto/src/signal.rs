//! Gateway signal frames and their codec.

use std::fmt;
use std::io::Read;

use flate2::read::ZlibDecoder;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtoError;
use crate::event::{Event, HelloData};

/// Signal type carried in the `s` field of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum SignalType {
    /// Server pushes an event (`s = 0`).
    Event,
    /// Handshake sent by the server after the socket opens (`s = 1`).
    Hello,
    /// Client keep-alive (`s = 2`).
    Ping,
    /// Server acknowledgement of a ping (`s = 3`).
    Pong,
    /// Server asks the client to reconnect (`s = 4`).
    Reconnect,
    /// Session resume (`s = 5`); declared by the protocol, never sent by this client.
    Resume,
    /// Any other integer code, including negative ones.
    Unknown(i64),
}

impl SignalType {
    /// Raw wire code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Event => 0,
            Self::Hello => 1,
            Self::Ping => 2,
            Self::Pong => 3,
            Self::Reconnect => 4,
            Self::Resume => 5,
            Self::Unknown(code) => code,
        }
    }

    /// Whether this code is part of the protocol.
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<i64> for SignalType {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Event,
            1 => Self::Hello,
            2 => Self::Ping,
            3 => Self::Pong,
            4 => Self::Reconnect,
            5 => Self::Resume,
            other => Self::Unknown(other),
        }
    }
}

impl From<SignalType> for i64 {
    fn from(signal_type: SignalType) -> Self {
        signal_type.code()
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => f.write_str("EVENT"),
            Self::Hello => f.write_str("HELLO"),
            Self::Ping => f.write_str("PING"),
            Self::Pong => f.write_str("PONG"),
            Self::Reconnect => f.write_str("RECONNECT"),
            Self::Resume => f.write_str("RESUME"),
            Self::Unknown(code) => write!(f, "UNKNOWN({code})"),
        }
    }
}

/// One frame on the gateway connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal type.
    #[serde(rename = "s")]
    pub signal_type: SignalType,
    /// Opaque payload; its shape depends on the signal type.
    #[serde(rename = "d", default)]
    pub data: Value,
    /// Sequence number, present on event frames.
    #[serde(rename = "sn", default, skip_serializing_if = "Option::is_none")]
    pub sn: Option<u64>,
}

impl Signal {
    /// Create a signal without a sequence number.
    #[must_use]
    pub const fn new(signal_type: SignalType, data: Value) -> Self {
        Self {
            signal_type,
            data,
            sn: None,
        }
    }

    /// Keep-alive ping, `{"s":2,"d":{}}`.
    #[must_use]
    pub fn ping() -> Self {
        Self::new(SignalType::Ping, Value::Object(serde_json::Map::new()))
    }

    /// Decode a textual frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Decoding`] if the frame is not a JSON object with
    /// an integer `s` field. Unknown signal codes are not an error.
    pub fn decode(frame: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(frame).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Decode a binary frame.
    ///
    /// Frames sent with `compress=1` are zlib streams and are inflated first;
    /// anything else is read as UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Decoding`] if inflation fails, the text is not
    /// UTF-8, or the result is not a valid frame.
    pub fn decode_bytes(frame: &[u8]) -> Result<Self, ProtoError> {
        if is_zlib(frame) {
            let mut text = String::new();
            ZlibDecoder::new(frame)
                .read_to_string(&mut text)
                .map_err(|e| ProtoError::Decoding(format!("failed to inflate frame: {e}")))?;
            return Self::decode(&text);
        }

        let text = std::str::from_utf8(frame)
            .map_err(|e| ProtoError::Decoding(format!("frame is not utf-8: {e}")))?;
        Self::decode(text)
    }

    /// Encode to a textual frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Encoding`] if serialization fails.
    pub fn encode(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Parse the payload of a HELLO signal.
    ///
    /// # Errors
    ///
    /// Fails if this is not a HELLO or the payload is malformed.
    pub fn hello_data(&self) -> Result<HelloData, ProtoError> {
        self.expect(SignalType::Hello)?;
        HelloData::deserialize(&self.data).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Parse the payload of an EVENT signal.
    ///
    /// # Errors
    ///
    /// Fails if this is not an EVENT or the payload is malformed.
    pub fn event_data(&self) -> Result<Event, ProtoError> {
        self.expect(SignalType::Event)?;
        Event::deserialize(&self.data).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    fn expect(&self, expected: SignalType) -> Result<(), ProtoError> {
        if self.signal_type == expected {
            Ok(())
        } else {
            Err(ProtoError::UnexpectedSignal {
                expected: expected.code(),
                actual: self.signal_type.code(),
            })
        }
    }
}

/// zlib header check (RFC 1950): deflate method with a valid FCHECK.
/// JSON text starts with `{` or whitespace and never matches.
fn is_zlib(frame: &[u8]) -> bool {
    match frame {
        [cmf, flg, ..] => {
            (*cmf & 0x0f) == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChannelKind;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(0, SignalType::Event ; "event")]
    #[test_case(1, SignalType::Hello ; "hello")]
    #[test_case(2, SignalType::Ping ; "ping")]
    #[test_case(3, SignalType::Pong ; "pong")]
    #[test_case(4, SignalType::Reconnect ; "reconnect")]
    #[test_case(5, SignalType::Resume ; "resume")]
    #[test_case(9, SignalType::Unknown(9) ; "unknown")]
    fn test_signal_type_from_code(code: i64, expected: SignalType) {
        assert_eq!(SignalType::from(code), expected);
        assert_eq!(expected.code(), code);
    }

    #[test]
    fn test_decode_hello() {
        let signal =
            Signal::decode(r#"{"s":1,"d":{"session_id":"abc","heartbeat_interval":30000}}"#)
                .expect("valid hello");

        assert_eq!(signal.signal_type, SignalType::Hello);
        assert_eq!(signal.sn, None);

        let hello = signal.hello_data().expect("hello payload");
        assert_eq!(hello.session_id, "abc");
        assert_eq!(hello.heartbeat_interval, 30_000);
    }

    #[test]
    fn test_decode_event_with_sequence() {
        let frame = r#"{"s":0,"sn":5,"d":{"type":1,"channel_type":"GROUP","target_id":"c1","author_id":"u1","content":"hi","msg_id":"m1","msg_timestamp":1700000000000,"nonce":"n","extra":{}}}"#;
        let signal = Signal::decode(frame).expect("valid event");

        assert_eq!(signal.signal_type, SignalType::Event);
        assert_eq!(signal.sn, Some(5));

        let event = signal.event_data().expect("event payload");
        assert_eq!(event.type_code, 1);
        assert_eq!(event.channel_type, ChannelKind::Group);
        assert_eq!(event.content, "hi");
    }

    #[test]
    fn test_decode_unknown_signal_is_not_an_error() {
        let signal = Signal::decode(r#"{"s":42,"d":null}"#).expect("unknown code decodes");
        assert_eq!(signal.signal_type, SignalType::Unknown(42));
        assert!(!signal.signal_type.is_known());
    }

    #[test_case(r#"{"s":256,"d":{}}"#, 256 ; "above u8")]
    #[test_case(r#"{"s":-1,"d":{}}"#, -1 ; "negative")]
    #[test_case(r#"{"s":4294967296,"d":{}}"#, 4_294_967_296 ; "above u32")]
    fn test_decode_out_of_range_code_is_unknown(frame: &str, code: i64) {
        let signal = Signal::decode(frame).expect("integer code decodes");
        assert_eq!(signal.signal_type, SignalType::Unknown(code));
        assert_eq!(signal.signal_type.to_string(), format!("UNKNOWN({code})"));
    }

    #[test_case("not json" ; "garbage")]
    #[test_case("42" ; "number root")]
    #[test_case(r#"{"d":{}}"# ; "missing s")]
    #[test_case(r#"{"s":"hello","d":{}}"# ; "string s")]
    #[test_case(r#"{"s":1,"sn":-3,"d":{}}"# ; "negative sequence")]
    fn test_decode_rejects_malformed(frame: &str) {
        let result = Signal::decode(frame);
        assert!(matches!(result, Err(ProtoError::Decoding(_))));
    }

    #[test]
    fn test_decode_bytes_rejects_invalid_utf8() {
        let result = Signal::decode_bytes(&[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(ProtoError::Decoding(_))));
    }

    fn zlib(frame: &str) -> Vec<u8> {
        use flate2::Compression;
        use flate2::write::ZlibEncoder;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(frame.as_bytes()).expect("compress");
        encoder.finish().expect("finish")
    }

    #[test]
    fn test_decode_bytes_inflates_zlib_frame() {
        let compressed =
            zlib(r#"{"s":1,"d":{"session_id":"abc","heartbeat_interval":30000}}"#);
        assert!(is_zlib(&compressed));

        let signal = Signal::decode_bytes(&compressed).expect("compressed hello");
        assert_eq!(signal.signal_type, SignalType::Hello);
        assert_eq!(signal.hello_data().expect("hello").session_id, "abc");
    }

    #[test]
    fn test_decode_bytes_reads_plain_json() {
        let signal = Signal::decode_bytes(br#"{"s":3,"d":{}}"#).expect("plain pong");
        assert_eq!(signal.signal_type, SignalType::Pong);
    }

    #[test]
    fn test_decode_bytes_rejects_truncated_zlib() {
        let compressed = zlib(r#"{"s":3,"d":{}}"#);
        let result = Signal::decode_bytes(&compressed[..compressed.len() / 2]);
        assert!(matches!(result, Err(ProtoError::Decoding(_))));
    }

    #[test]
    fn test_encode_ping() {
        let frame = Signal::ping().encode().expect("encode ping");
        assert_eq!(frame, r#"{"s":2,"d":{}}"#);
    }

    #[test]
    fn test_hello_data_on_event_signal_fails() {
        let signal = Signal::new(SignalType::Event, Value::Null);
        let result = signal.hello_data();
        assert!(matches!(
            result,
            Err(ProtoError::UnexpectedSignal {
                expected: 1,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_hello_missing_interval_fails() {
        let signal = Signal::decode(r#"{"s":1,"d":{"session_id":"abc"}}"#).expect("frame");
        assert!(signal.hello_data().is_err());
    }

    #[test]
    fn test_signal_type_display() {
        assert_eq!(SignalType::Reconnect.to_string(), "RECONNECT");
        assert_eq!(SignalType::Unknown(7).to_string(), "UNKNOWN(7)");
    }

    proptest! {
        #[test]
        fn prop_any_code_and_sequence_decode(
            code in any::<i64>(),
            sn in proptest::option::of(0u64..1_000_000_000),
        ) {
            let mut frame = serde_json::json!({ "s": code, "d": {} });
            if let Some(sn) = sn {
                frame["sn"] = sn.into();
            }

            let signal = Signal::decode(&frame.to_string()).expect("well-formed frame");
            prop_assert_eq!(signal.signal_type.code(), code);
            prop_assert_eq!(signal.sn, sn);
        }
    }
}
