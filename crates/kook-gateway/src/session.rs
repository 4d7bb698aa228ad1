//! Per-connection session state created by the HELLO handshake.

use std::time::Duration;

use kook_proto::HelloData;

/// Heartbeat interval used when the server announces zero.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// State of one successful handshake.
///
/// A new session replaces the old one wholesale on every reconnect; nothing
/// carries over between connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    session_id: String,
    heartbeat_interval: Duration,
    last_sequence: u64,
}

impl Session {
    /// Build a session from a HELLO payload.
    #[must_use]
    pub fn from_hello(hello: &HelloData) -> Self {
        let heartbeat_interval = if hello.heartbeat_interval == 0 {
            DEFAULT_HEARTBEAT_INTERVAL
        } else {
            Duration::from_millis(hello.heartbeat_interval)
        };

        Self {
            session_id: hello.session_id.clone(),
            heartbeat_interval,
            last_sequence: 0,
        }
    }

    /// Server-assigned session identifier.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Heartbeat interval from the most recent HELLO.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Highest sequence number seen on this session.
    #[must_use]
    pub const fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Record an event sequence number.
    ///
    /// The stored value never decreases; returns `true` if it advanced.
    pub fn observe_sequence(&mut self, sn: u64) -> bool {
        if sn > self.last_sequence {
            self.last_sequence = sn;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hello(interval: u64) -> HelloData {
        HelloData {
            session_id: "abc".to_string(),
            heartbeat_interval: interval,
        }
    }

    #[test]
    fn test_from_hello() {
        let session = Session::from_hello(&hello(30_000));
        assert_eq!(session.session_id(), "abc");
        assert_eq!(session.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(session.last_sequence(), 0);
    }

    #[test]
    fn test_zero_interval_falls_back_to_default() {
        let session = Session::from_hello(&hello(0));
        assert_eq!(session.heartbeat_interval(), DEFAULT_HEARTBEAT_INTERVAL);
    }

    #[test]
    fn test_observe_sequence_ignores_stale_numbers() {
        let mut session = Session::from_hello(&hello(1_000));

        assert!(session.observe_sequence(5));
        assert!(!session.observe_sequence(3));
        assert!(!session.observe_sequence(5));
        assert!(session.observe_sequence(6));
        assert_eq!(session.last_sequence(), 6);
    }

    proptest! {
        #[test]
        fn prop_last_sequence_is_non_decreasing(
            sequence in proptest::collection::vec(0u64..10_000, 0..200),
        ) {
            let mut session = Session::from_hello(&hello(1_000));
            let mut previous = session.last_sequence();

            for sn in &sequence {
                session.observe_sequence(*sn);
                prop_assert!(session.last_sequence() >= previous);
                previous = session.last_sequence();
            }

            let expected = sequence.iter().copied().max().unwrap_or(0);
            prop_assert_eq!(session.last_sequence(), expected);
        }
    }
}
