//! Reconnect policy: bounded attempts at a constant delay.

use std::time::Duration;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Reconnect automatically after an unexpected close.
    pub auto_reconnect: bool,
    /// Maximum number of consecutive attempts.
    pub max_attempts: u32,
    /// Delay before every attempt. No backoff, no jitter.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            max_attempts: 10,
            delay: Duration::from_secs(5),
        }
    }
}

/// Outcome of consulting the policy after a connection drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Schedule attempt number `attempt` after `delay`.
    Retry {
        /// 1-based attempt number.
        attempt: u32,
        /// Delay before the attempt.
        delay: Duration,
    },
    /// The attempt budget is spent.
    Exhausted {
        /// Attempts made.
        attempts: u32,
    },
    /// Automatic reconnect is turned off.
    Disabled,
    /// The close was caller-initiated; stay down quietly.
    Suppressed,
}

impl ReconnectConfig {
    /// Check if another attempt is allowed after `attempts` consecutive failures.
    #[must_use]
    pub const fn should_reconnect(&self, attempts: u32) -> bool {
        self.auto_reconnect && attempts < self.max_attempts
    }

    /// Decide what to do after a drop, given attempts already made since the
    /// last successful handshake.
    #[must_use]
    pub const fn decide(&self, attempts: u32, manual_close: bool) -> ReconnectDecision {
        if manual_close {
            ReconnectDecision::Suppressed
        } else if !self.auto_reconnect {
            ReconnectDecision::Disabled
        } else if self.should_reconnect(attempts) {
            ReconnectDecision::Retry {
                attempt: attempts + 1,
                delay: self.delay,
            }
        } else {
            ReconnectDecision::Exhausted { attempts }
        }
    }
}
