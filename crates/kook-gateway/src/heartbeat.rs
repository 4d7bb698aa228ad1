//! Heartbeat/keepalive scheduling.
//!
//! The scheduler owns at most one periodic timer. Acknowledgements are not
//! tracked; a dead peer is only noticed when the transport reports a close.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Shortest period the scheduler will arm.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Owns the single heartbeat timer of a session manager.
#[derive(Debug, Default)]
pub struct HeartbeatScheduler {
    task: Option<JoinHandle<()>>,
    interval: Option<Duration>,
}

impl HeartbeatScheduler {
    /// Create a disarmed scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            task: None,
            interval: None,
        }
    }

    /// Arm the timer, replacing any previously armed one.
    ///
    /// The first tick fires one full `interval` after arming. On each tick
    /// `send` runs only if `is_open` reports the transport open; otherwise the
    /// tick is skipped without error.
    pub fn start<P, F>(&mut self, interval: Duration, is_open: P, mut send: F)
    where
        P: Fn() -> bool + Send + 'static,
        F: FnMut() + Send + 'static,
    {
        self.stop();

        let period = interval.max(MIN_INTERVAL);
        self.interval = Some(period);
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if is_open() {
                    send();
                } else {
                    tracing::trace!("skipping ping: transport is not open");
                }
            }
        }));
    }

    /// Disarm the timer. Does nothing if already disarmed.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.interval = None;
    }

    /// Whether a timer is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Period of the armed timer.
    #[must_use]
    pub const fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
