//! Diagnostic sink injected into the session manager.

use parking_lot::Mutex;

use crate::error::GatewayError;

/// Receives the manager's diagnostic output.
pub trait DebugSink: Send + Sync {
    /// A debug-level line.
    fn debug(&self, message: &str);

    /// An error the manager is also reporting to listeners.
    fn error(&self, error: &GatewayError);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "kook_gateway", "{message}");
    }

    fn error(&self, error: &GatewayError) {
        if error.is_fatal() {
            tracing::error!(target: "kook_gateway", error = %error, "gateway failed");
        } else {
            tracing::warn!(target: "kook_gateway", error = %error, "gateway error");
        }
    }
}

/// Line recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkLine {
    /// From [`DebugSink::debug`].
    Debug(String),
    /// From [`DebugSink::error`].
    Error(GatewayError),
}

/// Records diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<SinkLine>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn lines(&self) -> Vec<SinkLine> {
        self.lines.lock().clone()
    }

    /// Recorded errors only.
    #[must_use]
    pub fn errors(&self) -> Vec<GatewayError> {
        self.lines
            .lock()
            .iter()
            .filter_map(|line| match line {
                SinkLine::Error(err) => Some(err.clone()),
                SinkLine::Debug(_) => None,
            })
            .collect()
    }

    /// Whether any debug line contains `needle`.
    #[must_use]
    pub fn contains_debug(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .iter()
            .any(|line| matches!(line, SinkLine::Debug(text) if text.contains(needle)))
    }
}

impl DebugSink for MemorySink {
    fn debug(&self, message: &str) {
        self.lines.lock().push(SinkLine::Debug(message.to_string()));
    }

    fn error(&self, error: &GatewayError) {
        self.lines.lock().push(SinkLine::Error(error.clone()));
    }
}
