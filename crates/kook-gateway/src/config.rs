//! Gateway client configuration.
//!
//! Configuration covers:
//! - Bot credential and API base used for endpoint lookup
//! - Frame compression flag
//! - Automatic reconnect behavior

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GatewayError;
use crate::reconnect::ReconnectConfig;

/// Default REST API base used to resolve the gateway endpoint.
pub const DEFAULT_API_BASE: &str = "https://www.kookapp.cn/api/v3";

/// Settings for a [`crate::GatewayManager`].
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bot token, sent as `Authorization: Bot <token>`.
    pub token: String,
    /// REST API base URL.
    pub api_base: String,
    /// Ask the server for compressed frames.
    pub compress: bool,
    /// Reconnect automatically after an unexpected close.
    pub auto_reconnect: bool,
    /// Fixed delay between reconnect attempts, in milliseconds.
    pub reconnect_interval_ms: u64,
    /// Attempts before giving up.
    pub max_reconnect_attempts: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            compress: false,
            auto_reconnect: true,
            reconnect_interval_ms: 5_000,
            max_reconnect_attempts: 10,
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("compress", &self.compress)
            .field("auto_reconnect", &self.auto_reconnect)
            .field("reconnect_interval_ms", &self.reconnect_interval_ms)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .finish()
    }
}

impl GatewayConfig {
    /// Create a configuration with defaults for everything but the token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Set the REST API base.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Enable or disable frame compression.
    #[must_use]
    pub const fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Enable or disable automatic reconnect.
    #[must_use]
    pub const fn with_auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.auto_reconnect = auto_reconnect;
        self
    }

    /// Set the fixed reconnect delay.
    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the reconnect attempt ceiling.
    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, max: u32) -> Self {
        self.max_reconnect_attempts = max;
        self
    }

    /// Fixed reconnect delay.
    #[must_use]
    pub const fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Reconnect policy derived from this configuration.
    #[must_use]
    pub const fn reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig {
            auto_reconnect: self.auto_reconnect,
            max_attempts: self.max_reconnect_attempts,
            delay: self.reconnect_interval(),
        }
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            GatewayError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or fails validation.
    pub fn from_json(content: &str) -> Result<Self, GatewayError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| GatewayError::Config(format!("invalid JSON: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is unusable.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.token.trim().is_empty() {
            return Err(GatewayError::Config("token cannot be empty".to_string()));
        }

        let api_base = Url::parse(&self.api_base)
            .map_err(|e| GatewayError::Config(format!("invalid api_base '{}': {e}", self.api_base)))?;
        if !matches!(api_base.scheme(), "http" | "https") {
            return Err(GatewayError::Config(format!(
                "api_base must use http or https, got '{}'",
                api_base.scheme()
            )));
        }

        Ok(())
    }
}
