//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kook_gateway::{EventCategory, GatewayConfig, GatewayError};

/// Categories printed when none are requested.
pub const DEFAULT_CATEGORIES: [EventCategory; 7] = [
    EventCategory::Ready,
    EventCategory::Error,
    EventCategory::Stopped,
    EventCategory::Message,
    EventCategory::GuildMemberOnline,
    EventCategory::GuildMemberOffline,
    EventCategory::SystemEvent,
];

/// KOOK gateway listener.
#[derive(Parser, Debug, Clone)]
#[command(name = "kook-listen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// One human-readable line per notification.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Connect and print events until interrupted.
    Listen(ListenArgs),

    /// Write a sample configuration file.
    InitConfig {
        /// Path to write the config to.
        #[arg(short, long, default_value = "kook.json")]
        output: PathBuf,
    },

    /// List the event categories that can be subscribed to.
    Categories,
}

/// Arguments of `listen`. Flags override values from `--config`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListenArgs {
    /// JSON config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bot token.
    #[arg(long, env = "KOOK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// REST API base URL.
    #[arg(long, env = "KOOK_API_BASE")]
    pub api_base: Option<String>,

    /// Request a compressed gateway stream.
    #[arg(long)]
    pub compress: bool,

    /// Do not reconnect after the connection drops.
    #[arg(long)]
    pub no_auto_reconnect: bool,

    /// Reconnect attempts before giving up.
    #[arg(long)]
    pub max_reconnect_attempts: Option<u32>,

    /// Delay between reconnect attempts, in milliseconds.
    #[arg(long)]
    pub reconnect_interval_ms: Option<u64>,

    /// Category to print; repeat for several. Defaults to messages, system
    /// events and lifecycle notifications.
    #[arg(short = 'e', long = "event", value_parser = parse_category)]
    pub categories: Vec<EventCategory>,
}

impl ListenArgs {
    /// Build the gateway configuration from the config file and flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the result is invalid.
    pub fn gateway_config(&self) -> Result<GatewayConfig, GatewayError> {
        let mut config = match &self.config {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    GatewayError::Config(format!(
                        "failed to read config file '{}': {e}",
                        path.display()
                    ))
                })?;
                serde_json::from_str(&content)
                    .map_err(|e| GatewayError::Config(format!("invalid JSON: {e}")))?
            }
            None => GatewayConfig::default(),
        };

        if let Some(token) = &self.token {
            config.token.clone_from(token);
        }
        if let Some(api_base) = &self.api_base {
            config.api_base.clone_from(api_base);
        }
        if self.compress {
            config.compress = true;
        }
        if self.no_auto_reconnect {
            config.auto_reconnect = false;
        }
        if let Some(max) = self.max_reconnect_attempts {
            config.max_reconnect_attempts = max;
        }
        if let Some(interval) = self.reconnect_interval_ms {
            config.reconnect_interval_ms = interval;
        }

        config.validate()?;
        Ok(config)
    }

    /// Categories to subscribe to.
    #[must_use]
    pub fn categories(&self) -> Vec<EventCategory> {
        if self.categories.is_empty() {
            DEFAULT_CATEGORIES.to_vec()
        } else {
            self.categories.clone()
        }
    }
}

fn parse_category(name: &str) -> Result<EventCategory, String> {
    EventCategory::from_name(name).ok_or_else(|| {
        format!("unknown event category '{name}' (see `kook-listen categories`)")
    })
}
