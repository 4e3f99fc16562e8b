//! Application configuration.

use crate::error::{AppError, AppResult};
use desk_channel::ChannelConfig;
use desk_registry::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// REST base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Push-channel URL.
    #[serde(default = "default_push_url")]
    pub push_url: String,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_push_url() -> String {
    "ws://localhost:5000/stream".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            push_url: default_push_url(),
        }
    }
}

/// Push-channel reconnection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSection {
    /// Base delay for exponential reconnect backoff (ms). Default: 1000.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Maximum reconnect delay (ms). Default: 30,000.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

/// Watch-list synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Debounce window for coalescing edit bursts (ms). Default: 300.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Portfolio polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSection {
    /// Interval between portfolio pulls (ms). Default: 5000.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    5000
}

impl Default for PortfolioSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub channel: ChannelSection,
    #[serde(default)]
    pub registry: RegistrySection,
    #[serde(default)]
    pub portfolio: PortfolioSection,
}

impl AppConfig {
    /// Load configuration from file.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("DESK_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            url: self.server.push_url.clone(),
            reconnect_base_delay_ms: self.channel.reconnect_base_delay_ms,
            reconnect_max_delay_ms: self.channel.reconnect_max_delay_ms,
        }
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            debounce_ms: self.registry.debounce_ms,
        }
    }
}
