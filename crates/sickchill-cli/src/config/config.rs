//! `AppConfig` struct and TOML read/write.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sickchill_api::ClientConfig;

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Server connection settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// HTTP client tuning.
    #[serde(default)]
    pub client: ClientSettings,
}

/// Server connection settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Server hostname.
    pub hostname: String,
    /// Server port.
    pub port: u16,
    /// 32-character API key.
    pub api_key: String,
    /// Path prefix the server is mounted under.
    pub url_base: String,
    /// Use `https`.
    pub use_tls: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: String::from("localhost"),
            port: 8081,
            api_key: String::new(),
            url_base: String::new(),
            use_tls: false,
        }
    }
}

/// HTTP client tuning.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Delay between search attempts in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retry_delay_ms: 1000,
        }
    }
}

impl ClientSettings {
    /// Per-request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay between search attempts.
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Builds the library connection settings.
    ///
    /// A non-empty `api_key_override` (from `SICKCHILL_API_KEY`) replaces
    /// the configured key.
    pub fn client_config(&self, api_key_override: Option<&str>) -> ClientConfig {
        let api_key = api_key_override
            .filter(|k| !k.is_empty())
            .unwrap_or(&self.server.api_key);

        ClientConfig::new(&self.server.hostname, self.server.port, api_key)
            .with_url_base(&self.server.url_base)
            .with_tls(self.server.use_tls)
    }
}
