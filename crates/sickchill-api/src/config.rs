//! `ClientConfig` - connection settings and base address construction.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::ConfigError;

/// Required API key length.
const API_KEY_LEN: usize = 32;

/// Placeholder substituted for the API key in logs and errors.
const REDACTED: &str = "***";

/// Characters that would move the key out of the URL path.
const PREFIX_RESERVED: [char; 3] = ['?', '#', '%'];

/// Accepted API key shape.
#[allow(clippy::expect_used)]
static API_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]{32}$").expect("failed to compile API key regex"));

/// Connection settings for a SickChill server.
///
/// Immutable once built. The API key is only checked when an address is
/// rendered, so a config with an empty key can still be used to fetch one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    hostname: String,
    port: u16,
    api_key: String,
    #[serde(default)]
    url_base: String,
    #[serde(default)]
    use_tls: bool,
}

impl ClientConfig {
    /// Creates a plain-HTTP config with no path prefix.
    #[must_use]
    pub fn new(hostname: impl Into<String>, port: u16, api_key: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            api_key: api_key.into(),
            url_base: String::new(),
            use_tls: false,
        }
    }

    /// Sets the path prefix the server is mounted under (e.g. `sickchill`).
    #[must_use]
    pub fn with_url_base(mut self, url_base: impl Into<String>) -> Self {
        self.url_base = url_base.into();
        self
    }

    /// Switches between `https` and `http`.
    #[must_use]
    pub const fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Server hostname.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Server port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Configured API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Path prefix as configured.
    #[must_use]
    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    /// Whether requests use `https`.
    #[must_use]
    pub const fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// Checks that the API key is 32 lowercase alphanumeric characters.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule: missing, wrong length, or invalid
    /// characters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingKey);
        }
        let len = self.api_key.chars().count();
        if len != API_KEY_LEN {
            return Err(ConfigError::WrongLength { len });
        }
        if !API_KEY_RE.is_match(&self.api_key) {
            return Err(ConfigError::InvalidCharacters);
        }
        Ok(())
    }

    /// Renders `scheme://host:port[/prefix]`, with no trailing slash.
    ///
    /// The prefix gets exactly one leading slash and no trailing slash, so
    /// `"foo"`, `"/foo"` and `"/foo/"` render identically.
    fn origin(&self) -> Result<String, ConfigError> {
        let prefix = self.url_base.trim_matches('/');
        if let Some(c) = prefix.chars().find(|c| PREFIX_RESERVED.contains(c)) {
            return Err(ConfigError::InvalidAddress {
                reason: format!("url_base must not contain {c:?}"),
            });
        }

        let scheme = if self.use_tls { "https" } else { "http" };
        let mut addr = format!("{scheme}://{}:{}", self.hostname, self.port);
        if !prefix.is_empty() {
            addr.push('/');
            addr.push_str(prefix);
        }
        Ok(addr)
    }

    /// Renders `scheme://host:port[/prefix]/api/<key>/`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the API key is invalid or the prefix
    /// contains a query, fragment or escape character.
    pub fn base_address(&self) -> Result<String, ConfigError> {
        self.validate()?;

        let mut addr = self.origin()?;
        addr.push_str("/api/");
        addr.push_str(&self.api_key);
        addr.push('/');
        Ok(addr)
    }

    /// Server root `scheme://host:port[/prefix]/`, used for key retrieval.
    ///
    /// The API key is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] if the settings do not form a
    /// valid URL.
    pub fn server_url(&self) -> Result<Url, ConfigError> {
        let raw = format!("{}/", self.origin()?);
        Url::parse(&raw).map_err(|e| ConfigError::InvalidAddress {
            reason: format!("{raw}: {e}"),
        })
    }

    /// Replaces every occurrence of the API key in `text` with `***`.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        if self.api_key.is_empty() {
            return text.to_owned();
        }
        text.replace(&self.api_key, REDACTED)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("api_key", &REDACTED)
            .field("url_base", &self.url_base)
            .field("use_tls", &self.use_tls)
            .finish()
    }
}
