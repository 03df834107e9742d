//! `SickChillClient` - SickChill API client implementation.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use url::Url;

use super::api::SickChillApi;
use super::config::ClientConfig;
use super::credentials::Credentials;
use super::error::{ClientError, ConfigError, NetworkError, Result};
use super::types::{ApiKeyResponse, SearchResult};

/// Attempt budget for show searches.
pub const SEARCH_ATTEMPTS: u32 = 3;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay between search attempts.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Default User-Agent.
const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// SickChill API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SickChillClient {
    /// HTTP client (reqwest, gzip enabled).
    http_client: Client,
    /// Connection settings.
    config: ClientConfig,
    /// Delay between search attempts.
    retry_delay: Duration,
}

/// Builder for `SickChillClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SickChillClientBuilder {
    config: Option<ClientConfig>,
    timeout: Option<Duration>,
    retry_delay: Option<Duration>,
    user_agent: Option<String>,
}

impl SickChillClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            config: None,
            timeout: None,
            retry_delay: None,
            user_agent: None,
        }
    }

    /// Sets the connection settings (required).
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the per-request timeout (default: 10s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the delay between search attempts (default: 1s).
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Overrides the User-Agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// The API key is not checked here so that a client can be built just to
    /// call [`fetch_api_key`](SickChillApi::fetch_api_key).
    ///
    /// # Errors
    ///
    /// - `config` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<SickChillClient> {
        let config = self
            .config
            .ok_or_else(|| ClientError::Build(String::from("config is required")))?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| String::from(DEFAULT_USER_AGENT));

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .gzip(true)
            .build()
            .map_err(|e| ClientError::Build(format!("failed to build HTTP client: {e}")))?;

        Ok(SickChillClient {
            http_client,
            config,
            retry_delay: self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
        })
    }
}

impl SickChillClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> SickChillClientBuilder {
        SickChillClientBuilder::new()
    }

    /// Connection settings this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolves `path` against the authenticated base address.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.config.base_address()?;
        Url::parse(&base)
            .and_then(|url| url.join(path))
            .map_err(|e| {
                ClientError::Config(ConfigError::InvalidAddress {
                    reason: e.to_string(),
                })
            })
    }

    /// Sends a single GET and reads the body.
    ///
    /// Any transport failure, including a failed body read, becomes
    /// [`NetworkError::Transport`]. The status is returned unchecked.
    async fn get_text(&self, url: Url, query: &[(&str, String)]) -> Result<(StatusCode, String)> {
        let request = self
            .http_client
            .get(url.clone())
            .query(query)
            .build()
            .map_err(|e| self.transport_error(url.as_str(), e))?;

        let request_url = self.config.redact(request.url().as_str());
        tracing::debug!(url = %request_url, "SickChill API request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| self.transport_error(&request_url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&request_url, e))?;

        tracing::debug!(%status, body_len = body.len(), "Response body received");
        tracing::trace!(
            body_preview = %body.chars().take(500).collect::<String>(),
            "Response body preview"
        );

        Ok((status, body))
    }

    /// Sends a single GET and requires HTTP 200.
    async fn get_ok_text(&self, url: Url, query: &[(&str, String)]) -> Result<String> {
        let redacted = self.config.redact(url.as_str());
        let (status, body) = self.get_text(url, query).await?;
        if status != StatusCode::OK {
            tracing::warn!(url = %redacted, code = status.as_u16(), "Unexpected HTTP status");
            return Err(NetworkError::Status {
                url: redacted,
                status: status.as_u16(),
            }
            .into());
        }
        Ok(body)
    }

    /// Wraps a reqwest error, stripping the unredacted URL it carries.
    fn transport_error(&self, url: &str, source: reqwest::Error) -> ClientError {
        NetworkError::Transport {
            url: self.config.redact(url),
            source: source.without_url(),
        }
        .into()
    }

    /// Interprets one search response.
    ///
    /// `Ok(None)` means the server answered with an empty result set.
    fn parse_search_response(
        url: &str,
        status: StatusCode,
        body: &str,
    ) -> Result<Option<SearchResult>> {
        if status != StatusCode::OK {
            return Err(NetworkError::Status {
                url: String::from(url),
                status: status.as_u16(),
            }
            .into());
        }
        let result: SearchResult = serde_json::from_str(body).map_err(|e| {
            ClientError::protocol(format!("failed to decode search response: {e}"), body)
        })?;
        if result.is_empty() {
            return Ok(None);
        }
        Ok(Some(result))
    }
}

impl SickChillApi for SickChillClient {
    #[instrument(skip_all)]
    async fn fetch_api_key(&self, server_url: &Url, credentials: &Credentials) -> Result<String> {
        let mut url = server_url.clone();
        let path = format!("{}/getkey/", url.path().trim_end_matches('/'));
        url.set_path(&path);

        let query = [
            ("u", credentials.username_digest()),
            ("p", credentials.password_digest()),
        ];
        let (_, body) = self.get_text(url, &query).await?;

        let response: ApiKeyResponse = serde_json::from_str(&body).map_err(|e| {
            ClientError::protocol(format!("failed to decode getkey response: {e}"), &body)
        })?;

        if !response.succeeded {
            tracing::warn!("Server refused API key request");
            return Err(ClientError::protocol("failed getting API key", &body));
        }

        Ok(response.key)
    }

    #[instrument(skip_all)]
    async fn add_movie(&self, external_id: &str, title: &str) -> Result<String> {
        let url = self.endpoint("movie.add")?;
        let query = [
            ("identifier", String::from(external_id)),
            ("title", String::from(title)),
            ("force_readd", String::from("false")),
        ];
        self.get_ok_text(url, &query).await
    }

    #[instrument(skip_all)]
    async fn add_new_show(&self, tvdb_id: u64, quality: Option<&str>) -> Result<SearchResult> {
        let url = self.endpoint("")?;
        let mut query: Vec<(&str, String)> = vec![
            ("cmd", String::from("show.addnew")),
            ("tvdbid", tvdb_id.to_string()),
        ];
        if let Some(quality) = quality.filter(|q| !q.is_empty()) {
            query.push(("initial", String::from(quality)));
        }

        let body = self.get_ok_text(url, &query).await?;
        serde_json::from_str(&body).map_err(|e| {
            ClientError::protocol(format!("failed to decode show.addnew response: {e}"), &body)
        })
    }

    async fn search(&self, query: &str) -> Result<SearchResult> {
        self.search_cancellable(query, &CancellationToken::new()).await
    }

    #[instrument(skip_all, fields(%query))]
    async fn search_cancellable(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchResult> {
        let url = self.endpoint("")?;
        let redacted = self.config.redact(url.as_str());
        let params = [
            ("cmd", String::from("sb.searchtvdb")),
            ("name", String::from(query)),
        ];

        for attempt in 1..=SEARCH_ATTEMPTS {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled {
                    attempts: attempt.saturating_sub(1),
                });
            }

            let (status, body) = self.get_text(url.clone(), &params).await?;

            match Self::parse_search_response(&redacted, status, &body) {
                Ok(Some(result)) => {
                    tracing::debug!(
                        attempt,
                        results = result.entries().len(),
                        "Search returned results"
                    );
                    return Ok(result);
                }
                Ok(None) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = SEARCH_ATTEMPTS,
                        "No results found, will retry"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = SEARCH_ATTEMPTS,
                        error = %e,
                        "Search attempt failed, will retry"
                    );
                }
            }

            if attempt < SEARCH_ATTEMPTS {
                tokio::select! {
                    () = cancel.cancelled() => {
                        return Err(ClientError::Cancelled { attempts: attempt });
                    }
                    () = tokio::time::sleep(self.retry_delay) => {}
                }
            }
        }

        Err(ClientError::NotFound {
            query: String::from(query),
            attempts: SEARCH_ATTEMPTS,
        })
    }

    #[instrument(skip_all)]
    async fn trigger_full_search(&self) -> Result<String> {
        let url = self.endpoint("movie.searcher.full_search")?;
        self.get_ok_text(url, &[]).await
    }
}
