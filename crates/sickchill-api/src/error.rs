//! Error types returned by the SickChill client.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Invalid [`ClientConfig`](crate::ClientConfig), detected before any request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No API key was configured.
    #[error("no API key specified")]
    MissingKey,
    /// The API key is not exactly 32 characters long.
    #[error("API key length is {len}, expected 32")]
    WrongLength {
        /// Observed length in characters.
        len: usize,
    },
    /// The API key contains characters outside `[a-z0-9]`.
    #[error("API key contains invalid characters")]
    InvalidCharacters,
    /// Hostname or prefix do not form a valid URL.
    #[error("invalid server address: {reason}")]
    InvalidAddress {
        /// Parser message.
        reason: String,
    },
}

/// Transport failure or unexpected HTTP status.
///
/// URLs are stored with the API key redacted.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Redacted request URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a status other than 200.
    #[error("request to {url} returned HTTP {status}")]
    Status {
        /// Redacted request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
}

/// Top-level error for every client operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid configuration, raised before any request is sent.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Transport failure or non-200 status.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Undecodable or unsuccessful response. `body` holds the raw payload.
    #[error("{message} (body: {body})")]
    Protocol {
        /// What went wrong.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// The search exhausted its attempt budget without results.
    #[error("no results found for {query:?} after {attempts} attempts")]
    NotFound {
        /// Search query.
        query: String,
        /// Attempts performed.
        attempts: u32,
    },

    /// The caller cancelled the search.
    #[error("search cancelled after {attempts} attempts")]
    Cancelled {
        /// Attempts performed before cancellation.
        attempts: u32,
    },

    /// The client could not be constructed.
    #[error("failed to build client: {0}")]
    Build(String),
}

impl ClientError {
    /// Builds a `Protocol` error carrying the raw body.
    pub(crate) fn protocol(message: impl Into<String>, body: &str) -> Self {
        Self::Protocol {
            message: message.into(),
            body: body.to_owned(),
        }
    }

    /// HTTP status code, if this error came from a non-200 response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Network(NetworkError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Whether the search ran out of attempts without results.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
