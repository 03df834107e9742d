//! API client library for SickChill-compatible media managers.
//!
//! Renders the authenticated base address from a [`ClientConfig`], issues
//! GET requests against it and decodes the JSON responses. Show searches
//! are retried up to [`SEARCH_ATTEMPTS`] times.

mod api;
mod client;
mod config;
mod credentials;
mod error;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalSickChillApi, SickChillApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{SEARCH_ATTEMPTS, SickChillClient, SickChillClientBuilder};
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::{ClientError, ConfigError, NetworkError, Result};
pub use types::{
    ApiKeyResponse, MovieRecord, MovieResults, Posters, Ratings, SearchData, SearchResult,
    ShowEntry,
};

/// Re-exported so callers can cancel searches without depending on
/// `tokio-util` directly.
pub use tokio_util::sync::CancellationToken;
