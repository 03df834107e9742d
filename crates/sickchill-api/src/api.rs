//! `SickChillApi` trait definition.
#![allow(clippy::future_not_send)]

use tokio_util::sync::CancellationToken;
use url::Url;

use super::credentials::Credentials;
use super::error::Result;
use super::types::SearchResult;

/// SickChill API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(SickChillApi: Send)]
pub trait LocalSickChillApi {
    /// Exchanges credentials for the server's API key.
    ///
    /// # Errors
    ///
    /// Returns a network error if the request fails, or a protocol error if
    /// the body cannot be decoded or the server reports failure.
    async fn fetch_api_key(&self, server_url: &Url, credentials: &Credentials) -> Result<String>;

    /// Adds a movie by IMDb ID. Never re-adds a tracked title.
    ///
    /// Returns the raw response body.
    ///
    /// # Errors
    ///
    /// Returns a config error for an invalid API key, or a network error on
    /// transport failure or any non-200 status.
    async fn add_movie(&self, external_id: &str, title: &str) -> Result<String>;

    /// Adds a show by TVDB ID with an optional initial quality profile.
    ///
    /// # Errors
    ///
    /// Returns a config error for an invalid API key, a network error on
    /// transport failure or non-200 status, or a protocol error if the body
    /// cannot be decoded.
    async fn add_new_show(&self, tvdb_id: u64, quality: Option<&str>) -> Result<SearchResult>;

    /// Searches the indexers for shows, retrying up to 3 attempts.
    ///
    /// # Errors
    ///
    /// Returns a config error for an invalid API key, a network error on
    /// transport failure, or `NotFound` once every attempt came back empty
    /// or failed.
    async fn search(&self, query: &str) -> Result<SearchResult>;

    /// Same as [`search`](Self::search), but gives up as soon as `cancel`
    /// fires before an attempt or during the delay between attempts.
    ///
    /// Non-200 statuses, undecodable bodies and empty result sets each
    /// consume one attempt. Transport failures abort immediately.
    ///
    /// # Errors
    ///
    /// As for `search`, plus `Cancelled` carrying the number of attempts
    /// already made.
    async fn search_cancellable(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchResult>;

    /// Triggers a full movie search on the server.
    ///
    /// Returns the raw response body.
    ///
    /// # Errors
    ///
    /// Returns a config error for an invalid API key, or a network error on
    /// transport failure or any non-200 status.
    async fn trigger_full_search(&self) -> Result<String>;
}
