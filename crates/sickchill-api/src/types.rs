//! Wire types for SickChill API responses.
//!
//! Field names on the wire are preserved through `serde` renames.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{ClientError, Result};

// --- Key retrieval ---

/// Response from the `getkey` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiKeyResponse {
    /// Issued API key. Empty when the login was rejected.
    #[serde(rename = "api_key", default)]
    pub key: String,
    /// Whether the server accepted the credentials.
    #[serde(rename = "success", default)]
    pub succeeded: bool,
}

// --- Show search / add ---

/// Response from `sb.searchtvdb` and `show.addnew`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Payload wrapper.
    #[serde(default)]
    pub data: SearchData,
    /// Human-readable message from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Result status such as `success` or `failure`.
    #[serde(rename = "result", default, skip_serializing_if = "Option::is_none")]
    pub result_status: Option<String>,
}

impl SearchResult {
    /// Entries in the order the server returned them.
    #[must_use]
    pub fn entries(&self) -> &[ShowEntry] {
        &self.data.results
    }

    /// Whether the response carries no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.results.is_empty()
    }
}

/// `data` object of a [`SearchResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchData {
    /// Matching shows.
    #[serde(default)]
    pub results: Vec<ShowEntry>,
}

/// A single show returned by the indexer search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowEntry {
    /// First air date (`YYYY-MM-DD` or null).
    #[serde(default)]
    pub first_aired: Option<String>,
    /// Whether the show is already in the server's show list.
    #[serde(rename = "in_show_list", default)]
    pub already_tracked: bool,
    /// Indexer the entry came from.
    #[serde(rename = "indexer", default)]
    pub indexer_id: u32,
    /// Show name.
    #[serde(default)]
    pub name: String,
    /// TVDB ID.
    #[serde(rename = "tvdbid", default)]
    pub external_id: u64,
}

impl ShowEntry {
    /// Parses `first_aired`. Returns `None` when absent or malformed.
    #[must_use]
    pub fn first_aired_date(&self) -> Option<NaiveDate> {
        let raw = self.first_aired.as_deref()?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

// --- Movies ---

/// Movie list wrapper (`{"movies": [...]}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieResults {
    /// Movies in server order.
    #[serde(default)]
    pub movies: Vec<MovieRecord>,
}

impl MovieResults {
    /// Decodes a raw movie response body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] if the body is not valid JSON of the
    /// expected shape.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| {
            ClientError::protocol(format!("failed to decode movie results: {e}"), body)
        })
    }
}

/// Movie metadata as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// TMDB ID.
    #[serde(rename = "tmdb_id", default)]
    pub external_id: u64,
    /// IMDb ID (e.g. `tt0133093`).
    #[serde(rename = "imdb", default)]
    pub imdb_id: String,
    /// Release year.
    #[serde(default)]
    pub year: u32,
    /// Original title.
    #[serde(rename = "original_title", default)]
    pub title: String,
    /// Poster URLs.
    #[serde(rename = "images", default)]
    pub poster_urls: Posters,
    /// Runtime in minutes.
    #[serde(rename = "runtime", default)]
    pub runtime_minutes: u32,
    /// Rating scores.
    #[serde(rename = "rating", default)]
    pub rating_scores: Ratings,
}

/// Poster URL sets of a [`MovieRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posters {
    /// Full-size posters.
    #[serde(rename = "poster_original", default)]
    pub original: Vec<String>,
    /// Resized posters.
    #[serde(rename = "poster", default)]
    pub thumbnails: Vec<String>,
}

/// Rating scores of a [`MovieRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    /// IMDb scores (rating, vote count).
    #[serde(rename = "imdb", default)]
    pub scores: Vec<f64>,
}
