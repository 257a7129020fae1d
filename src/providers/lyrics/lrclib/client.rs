//! LRCLIB HTTP client
//!
//! Free lyrics database, no API key required.
//!
//! API: https://lrclib.net/docs

use super::dto;
use crate::providers::ProviderError;

/// LRCLIB asks clients to identify themselves
const USER_AGENT: &str = concat!(
    "downmixer/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/downmixer)"
);

pub struct LrclibClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    pub fn new() -> Self {
        Self::with_base_url("https://lrclib.net/api")
    }

    /// Create a client against a different server
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    /// Search by track and artist name.
    pub async fn search(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> Result<Vec<dto::LyricsRecord>, ProviderError> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("track_name", track_name), ("artist_name", artist_name)])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        if !status.is_success() {
            return Err(ProviderError::Api(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<Vec<dto::LyricsRecord>>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }

    /// Fetch a record by id. `None` when the id is unknown.
    pub async fn get(&self, id: &str) -> Result<Option<dto::LyricsRecord>, ProviderError> {
        let url = format!("{}/get/{}", self.base_url, id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        if !status.is_success() {
            return Err(ProviderError::Api(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<dto::LyricsRecord>()
            .await
            .map(Some)
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

impl Default for LrclibClient {
    fn default() -> Self {
        Self::new()
    }
}
