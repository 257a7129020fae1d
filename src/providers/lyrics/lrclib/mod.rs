//! Lyrics from LRCLIB (https://lrclib.net).

pub mod dto;
mod adapter;
mod client;

use async_trait::async_trait;

use crate::library::Track;
use crate::providers::{LyricsProvider, LyricsSearchResult, ProviderError};

pub use client::LrclibClient;

pub struct LrclibProvider {
    client: LrclibClient,
}

impl LrclibProvider {
    pub const NAME: &'static str = "lrclib";

    pub fn new() -> Self {
        Self::with_client(LrclibClient::new())
    }

    pub fn with_client(client: LrclibClient) -> Self {
        Self { client }
    }
}

impl Default for LrclibProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn search(&self, track: &Track) -> Result<Vec<LyricsSearchResult>, ProviderError> {
        let artist = track.artists.first().map(|a| a.name.as_str()).unwrap_or("");
        let records = self.client.search(&track.name, artist).await?;
        tracing::debug!(track = %track.title(), found = records.len(), "lrclib search");
        Ok(adapter::to_search_results(Self::NAME, track, &records))
    }

    async fn get_lyrics(
        &self,
        result: &LyricsSearchResult,
    ) -> Result<Option<String>, ProviderError> {
        Ok(self.client.get(&result.locator).await?.and_then(adapter::to_lyrics))
    }
}
