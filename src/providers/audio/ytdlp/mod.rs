//! YouTube audio via the `yt-dlp` executable.
//!
//! Searches by ISRC when the canonical track has one (YouTube Music indexes
//! them for official uploads), otherwise by `"Artists - Name"`. An ISRC
//! search that finds nothing is retried once with the text query.

pub mod dto;
mod adapter;
mod client;

use std::path::Path;

use async_trait::async_trait;
use rand::Rng;

use crate::library::Track;
use crate::providers::{
    AudioProvider, Download, ProviderError, SearchResult, ensure_own_result, rank,
};

pub use client::{YtDlpClient, find_ytdlp, get_ytdlp_version, is_ytdlp_available};

pub struct YtDlpProvider {
    client: YtDlpClient,
    search_results: usize,
}

impl YtDlpProvider {
    pub const NAME: &'static str = "yt-dlp";

    pub fn new(search_results: usize) -> Self {
        Self::with_client(YtDlpClient::new(), search_results)
    }

    pub fn with_client(client: YtDlpClient, search_results: usize) -> Self {
        Self {
            client,
            search_results,
        }
    }
}

#[async_trait]
impl AudioProvider for YtDlpProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn search(&self, track: &Track) -> Result<Vec<SearchResult>, ProviderError> {
        let text_query = track.full_title();

        let mut entries = match track.isrc.as_deref().filter(|s| !s.is_empty()) {
            Some(isrc) => self.client.search(isrc, self.search_results).await?,
            None => Vec::new(),
        };

        if entries.is_empty() {
            entries = self.client.search(&text_query, self.search_results).await?;
        }

        Ok(rank(Self::NAME, track, &entries))
    }

    async fn fetch(&self, result: &SearchResult, dest_dir: &Path) -> Result<Download, ProviderError> {
        ensure_own_result(Self::NAME, result)?;

        // Workers share dest_dir; the nonce keeps two fetches of the same
        // video apart
        let nonce: u32 = rand::rng().random();
        let stem = format!("{}-{:08x}", video_id(&result.locator), nonce);

        let info = self.client.download(&result.locator, dest_dir, &stem).await?;
        adapter::to_download(result.clone(), &info)
    }
}

/// Last path or query component usable in a file name.
fn video_id(locator: &str) -> String {
    let tail = locator
        .rsplit(['=', '/'])
        .find(|s| !s.is_empty())
        .unwrap_or("media");
    crate::file_tools::sanitize_filename(tail)
}
