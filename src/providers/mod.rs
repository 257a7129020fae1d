//! Search providers - where candidate audio and lyrics come from.
//!
//! # Architecture
//!
//! Every backend implements one of two capability traits:
//! - [`AudioProvider`]: search a catalog for a track and fetch the media
//! - [`LyricsProvider`]: search for lyric pages and fetch their text
//!
//! Backends map their raw records to [`Track`] candidates and hand them to
//! [`rank()`], which scores each against the canonical track and orders
//! them best first. The orchestrator only sees these traits and walks the
//! providers of a [`ProviderRegistry`] in its fixed priority order.
//!
//! A [`SearchResult`] carries a provider-specific locator and may only be
//! fetched by the provider that produced it.

pub mod audio;
pub mod lyrics;
mod rank;
mod registry;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::file_tools::AudioCodec;
use crate::library::Track;
use crate::matching::{MatchQuality, MatchResult};

pub use rank::{ProviderRecord, rank, sort_by_match};
pub use registry::{AUDIO_PROVIDERS, LYRICS_PROVIDERS, ProviderRegistry};

/// Errors raised by a provider backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("External tool failed: {0}")]
    Tool(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Result from provider '{actual}' cannot be fetched by '{expected}'")]
    ForeignResult { expected: String, actual: String },

    #[error("Download produced no file: {0}")]
    MissingFile(PathBuf),
}

/// A candidate found by an audio provider, scored against the canonical track.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Name of the provider that produced this result
    pub provider: String,
    pub match_result: MatchResult,
    /// Provider-specific fetch locator (URL or ID)
    pub locator: String,
    original: Track,
    candidate: Track,
}

impl SearchResult {
    pub fn new(
        provider: impl Into<String>,
        original: Track,
        candidate: Track,
        match_result: MatchResult,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            match_result,
            locator: locator.into(),
            original,
            candidate,
        }
    }

    pub fn original(&self) -> &Track {
        &self.original
    }

    pub fn candidate(&self) -> &Track {
        &self.candidate
    }

    pub fn quality(&self) -> MatchQuality {
        self.match_result.quality()
    }

    /// Metadata to use downstream.
    ///
    /// The canonical track on a perfect match, otherwise the provider's own
    /// description of what was found.
    pub fn song(&self) -> &Track {
        if self.quality() == MatchQuality::Perfect {
            &self.original
        } else {
            &self.candidate
        }
    }
}

/// A fetched media file still owned by the pipeline.
#[derive(Debug, Clone)]
pub struct Download {
    pub result: SearchResult,
    /// Where the raw media was written (inside the run temp directory)
    pub path: PathBuf,
    /// Source bitrate in kbit/s, if the provider reported one
    pub bitrate: Option<f64>,
    pub codec: AudioCodec,
}

impl Download {
    pub fn from_result(
        result: SearchResult,
        path: PathBuf,
        bitrate: Option<f64>,
        codec: AudioCodec,
    ) -> Self {
        Self {
            result,
            path,
            bitrate,
            codec,
        }
    }

    pub fn song(&self) -> &Track {
        self.result.song()
    }
}

/// A candidate lyrics page.
#[derive(Debug, Clone)]
pub struct LyricsSearchResult {
    pub provider: String,
    pub match_result: MatchResult,
    pub name: String,
    pub artist: String,
    /// Provider-specific locator for the lyrics text
    pub locator: String,
}

/// Audio search + fetch backend.
#[async_trait]
pub trait AudioProvider: Send + Sync {
    /// Stable identifier, stored on every [`SearchResult`].
    fn name(&self) -> &str;

    /// Candidates ordered best first. An empty list means nothing was found.
    async fn search(&self, track: &Track) -> Result<Vec<SearchResult>, ProviderError>;

    /// Download `result` into `dest_dir`.
    ///
    /// `result` must come from this provider's own [`search`](Self::search).
    async fn fetch(&self, result: &SearchResult, dest_dir: &Path)
    -> Result<Download, ProviderError>;
}

/// Lyrics search backend.
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Candidates ordered best first. An empty list means nothing was found.
    async fn search(&self, track: &Track) -> Result<Vec<LyricsSearchResult>, ProviderError>;

    /// Text of a candidate, `None` if the page has no lyrics.
    async fn get_lyrics(
        &self,
        result: &LyricsSearchResult,
    ) -> Result<Option<String>, ProviderError>;
}

/// Reject results produced by a different provider.
pub(crate) fn ensure_own_result(name: &str, result: &SearchResult) -> Result<(), ProviderError> {
    if result.provider == name {
        Ok(())
    } else {
        Err(ProviderError::ForeignResult {
            expected: name.to_string(),
            actual: result.provider.clone(),
        })
    }
}
