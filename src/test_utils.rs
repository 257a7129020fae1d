//! Test utilities and fixtures for downmixer tests.
//!
//! Mock implementations of every pipeline seam, each counting its calls so
//! orchestrator tests can assert what did (and did not) happen without a
//! network, `yt-dlp` or `ffmpeg`.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{MockAudioProvider, mock_track};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let provider = MockAudioProvider::new("mock").with_catalog(vec![mock_track()]);
//!     // ... test logic
//! }
//! ```

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::file_tools::AudioCodec;
use crate::library::{Album, Artist, Image, Track};
use crate::matching;
use crate::providers::{
    self, AudioProvider, Download, LyricsProvider, LyricsSearchResult, ProviderError,
    ProviderRecord, SearchResult,
};
use crate::tagging::{CoverImage, CoverSource, TagError, TagWriter};
use crate::transcode::{TranscodeError, TranscodeRequest, Transcoder};

/// Bytes every mock download starts with.
pub const RAW_AUDIO: &[u8] = b"raw audio";

// ============================================================================
// Fixtures
// ============================================================================

/// The canonical "Soft Spot" track with album, cover and ISRC.
pub fn mock_track() -> Track {
    let mut album = Album::new("Soft Spot");
    album.artists = vec![Artist::new("piri"), Artist::new("Tommy Villiers")];
    album.release_date = Some("2021-07-09".to_string());
    album.track_count = Some(1);
    album.images = vec![Image {
        url: "https://covers.test/soft-spot.jpg".to_string(),
        width: Some(640),
        height: Some(640),
    }];

    Track {
        album: Some(album),
        track_number: Some(1),
        disc_number: Some(1),
        isrc: Some("QZHN52145683".to_string()),
        ..Track::new(
            "Soft Spot",
            vec![Artist::new("piri"), Artist::new("Tommy Villiers")],
            220.0,
        )
    }
}

/// A bare track with a single artist.
pub fn mock_track_named(name: &str) -> Track {
    Track::new(name, vec![Artist::new("Test Artist")], 180.0)
}

/// Track counter that also remembers the highest concurrent value.
#[derive(Debug, Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Audio provider
// ============================================================================

struct CatalogEntry {
    track: Track,
    locator: String,
}

impl ProviderRecord for CatalogEntry {
    fn to_track(&self) -> Track {
        self.track.clone()
    }

    fn locator(&self) -> String {
        self.locator.clone()
    }
}

/// Audio provider backed by an in-memory catalog.
///
/// `search` returns the catalog entries whose name matches the requested
/// track (case-insensitive), ranked like a real backend. `fetch` writes
/// [`RAW_AUDIO`] into the destination directory.
pub struct MockAudioProvider {
    name: String,
    catalog: Vec<Track>,
    search_error: Option<ProviderError>,
    fetch_error: Option<ProviderError>,
    fetch_delay: Option<Duration>,
    searches: AtomicUsize,
    fetches: AtomicUsize,
    in_fetch: Gauge,
}

impl MockAudioProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            catalog: Vec::new(),
            search_error: None,
            fetch_error: None,
            fetch_delay: None,
            searches: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            in_fetch: Gauge::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<Track>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn failing_search(mut self, error: ProviderError) -> Self {
        self.search_error = Some(error);
        self
    }

    pub fn failing_fetch(mut self, error: ProviderError) -> Self {
        self.fetch_error = Some(error);
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Most fetches that were running at the same time.
    pub fn peak_concurrent_fetches(&self) -> usize {
        self.in_fetch.peak()
    }
}

#[async_trait]
impl AudioProvider for MockAudioProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, track: &Track) -> Result<Vec<SearchResult>, ProviderError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.search_error {
            return Err(e.clone());
        }

        let records: Vec<CatalogEntry> = self
            .catalog
            .iter()
            .enumerate()
            .filter(|(_, t)| t.name.eq_ignore_ascii_case(&track.name))
            .map(|(i, t)| CatalogEntry {
                track: t.clone(),
                locator: format!("mock://{}/{}", self.name, i),
            })
            .collect();
        Ok(providers::rank(&self.name, track, &records))
    }

    async fn fetch(&self, result: &SearchResult, dest_dir: &Path) -> Result<Download, ProviderError> {
        providers::ensure_own_result(&self.name, result)?;
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);

        self.in_fetch.enter();
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_fetch.leave();

        if let Some(e) = &self.fetch_error {
            return Err(e.clone());
        }

        let path = dest_dir.join(format!("{}-{}.webm", self.name, n));
        std::fs::write(&path, RAW_AUDIO).map_err(|e| ProviderError::Tool(e.to_string()))?;
        Ok(Download::from_result(
            result.clone(),
            path,
            Some(160.0),
            AudioCodec::Opus,
        ))
    }
}

// ============================================================================
// Lyrics provider
// ============================================================================

pub struct MockLyricsProvider {
    lyrics: Option<String>,
    fail: bool,
    searches: AtomicUsize,
}

impl MockLyricsProvider {
    /// Provider that finds `lyrics` for any track.
    pub fn new(lyrics: Option<&str>) -> Self {
        Self {
            lyrics: lyrics.map(str::to_string),
            fail: false,
            searches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(None)
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LyricsProvider for MockLyricsProvider {
    fn name(&self) -> &str {
        "mock-lyrics"
    }

    async fn search(&self, track: &Track) -> Result<Vec<LyricsSearchResult>, ProviderError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::RateLimited);
        }
        Ok(vec![LyricsSearchResult {
            provider: self.name().to_string(),
            match_result: matching::score(track, track),
            name: track.name.clone(),
            artist: track.all_artists(),
            locator: "1".to_string(),
        }])
    }

    async fn get_lyrics(&self, _result: &LyricsSearchResult) -> Result<Option<String>, ProviderError> {
        Ok(self.lyrics.clone())
    }
}

// ============================================================================
// Transcoder
// ============================================================================

/// Writes `converted:` followed by the input bytes to the output path.
#[derive(Default)]
pub struct MockTranscoder {
    fail: bool,
    requests: Mutex<Vec<TranscodeRequest>>,
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<TranscodeRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn convert(&self, request: &TranscodeRequest) -> Result<(), TranscodeError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if self.fail {
            return Err(TranscodeError::Failed {
                command: "mock-ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
                stdout: String::new(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }

        let input = std::fs::read(&request.input).map_err(|e| TranscodeError::Spawn {
            command: "mock-ffmpeg".to_string(),
            message: e.to_string(),
        })?;
        let mut output = b"converted:".to_vec();
        output.extend_from_slice(&input);
        std::fs::write(&request.output, output).map_err(|e| TranscodeError::Spawn {
            command: "mock-ffmpeg".to_string(),
            message: e.to_string(),
        })
    }
}

// ============================================================================
// Tag writer and cover source
// ============================================================================

/// What one tag write received.
#[derive(Debug, Clone)]
pub struct TagCall {
    pub title: String,
    pub had_cover: bool,
    pub lyrics: Option<String>,
}

/// Appends `|tagged` to the file instead of writing real tags.
#[derive(Default)]
pub struct MockTagWriter {
    fail: bool,
    calls: Mutex<Vec<TagCall>>,
}

impl MockTagWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<TagCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl TagWriter for MockTagWriter {
    fn write(
        &self,
        path: &Path,
        track: &Track,
        cover: Option<&CoverImage>,
        lyrics: Option<&str>,
    ) -> Result<(), TagError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(TagCall {
                title: track.full_title(),
                had_cover: cover.is_some(),
                lyrics: lyrics.map(str::to_string),
            });
        }

        if self.fail {
            return Err(TagError::Write {
                path: path.to_path_buf(),
                message: "unsupported tag format".to_string(),
            });
        }

        let mut data = std::fs::read(path).map_err(|e| TagError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        data.extend_from_slice(b"|tagged");
        std::fs::write(path, data).map_err(|e| TagError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

pub struct MockCoverSource {
    fail: bool,
    fetches: AtomicUsize,
}

impl MockCoverSource {
    pub fn new() -> Self {
        Self {
            fail: false,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoverSource for MockCoverSource {
    async fn fetch_cover(&self, url: &str) -> Result<CoverImage, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Network("connection refused".to_string()));
        }
        Ok(CoverImage {
            data: vec![0xFF, 0xD8, 0xFF],
            mime_type: "image/jpeg".to_string(),
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_searches_catalog() {
        let provider = MockAudioProvider::new("mock")
            .with_catalog(vec![mock_track(), mock_track_named("Other")]);

        let found = provider.search(&mock_track()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].provider, "mock");
        assert_eq!(found[0].quality(), matching::MatchQuality::Perfect);

        let missing = provider.search(&mock_track_named("Nope")).await.unwrap();
        assert!(missing.is_empty());
        assert_eq!(provider.searches(), 2);
    }

    #[tokio::test]
    async fn test_mock_provider_fetch_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockAudioProvider::new("mock").with_catalog(vec![mock_track()]);
        let result = provider.search(&mock_track()).await.unwrap().remove(0);

        let download = provider.fetch(&result, dir.path()).await.unwrap();
        assert_eq!(std::fs::read(&download.path).unwrap(), RAW_AUDIO);
        assert_eq!(provider.fetches(), 1);
    }

    #[tokio::test]
    async fn test_mock_transcoder_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.webm");
        std::fs::write(&input, RAW_AUDIO).unwrap();
        let request = TranscodeRequest {
            input,
            output: dir.path().join("out.mp3"),
            format: crate::file_tools::AudioFormat::Mp3,
            bitrate: None,
        };

        let transcoder = MockTranscoder::new();
        transcoder.convert(&request).await.unwrap();
        assert_eq!(std::fs::read(&request.output).unwrap(), b"converted:raw audio");
        assert_eq!(transcoder.calls(), 1);
    }

    #[test]
    fn test_mock_track_defaults() {
        let track = mock_track();
        assert_eq!(track.full_title(), "piri, Tommy Villiers - Soft Spot");
        assert_eq!(track.cover_url(), Some("https://covers.test/soft-spot.jpg"));
        assert_eq!(track.isrc.as_deref(), Some("QZHN52145683"));
    }
}
