//! Spotify as the canonical metadata source.
//!
//! Resolves a user-supplied resource identifier (track, album or playlist,
//! as an `open.spotify.com` URL, a `spotify:` URI or a bare track id) into
//! the ordered list of canonical tracks to download. Paginated listings are
//! always drained completely before anything is returned.

pub mod dto;
mod adapter;
mod client;

use async_trait::async_trait;

use crate::library::{Playlist, Track};

pub use client::SpotifyClient;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SpotifyError {
    #[error("Invalid Spotify resource identifier: {0}")]
    InvalidResource(String),

    #[error("Spotify authentication failed: {0}")]
    Auth(String),

    #[error("Not found on Spotify: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Spotify API error: {0}")]
    Api(String),

    #[error("Failed to parse Spotify response: {0}")]
    Parse(String),

    #[error("Rate limited by Spotify - try again later")]
    RateLimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Track,
    Album,
    Playlist,
}

impl ResourceKind {
    fn from_segment(segment: &str) -> Option<ResourceKind> {
        match segment {
            "track" => Some(ResourceKind::Track),
            "album" => Some(ResourceKind::Album),
            "playlist" => Some(ResourceKind::Playlist),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Track => "track",
            ResourceKind::Album => "album",
            ResourceKind::Playlist => "playlist",
        }
    }
}

/// A parsed resource identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub id: String,
}

impl ResourceId {
    /// Parse a URL, URI or bare base62 track id.
    pub fn parse(input: &str) -> Result<ResourceId, SpotifyError> {
        let input = input.trim();
        let invalid = || SpotifyError::InvalidResource(input.to_string());

        if let Some(rest) = input.strip_prefix("spotify:") {
            let mut parts = rest.split(':');
            let kind = parts.next().and_then(ResourceKind::from_segment);
            let id = parts.next();
            return match (kind, id, parts.next()) {
                (Some(kind), Some(id), None) if is_base62_id(id) => Ok(ResourceId {
                    kind,
                    id: id.to_string(),
                }),
                _ => Err(invalid()),
            };
        }

        if let Some(rest) = input
            .strip_prefix("https://")
            .or_else(|| input.strip_prefix("http://"))
        {
            let path = rest.split(['?', '#']).next().unwrap_or("");
            let mut segments = path.split('/').filter(|s| !s.is_empty());
            if segments.next() != Some("open.spotify.com") {
                return Err(invalid());
            }
            // Localized links carry an `intl-xx` segment before the kind
            let segments: Vec<&str> = segments.filter(|s| !s.starts_with("intl-")).collect();
            return match segments.as_slice() {
                [kind, id] if is_base62_id(id) => ResourceKind::from_segment(kind)
                    .map(|kind| ResourceId {
                        kind,
                        id: id.to_string(),
                    })
                    .ok_or_else(invalid),
                _ => Err(invalid()),
            };
        }

        if is_base62_id(input) {
            return Ok(ResourceId {
                kind: ResourceKind::Track,
                id: input.to_string(),
            });
        }

        Err(invalid())
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "spotify:{}:{}", self.kind.as_str(), self.id)
    }
}

fn is_base62_id(s: &str) -> bool {
    s.len() == 22 && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Catalog lookups used to build the download list.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn lookup_track(&self, id: &str) -> Result<Track, SpotifyError>;

    async fn lookup_album(&self, id: &str) -> Result<Vec<Track>, SpotifyError>;

    async fn lookup_playlist(&self, id: &str) -> Result<Playlist, SpotifyError>;
}

#[async_trait]
impl MetadataSource for SpotifyClient {
    async fn lookup_track(&self, id: &str) -> Result<Track, SpotifyError> {
        self.track(id).await
    }

    async fn lookup_album(&self, id: &str) -> Result<Vec<Track>, SpotifyError> {
        self.album_tracks(id).await
    }

    async fn lookup_playlist(&self, id: &str) -> Result<Playlist, SpotifyError> {
        self.playlist(id).await
    }
}

/// Every canonical track a resource refers to, in listing order.
pub async fn resolve(
    source: &dyn MetadataSource,
    resource: &ResourceId,
) -> Result<Vec<Track>, SpotifyError> {
    match resource.kind {
        ResourceKind::Track => Ok(vec![source.lookup_track(&resource.id).await?]),
        ResourceKind::Album => source.lookup_album(&resource.id).await,
        ResourceKind::Playlist => Ok(source.lookup_playlist(&resource.id).await?.tracks),
    }
}
