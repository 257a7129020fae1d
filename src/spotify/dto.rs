//! Spotify Web API Data Transfer Objects
//!
//! These types match what the Web API returns. Do not use them outside the
//! spotify module; convert to library types in the adapter.
//!
//! API Reference: https://developer.spotify.com/documentation/web-api

use serde::Deserialize;

/// Client-credentials token response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Seconds until expiry
    pub expires_in: u64,
}

/// One page of a paginated listing
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    /// URL of the next page, `null` on the last one
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistObject {
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageObject {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Album as embedded in a track object
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumObject {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub images: Vec<ImageObject>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// `GET /albums/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct FullAlbum {
    #[serde(flatten)]
    pub album: AlbumObject,
    /// Simplified tracks (no album, no ISRC)
    pub tracks: Paging<TrackObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalIds {
    #[serde(default)]
    pub isrc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

/// Full or simplified track object
#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    /// `null` for local files
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
    #[serde(default)]
    pub album: Option<AlbumObject>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub disc_number: Option<u32>,
    #[serde(default)]
    pub external_ids: Option<ExternalIds>,
    #[serde(default)]
    pub external_urls: Option<ExternalUrls>,
    #[serde(default)]
    pub uri: Option<String>,
    /// `"track"` or `"episode"`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// `GET /tracks?ids=...`
#[derive(Debug, Clone, Deserialize)]
pub struct SeveralTracks {
    /// `null` entries for unknown ids
    pub tracks: Vec<Option<TrackObject>>,
}

/// `GET /playlists/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistObject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    pub tracks: Paging<PlaylistItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    /// `null` when the track was removed from the catalog
    #[serde(default)]
    pub track: Option<TrackObject>,
}

/// Error body
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
}
