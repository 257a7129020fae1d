//! Spotify Web API client
//!
//! Uses the client-credentials flow: no user login, public catalog data
//! only. The access token is cached until shortly before it expires.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use super::{SpotifyError, adapter, dto};
use crate::library::{Album, Playlist, Track};

/// `/tracks?ids=` accepts at most this many ids
const TRACK_BATCH: usize = 50;

/// Refresh this long before the reported expiry
const TOKEN_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + TOKEN_MARGIN < self.expires_at
    }
}

pub struct SpotifyClient {
    http_client: reqwest::Client,
    api_base: String,
    accounts_base: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::with_base_urls(
            client_id,
            client_secret,
            "https://api.spotify.com/v1",
            "https://accounts.spotify.com",
        )
    }

    /// Create a client against different API and accounts servers
    pub fn with_base_urls(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        api_base: impl Into<String>,
        accounts_base: impl Into<String>,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_base: api_base.into(),
            accounts_base: accounts_base.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: Mutex::new(None),
        }
    }

    pub async fn track(&self, id: &str) -> Result<Track, SpotifyError> {
        let url = format!("{}/tracks/{}", self.api_base, id);
        let track: dto::TrackObject = self.get_json(&url).await?;
        Ok(adapter::to_track(&track))
    }

    /// Every track of an album, with full metadata.
    pub async fn album_tracks(&self, id: &str) -> Result<Vec<Track>, SpotifyError> {
        let url = format!("{}/albums/{}", self.api_base, id);
        let full: dto::FullAlbum = self.get_json(&url).await?;
        let album = adapter::to_album(&full.album);
        let simplified = self.drain(full.tracks).await?;

        // Simplified tracks lack ISRCs; hydrate them in batches
        let tracks = hydrate_album_tracks(&simplified, &album, |ids| async move {
            let url = format!("{}/tracks?ids={}", self.api_base, ids.join(","));
            self.get_json::<dto::SeveralTracks>(&url)
                .await
                .map(|several| several.tracks)
        })
        .await?;

        tracing::debug!(album = %album.name, tracks = tracks.len(), "Fetched album");
        Ok(tracks)
    }

    pub async fn playlist(&self, id: &str) -> Result<Playlist, SpotifyError> {
        let url = format!("{}/playlists/{}", self.api_base, id);
        let playlist: dto::PlaylistObject = self.get_json(&url).await?;
        let items = self.drain(playlist.tracks.clone()).await?;
        let playlist = adapter::to_playlist(&playlist, &items);
        tracing::debug!(playlist = %playlist.name, tracks = playlist.tracks.len(), "Fetched playlist");
        Ok(playlist)
    }

    async fn drain<T: DeserializeOwned>(&self, first: dto::Paging<T>) -> Result<Vec<T>, SpotifyError> {
        drain_pages(first, |url| async move { self.get_json::<dto::Paging<T>>(&url).await }).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SpotifyError> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SpotifyError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SpotifyError::NotFound(url.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SpotifyError::RateLimited);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            *self.token.lock().await = None;
            return Err(SpotifyError::Auth("access token rejected".to_string()));
        }

        if !status.is_success() {
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(SpotifyError::Api(format!(
                    "{} {}",
                    error.error.status, error.error.message
                )));
            }
            return Err(SpotifyError::Api(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))
    }

    async fn access_token(&self) -> Result<String, SpotifyError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref()
            && token.is_fresh(Instant::now())
        {
            return Ok(token.access_token.clone());
        }

        let url = format!("{}/api/token", self.accounts_base);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SpotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::Auth(format!(
                "token request failed with HTTP {}",
                status
            )));
        }

        let body: dto::TokenResponse = response
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;

        let token = CachedToken {
            access_token: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        };
        let access_token = token.access_token.clone();
        *cached = Some(token);

        tracing::debug!("Obtained Spotify access token");
        Ok(access_token)
    }
}

/// Follow `next` links until the listing is exhausted.
async fn drain_pages<T, F, Fut>(first: dto::Paging<T>, mut fetch_page: F) -> Result<Vec<T>, SpotifyError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<dto::Paging<T>, SpotifyError>>,
{
    let mut items = first.items;
    let mut next = first.next;

    while let Some(url) = next {
        let page = fetch_page(url).await?;
        items.extend(page.items);
        next = page.next;
    }

    Ok(items)
}

/// Replace simplified album tracks with full track objects, `TRACK_BATCH`
/// ids per request. Tracks the lookup doesn't return keep their simplified
/// data with `album` attached.
async fn hydrate_album_tracks<F, Fut>(
    simplified: &[dto::TrackObject],
    album: &Album,
    mut fetch_batch: F,
) -> Result<Vec<Track>, SpotifyError>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = Result<Vec<Option<dto::TrackObject>>, SpotifyError>>,
{
    let mut tracks = Vec::with_capacity(simplified.len());
    for chunk in simplified.chunks(TRACK_BATCH) {
        let ids: Vec<String> = chunk.iter().filter_map(|t| t.id.clone()).collect();
        let hydrated = if ids.is_empty() {
            Vec::new()
        } else {
            fetch_batch(ids).await?
        };

        for simple in chunk {
            let full = hydrated
                .iter()
                .flatten()
                .find(|t| t.id.is_some() && t.id == simple.id);
            tracks.push(match full {
                Some(full) => adapter::to_track(full),
                None => adapter::to_album_track(simple, album),
            });
        }
    }
    Ok(tracks)
}
