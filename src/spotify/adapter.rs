//! Adapter layer: convert Spotify DTOs to library types
//!
//! This is the ONLY place where Spotify DTOs become `Track`, `Album` and
//! `Playlist`.

use super::dto;
use crate::library::{Album, Artist, Image, Playlist, Track};

pub fn to_artist(artist: &dto::ArtistObject) -> Artist {
    Artist {
        name: artist.name.clone(),
        uri: artist.uri.clone(),
    }
}

pub fn to_album(album: &dto::AlbumObject) -> Album {
    Album {
        name: album.name.clone(),
        artists: album.artists.iter().map(to_artist).collect(),
        release_date: album.release_date.clone(),
        track_count: album.total_tracks,
        images: album
            .images
            .iter()
            .map(|i| Image {
                url: i.url.clone(),
                width: i.width,
                height: i.height,
            })
            .collect(),
        uri: album.uri.clone(),
    }
}

pub fn to_track(track: &dto::TrackObject) -> Track {
    Track {
        name: track.name.clone(),
        artists: track.artists.iter().map(to_artist).collect(),
        album: track.album.as_ref().map(to_album),
        duration: track.duration_ms as f64 / 1000.0,
        track_number: track.track_number,
        disc_number: track.disc_number,
        isrc: track
            .external_ids
            .as_ref()
            .and_then(|ids| ids.isrc.clone()),
        uri: track.uri.clone(),
        url: track
            .external_urls
            .as_ref()
            .and_then(|urls| urls.spotify.clone()),
        lyrics: None,
    }
}

/// Simplified album track, with the album it was listed under attached.
pub fn to_album_track(track: &dto::TrackObject, album: &Album) -> Track {
    Track {
        album: Some(album.clone()),
        ..to_track(track)
    }
}

/// Whether a playlist entry is a downloadable song.
pub fn is_song(track: &dto::TrackObject) -> bool {
    track.kind.as_deref().is_none_or(|k| k == "track")
}

pub fn to_playlist(playlist: &dto::PlaylistObject, items: &[dto::PlaylistItem]) -> Playlist {
    Playlist {
        name: playlist.name.clone(),
        description: playlist.description.clone().filter(|d| !d.is_empty()),
        tracks: items
            .iter()
            .filter_map(|item| item.track.as_ref())
            .filter(|t| is_song(t))
            .map(to_track)
            .collect(),
        uri: playlist.uri.clone(),
    }
}
