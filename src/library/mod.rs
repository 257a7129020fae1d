//! Core track models shared by every stage of the pipeline.
//!
//! Defines [`Track`], [`Artist`], [`Album`] and [`Playlist`]. Values are built
//! once per lookup or search and treated as immutable afterwards; the only
//! late-bound field is the lyrics text, attached through [`Track::with_lyrics`]
//! which returns a new value instead of mutating in place.
//!
//! Comparison never happens on the raw strings. [`Track::slug`] produces a
//! normalized copy (transliterated, case-folded, punctuation collapsed) that
//! lives only as long as a scoring call.

use serde::{Deserialize, Serialize};

/// An artist credited on a track or album.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
    /// Source URI (e.g. `spotify:artist:...`)
    pub uri: Option<String>,
}

impl Artist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: None,
        }
    }

    pub fn slug(&self) -> Artist {
        Artist {
            name: slugify(&self.name),
            uri: self.uri.clone(),
        }
    }
}

/// Album artwork reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Album a track belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    pub artists: Vec<Artist>,
    /// Release date as reported by the source (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`)
    pub release_date: Option<String>,
    pub track_count: Option<u32>,
    /// Artwork, largest first
    pub images: Vec<Image>,
    pub uri: Option<String>,
}

impl Album {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn slug(&self) -> Album {
        Album {
            name: slugify(&self.name),
            artists: self.artists.iter().map(Artist::slug).collect(),
            ..self.clone()
        }
    }

    /// Release year parsed from the leading component of the release date.
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }
}

/// A canonical or candidate song description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    /// Credited artists, in credit order
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    /// Duration in seconds
    pub duration: f64,
    /// 1-based position on the album
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    /// International Standard Recording Code
    pub isrc: Option<String>,
    /// Source URI (e.g. `spotify:track:...`)
    pub uri: Option<String>,
    /// Human-facing source URL
    pub url: Option<String>,
    pub lyrics: Option<String>,
}

impl Track {
    pub fn new(name: impl Into<String>, artists: Vec<Artist>, duration: f64) -> Self {
        Self {
            name: name.into(),
            artists,
            duration,
            ..Default::default()
        }
    }

    /// Normalized copy used only for comparison.
    pub fn slug(&self) -> Track {
        Track {
            name: slugify(&self.name),
            artists: self.artists.iter().map(Artist::slug).collect(),
            album: self.album.as_ref().map(Album::slug),
            lyrics: self.lyrics.as_deref().map(slugify),
            ..self.clone()
        }
    }

    /// Same track with lyrics attached.
    pub fn with_lyrics(self, lyrics: impl Into<String>) -> Track {
        Track {
            lyrics: Some(lyrics.into()),
            ..self
        }
    }

    /// `"First Artist - Name"`
    pub fn title(&self) -> String {
        match self.artists.first() {
            Some(artist) => format!("{} - {}", artist.name, self.name),
            None => self.name.clone(),
        }
    }

    /// `"Artist A, Artist B - Name"`
    pub fn full_title(&self) -> String {
        if self.artists.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.all_artists(), self.name)
        }
    }

    pub fn all_artists(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Release date of the album, if any.
    pub fn date(&self) -> Option<&str> {
        self.album.as_ref().and_then(|a| a.release_date.as_deref())
    }

    /// URL of the largest album image.
    pub fn cover_url(&self) -> Option<&str> {
        self.album
            .as_ref()
            .and_then(|a| a.images.first())
            .map(|i| i.url.as_str())
    }
}

/// An ordered list of tracks from the metadata source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub description: Option<String>,
    pub tracks: Vec<Track>,
    pub uri: Option<String>,
}

/// Normalize a string for comparison.
///
/// Transliterates to ASCII, lowercases, and collapses every run of
/// non-alphanumeric characters into a single space.
pub fn slugify(input: &str) -> String {
    let ascii = any_ascii::any_ascii(input).to_lowercase();
    ascii
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
