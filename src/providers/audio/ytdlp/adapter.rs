//! Adapter layer: convert yt-dlp info JSON to domain types.

use std::path::PathBuf;

use super::dto::InfoJson;
use crate::file_tools::AudioCodec;
use crate::library::{Album, Artist, Track};
use crate::providers::{Download, ProviderError, ProviderRecord, SearchResult};

/// Auto-generated "Artist - Topic" channels carry the artist name.
const TOPIC_SUFFIX: &str = " - Topic";

impl ProviderRecord for InfoJson {
    fn to_track(&self) -> Track {
        to_track(self)
    }

    fn locator(&self) -> String {
        self.webpage_url
            .clone()
            .unwrap_or_else(|| format!("https://music.youtube.com/watch?v={}", self.id))
    }
}

/// Candidate track described by an info JSON.
pub fn to_track(info: &InfoJson) -> Track {
    let name = info
        .track
        .clone()
        .or_else(|| info.title.clone())
        .unwrap_or_default();

    let mut track = Track::new(name, artists(info), info.duration.unwrap_or(0.0));
    track.url = info.webpage_url.clone();
    track.album = info.album.as_ref().map(|name| {
        let mut album = Album::new(name.clone());
        album.release_date = release_date(info);
        album
    });
    track
}

/// Materialized download for `result`, from the JSON printed after the move.
pub fn to_download(result: SearchResult, info: &InfoJson) -> Result<Download, ProviderError> {
    let path = info
        .filepath
        .as_ref()
        .map(PathBuf::from)
        .ok_or_else(|| ProviderError::Parse("yt-dlp did not report a file path".to_string()))?;

    if !path.exists() {
        return Err(ProviderError::MissingFile(path));
    }

    let codec = info
        .acodec
        .as_deref()
        .map(AudioCodec::parse)
        .unwrap_or_else(|| AudioCodec::Unknown(info.ext.clone().unwrap_or_default()));

    Ok(Download::from_result(result, path, info.abr, codec))
}

fn artists(info: &InfoJson) -> Vec<Artist> {
    if let Some(list) = info.artists.as_ref().filter(|l| !l.is_empty()) {
        return list.iter().map(Artist::new).collect();
    }

    if let Some(joined) = info.artist.as_deref().filter(|s| !s.is_empty()) {
        return joined
            .split(", ")
            .filter(|s| !s.is_empty())
            .map(Artist::new)
            .collect();
    }

    info.channel
        .as_deref()
        .or(info.uploader.as_deref())
        .map(|c| c.strip_suffix(TOPIC_SUFFIX).unwrap_or(c))
        .map(|c| vec![Artist::new(c)])
        .unwrap_or_default()
}

/// `YYYYMMDD` -> `YYYY-MM-DD`, falling back to the bare year.
fn release_date(info: &InfoJson) -> Option<String> {
    match info.release_date.as_deref() {
        Some(d) if d.len() == 8 && d.chars().all(|c| c.is_ascii_digit()) => {
            Some(format!("{}-{}-{}", &d[0..4], &d[4..6], &d[6..8]))
        }
        _ => info.release_year.map(|y| y.to_string()),
    }
}
