//! Embedding track metadata into finished files.
//!
//! Uses the lofty crate for format-independent tag writing. Every file gets
//! the same set of fields; values the track doesn't have are written empty
//! so tags look alike across a library.

mod cover;

use std::path::{Path, PathBuf};

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagExt};

use crate::library::Track;

pub use cover::{CoverArtClient, CoverImage, CoverSource};

#[derive(Debug, Clone, thiserror::Error)]
pub enum TagError {
    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to write tags to {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Writes a track's metadata into an audio file.
///
/// Blocking; the orchestrator calls it from `spawn_blocking`.
pub trait TagWriter: Send + Sync {
    fn write(
        &self,
        path: &Path,
        track: &Track,
        cover: Option<&CoverImage>,
        lyrics: Option<&str>,
    ) -> Result<(), TagError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagWriter;

impl TagWriter for LoftyTagWriter {
    fn write(
        &self,
        path: &Path,
        track: &Track,
        cover: Option<&CoverImage>,
        lyrics: Option<&str>,
    ) -> Result<(), TagError> {
        let tagged_file = Probe::open(path)
            .and_then(|p| p.read())
            .map_err(|e| TagError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut tag = Tag::new(tagged_file.primary_tag_type());
        fill_tag(&mut tag, track, lyrics);

        if let Some(cover) = cover {
            tag.push_picture(Picture::new_unchecked(
                PictureType::CoverFront,
                Some(MimeType::from_str(&cover.mime_type)),
                None,
                cover.data.clone(),
            ));
        }

        tag.save_to_path(path, WriteOptions::default())
            .map_err(|e| TagError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        tracing::debug!(path = ?path, track = %track.title(), "Wrote tags");
        Ok(())
    }
}

fn fill_tag(tag: &mut Tag, track: &Track, lyrics: Option<&str>) {
    let album = track.album.as_ref();

    tag.set_title(track.name.clone());
    tag.insert_text(ItemKey::TrackTitleSortOrder, track.name.clone());
    tag.set_artist(track.all_artists());
    tag.set_album(album.map(|a| a.name.clone()).unwrap_or_default());
    tag.insert_text(
        ItemKey::AlbumArtist,
        album
            .map(|a| {
                a.artists
                    .iter()
                    .map(|artist| artist.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default(),
    );

    match track.track_number {
        Some(number) => tag.set_track(number),
        None => {
            tag.insert_text(ItemKey::TrackNumber, String::new());
        }
    }
    match album.and_then(|a| a.track_count) {
        Some(total) => tag.set_track_total(total),
        None => {
            tag.insert_text(ItemKey::TrackTotal, String::new());
        }
    }
    match track.disc_number {
        Some(disc) => tag.set_disk(disc),
        None => {
            tag.insert_text(ItemKey::DiscNumber, String::new());
        }
    }
    if let Some(year) = album.and_then(|a| a.year()) {
        tag.set_year(year);
    }

    // Timestamp frames reject empty text, so dates are the one field left out
    if let Some(date) = track.date().filter(|d| !d.is_empty()) {
        tag.insert_text(ItemKey::RecordingDate, date.to_string());
        tag.insert_text(ItemKey::OriginalReleaseDate, date.to_string());
    }
    tag.insert_text(ItemKey::Isrc, track.isrc.clone().unwrap_or_default());
    tag.insert_text(ItemKey::Lyrics, lyrics.unwrap_or("").to_string());
}
