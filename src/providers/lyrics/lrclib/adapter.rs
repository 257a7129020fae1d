//! Adapter layer: convert LRCLIB DTOs to domain types.

use super::dto::LyricsRecord;
use crate::library::{Album, Artist, Track};
use crate::matching;
use crate::providers::{LyricsSearchResult, sort_by_match};

/// Candidate track described by a lyrics record.
pub fn to_track(record: &LyricsRecord) -> Track {
    let artists = record
        .artist_name
        .split(", ")
        .filter(|s| !s.is_empty())
        .map(Artist::new)
        .collect();

    let mut track = Track::new(&record.track_name, artists, record.duration.unwrap_or(0.0));
    track.album = record.album_name.as_ref().map(Album::new);
    track
}

/// Score every record against `original`, best first.
pub fn to_search_results(
    provider: &str,
    original: &Track,
    records: &[LyricsRecord],
) -> Vec<LyricsSearchResult> {
    let mut results: Vec<LyricsSearchResult> = records
        .iter()
        .map(|record| LyricsSearchResult {
            provider: provider.to_string(),
            match_result: matching::score(original, &to_track(record)),
            name: record.track_name.clone(),
            artist: record.artist_name.clone(),
            locator: record.id.to_string(),
        })
        .collect();

    sort_by_match(&mut results, |r| &r.match_result);
    results
}

/// Text of a record; `None` for instrumentals and empty records.
///
/// Plain lyrics win; synced lyrics are used with their timestamps removed.
pub fn to_lyrics(record: LyricsRecord) -> Option<String> {
    if record.instrumental {
        return None;
    }
    let has_text = |text: &String| !text.trim().is_empty();
    record.plain_lyrics.filter(has_text).or_else(|| {
        record
            .synced_lyrics
            .map(|synced| strip_timestamps(&synced))
            .filter(has_text)
    })
}

/// Drop LRC time tags (`[mm:ss.xx]`) from the start of every line.
fn strip_timestamps(synced: &str) -> String {
    synced
        .lines()
        .map(|line| {
            let mut rest = line;
            while let Some(tag_end) = time_tag_len(rest) {
                rest = &rest[tag_end..];
            }
            rest.trim_start()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn time_tag_len(line: &str) -> Option<usize> {
    let inner = line.strip_prefix('[')?;
    let close = inner.find(']')?;
    let tag = &inner[..close];
    let is_time = !tag.is_empty()
        && tag.starts_with(|c: char| c.is_ascii_digit())
        && tag.chars().all(|c| c.is_ascii_digit() || c == ':' || c == '.');
    is_time.then_some(close + 2)
}
