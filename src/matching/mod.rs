//! Similarity scoring between a canonical track and a candidate.
//!
//! [`score`] compares two tracks on four axes, each 0-100:
//!
//! | Sub-score | How |
//! |-----------|-----|
//! | name      | [`fuzzy::weighted_ratio`] of the normalized names |
//! | artists   | best candidate artist per canonical artist, averaged |
//! | album     | [`fuzzy::weighted_ratio`] of the album names (0 if the candidate has none) |
//! | length    | [`curve::duration_similarity`] of the durations |
//!
//! The unweighted [`MatchResult::sum`] (0-400) is classified into a
//! [`MatchQuality`] tier.
//!
//! Scoring is pure and never fails: a pair of strings that cannot be compared
//! contributes 0 instead of aborting the ranking of a whole result set.

pub mod curve;
pub mod fuzzy;

use serde::Serialize;

use crate::library::Track;

/// Name of the string comparison used for every sub-score.
pub const METHOD: &str = "WRatio";

/// Quality tier of a match, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MatchQuality {
    /// Not the same song.
    Bad,
    /// Probably a cover, or something else by the same artist.
    Mediocre,
    /// Likely another version of the same song (live, edit, remaster).
    Good,
    /// Same song. Leaves room for a missing featured artist and the like.
    Perfect,
}

impl MatchQuality {
    /// All tiers in ascending threshold order.
    pub const ASCENDING: [MatchQuality; 4] = [
        MatchQuality::Bad,
        MatchQuality::Mediocre,
        MatchQuality::Good,
        MatchQuality::Perfect,
    ];

    /// Minimum [`MatchResult::sum`] for this tier.
    pub const fn threshold(self) -> f64 {
        match self {
            MatchQuality::Bad => 0.0,
            MatchQuality::Mediocre => 150.0,
            MatchQuality::Good => 280.0,
            MatchQuality::Perfect => 390.0,
        }
    }

    /// The highest tier whose threshold does not exceed `sum`.
    pub fn from_sum(sum: f64) -> MatchQuality {
        let mut quality = MatchQuality::Bad;
        for tier in Self::ASCENDING {
            if sum >= tier.threshold() {
                quality = tier;
            }
        }
        quality
    }
}

impl std::fmt::Display for MatchQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchQuality::Bad => "bad",
            MatchQuality::Mediocre => "mediocre",
            MatchQuality::Good => "good",
            MatchQuality::Perfect => "perfect",
        };
        f.write_str(s)
    }
}

/// Best similarity found for one canonical artist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistMatch {
    /// Normalized canonical artist name
    pub artist: String,
    pub score: f64,
}

/// Composite score of one canonical/candidate pair.
///
/// Sub-scores are clamped to 0-100 on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    method: &'static str,
    name_match: f64,
    artists_match: Vec<ArtistMatch>,
    album_match: f64,
    length_match: f64,
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

impl MatchResult {
    pub fn new(
        name_match: f64,
        artists_match: Vec<ArtistMatch>,
        album_match: f64,
        length_match: f64,
    ) -> Self {
        Self {
            method: METHOD,
            name_match: clamp_score(name_match),
            artists_match: artists_match
                .into_iter()
                .map(|m| ArtistMatch {
                    score: clamp_score(m.score),
                    ..m
                })
                .collect(),
            album_match: clamp_score(album_match),
            length_match: clamp_score(length_match),
        }
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn name_match(&self) -> f64 {
        self.name_match
    }

    pub fn artists_match(&self) -> &[ArtistMatch] {
        &self.artists_match
    }

    pub fn album_match(&self) -> f64 {
        self.album_match
    }

    pub fn length_match(&self) -> f64 {
        self.length_match
    }

    /// Mean of the per-artist scores, 0 when there are none.
    pub fn artists_match_avg(&self) -> f64 {
        if self.artists_match.is_empty() {
            return 0.0;
        }
        let total: f64 = self.artists_match.iter().map(|m| m.score).sum();
        total / self.artists_match.len() as f64
    }

    /// Unweighted total of the four sub-scores (0-400).
    pub fn sum(&self) -> f64 {
        self.name_match + self.artists_match_avg() + self.album_match + self.length_match
    }

    pub fn quality(&self) -> MatchQuality {
        MatchQuality::from_sum(self.sum())
    }

    /// Whether every sub-score reaches `threshold`.
    pub fn all_above_threshold(&self, threshold: f64) -> bool {
        self.name_match >= threshold
            && self.artists_match_avg() >= threshold
            && self.album_match >= threshold
            && self.length_match >= threshold
    }
}

/// Score `candidate` against the canonical `original`.
pub fn score(original: &Track, candidate: &Track) -> MatchResult {
    let original_slug = original.slug();
    let candidate_slug = candidate.slug();

    let name_match = match_simple(&original_slug.name, Some(&candidate_slug.name));
    let artists_match = match_artists(&original_slug, &candidate_slug);
    let album_match = match candidate_slug.album.as_ref() {
        Some(candidate_album) => match_simple(
            original_slug
                .album
                .as_ref()
                .map(|a| a.name.as_str())
                .unwrap_or(""),
            Some(&candidate_album.name),
        ),
        None => 0.0,
    };
    let length_match = curve::duration_similarity(original.duration, candidate.duration);

    MatchResult::new(name_match, artists_match, album_match, length_match)
}

/// Fuzzy ratio that treats a missing or degenerate comparison as 0.
fn match_simple(a: &str, b: Option<&str>) -> f64 {
    let value = fuzzy::weighted_ratio(a, b.unwrap_or(""));
    if value.is_finite() { value } else { 0.0 }
}

/// Best-matching candidate artist for every canonical artist.
///
/// Empty when the candidate credits no artists.
fn match_artists(original: &Track, candidate: &Track) -> Vec<ArtistMatch> {
    original
        .artists
        .iter()
        .filter_map(|artist| {
            candidate
                .artists
                .iter()
                .map(|other| match_simple(&artist.name, Some(&other.name)))
                .fold(None, |best: Option<f64>, score| match best {
                    Some(b) if b >= score => Some(b),
                    _ => Some(score),
                })
                .map(|score| ArtistMatch {
                    artist: artist.name.clone(),
                    score,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{Album, Artist};

    fn soft_spot(duration: f64) -> Track {
        let mut track = Track::new(
            "Soft Spot",
            vec![Artist::new("piri"), Artist::new("Tommy Villiers")],
            duration,
        );
        track.album = Some(Album::new("froge.mp3"));
        track.isrc = Some("QZHN52145683".to_string());
        track
    }

    fn artist_match(score: f64) -> Vec<ArtistMatch> {
        vec![ArtistMatch {
            artist: "a".to_string(),
            score,
        }]
    }

    #[test]
    fn test_quality_thresholds() {
        assert_eq!(MatchQuality::from_sum(0.0), MatchQuality::Bad);
        assert_eq!(MatchQuality::from_sum(149.9), MatchQuality::Bad);
        assert_eq!(MatchQuality::from_sum(150.0), MatchQuality::Mediocre);
        assert_eq!(MatchQuality::from_sum(279.0), MatchQuality::Mediocre);
        assert_eq!(MatchQuality::from_sum(280.0), MatchQuality::Good);
        assert_eq!(MatchQuality::from_sum(389.0), MatchQuality::Good);
        assert_eq!(MatchQuality::from_sum(390.0), MatchQuality::Perfect);
        assert_eq!(MatchQuality::from_sum(400.0), MatchQuality::Perfect);
    }

    #[test]
    fn test_tier_boundary_via_result() {
        let below = MatchResult::new(100.0, artist_match(100.0), 100.0, 89.0);
        assert_eq!(below.sum(), 389.0);
        assert_ne!(below.quality(), MatchQuality::Perfect);

        let at = MatchResult::new(100.0, artist_match(100.0), 100.0, 90.0);
        assert_eq!(at.sum(), 390.0);
        assert_eq!(at.quality(), MatchQuality::Perfect);
    }

    #[test]
    fn test_sub_scores_are_clamped() {
        let result = MatchResult::new(150.0, artist_match(-20.0), f64::NAN, 100.0);
        assert_eq!(result.name_match(), 100.0);
        assert_eq!(result.artists_match_avg(), 0.0);
        assert_eq!(result.album_match(), 0.0);
        assert_eq!(result.sum(), 200.0);
    }

    #[test]
    fn test_exact_match_is_perfect() {
        // Canonical track vs. a candidate 2 seconds longer
        let result = score(&soft_spot(220.0), &soft_spot(222.0));
        assert_eq!(result.name_match(), 100.0);
        assert_eq!(result.artists_match_avg(), 100.0);
        assert_eq!(result.album_match(), 100.0);
        assert!(result.length_match() > 99.9);
        assert_eq!(result.quality(), MatchQuality::Perfect);
        assert_eq!(result.method(), "WRatio");
    }

    #[test]
    fn test_minute_gap_hits_curve_midpoint() {
        let result = score(&soft_spot(200.0), &soft_spot(260.0));
        assert!((result.length_match() - 50.0).abs() < 1e-9);
        assert!((result.sum() - 350.0).abs() < 1e-9);
        assert_eq!(result.quality(), MatchQuality::Good);

        // Without an album on the candidate the sum drops to MEDIOCRE
        let mut candidate = soft_spot(260.0);
        candidate.album = None;
        let result = score(&soft_spot(200.0), &candidate);
        assert_eq!(result.album_match(), 0.0);
        assert_eq!(result.quality(), MatchQuality::Mediocre);
    }

    #[test]
    fn test_empty_artist_lists_average_to_zero() {
        let a = Track::new("Song", vec![], 100.0);
        let b = Track::new("Song", vec![], 100.0);
        let result = score(&a, &b);
        assert!(result.artists_match().is_empty());
        assert_eq!(result.artists_match_avg(), 0.0);
    }

    #[test]
    fn test_candidate_without_artists_scores_zero_artists() {
        let a = soft_spot(220.0);
        let mut b = soft_spot(220.0);
        b.artists.clear();
        assert_eq!(score(&a, &b).artists_match_avg(), 0.0);
    }

    #[test]
    fn test_artist_best_pair_per_canonical_artist() {
        let a = Track::new("Song", vec![Artist::new("piri"), Artist::new("Tommy Villiers")], 100.0);
        let b = Track::new(
            "Song",
            vec![Artist::new("Tommy Villiers"), Artist::new("Someone Else"), Artist::new("piri")],
            100.0,
        );
        let result = score(&a, &b);
        assert_eq!(result.artists_match().len(), 2);
        assert_eq!(result.artists_match_avg(), 100.0);
    }

    #[test]
    fn test_normalization_applies_before_comparison() {
        let a = Track::new("SOFT SPOT!!", vec![Artist::new("PIRI")], 100.0);
        let b = Track::new("soft spot", vec![Artist::new("piri")], 100.0);
        let result = score(&a, &b);
        assert_eq!(result.name_match(), 100.0);
        assert_eq!(result.artists_match_avg(), 100.0);
    }

    #[test]
    fn test_all_above_threshold() {
        let result = MatchResult::new(90.0, artist_match(95.0), 80.0, 99.0);
        assert!(result.all_above_threshold(80.0));
        assert!(!result.all_above_threshold(85.0));
    }
}
