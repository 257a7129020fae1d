//! Candidate ranking.

use crate::library::Track;
use crate::matching::{self, MatchResult};

use super::SearchResult;

/// A raw record returned by a provider backend.
pub trait ProviderRecord {
    /// Candidate track described by this record.
    fn to_track(&self) -> Track;

    /// Provider-specific locator used to fetch the record later.
    fn locator(&self) -> String;
}

/// Score every record against `original` and order them best first.
///
/// Equal sums keep the provider's discovery order. No records yields an
/// empty list, which callers treat as "nothing found" rather than an error.
pub fn rank<R: ProviderRecord>(provider: &str, original: &Track, records: &[R]) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = records
        .iter()
        .map(|record| {
            let candidate = record.to_track();
            let match_result = matching::score(original, &candidate);
            tracing::debug!(
                provider,
                candidate = %candidate.full_title(),
                locator = %record.locator(),
                sum = match_result.sum(),
                "Scored candidate"
            );
            SearchResult::new(provider, original.clone(), candidate, match_result, record.locator())
        })
        .collect();

    sort_by_match(&mut results, |r| &r.match_result);
    results
}

/// Stable descending sort on [`MatchResult::sum`].
pub fn sort_by_match<T>(items: &mut [T], match_of: impl Fn(&T) -> &MatchResult) {
    items.sort_by(|a, b| {
        match_of(b)
            .sum()
            .partial_cmp(&match_of(a).sum())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
