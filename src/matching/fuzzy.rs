//! Fuzzy string ratios in the 0-100 range.
//!
//! The building block is [`ratio`], a normalized edit-distance similarity from
//! `strsim`. On top of it sit the order- and length-tolerant heuristics
//! (partial, token-sort, token-set) that [`weighted_ratio`] combines:
//!
//! - similar lengths: best of the plain ratio and the token ratios
//! - very different lengths: partial (substring) ratios, scaled down the more
//!   the lengths differ
//!
//! All functions expect already-normalized input (see `library::slugify`);
//! tokens are whitespace separated.

use std::collections::BTreeSet;

/// Scale applied to token based ratios so they never beat an exact match.
const UNBASE_SCALE: f64 = 0.95;

/// Plain similarity of two strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Best [`ratio`] of the shorter string against every same-length window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let short_len = short.chars().count();
    if short_len == 0 {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let long_chars: Vec<char> = long.chars().collect();
    let mut best: f64 = 0.0;
    for start in 0..=(long_chars.len() - short_len) {
        let window: String = long_chars[start..start + short_len].iter().collect();
        best = best.max(ratio(short, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// [`ratio`] after sorting each string's tokens.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Token sets split into (shared, only in a, only in b), each sorted and joined.
fn token_partition(a: &str, b: &str) -> (String, String, String) {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();

    let join = |it: Vec<&str>| it.join(" ");
    (
        join(set_a.intersection(&set_b).copied().collect()),
        join(set_a.difference(&set_b).copied().collect()),
        join(set_b.difference(&set_a).copied().collect()),
    )
}

/// Compares the shared tokens against each side's full token set.
///
/// One side being a token subset of the other counts as a full match.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let (shared, only_a, only_b) = token_partition(a, b);

    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }
    if shared.is_empty() {
        return ratio(&only_a, &only_b);
    }

    let combined_a = format!("{shared} {only_a}");
    let combined_b = format!("{shared} {only_b}");
    ratio(&shared, &combined_a)
        .max(ratio(&shared, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

/// Best of the token sort and token set ratios.
pub fn token_ratio(a: &str, b: &str) -> f64 {
    token_sort_ratio(a, b).max(token_set_ratio(a, b))
}

/// Token-aware variant of [`partial_ratio`].
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let (shared, only_a, only_b) = token_partition(a, b);
    if !shared.is_empty() {
        return 100.0;
    }

    partial_ratio(&sorted_tokens(a), &sorted_tokens(b)).max(partial_ratio(&only_a, &only_b))
}

/// Length- and order-tolerant composite ratio.
///
/// Returns 0 when either side is empty.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;
    let base = ratio(a, b);

    if len_ratio < 1.5 {
        return base.max(token_ratio(a, b) * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
    base.max(partial_ratio(a, b) * partial_scale)
        .max(partial_token_ratio(a, b) * UNBASE_SCALE * partial_scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert_eq!(ratio("soft spot", "soft spot"), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_partial_ratio_finds_substring() {
        assert_eq!(partial_ratio("spot", "soft spot"), 100.0);
        assert_eq!(partial_ratio("soft spot", "spot"), 100.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_token_sort_ignores_order() {
        assert_eq!(token_sort_ratio("tommy villiers piri", "piri tommy villiers"), 100.0);
    }

    #[test]
    fn test_token_set_subset_is_full_match() {
        assert_eq!(token_set_ratio("soft spot", "soft spot official audio"), 100.0);
        assert!(token_set_ratio("soft spot", "hard place") < 60.0);
    }

    #[test]
    fn test_weighted_ratio_empty_is_zero() {
        assert_eq!(weighted_ratio("", "anything"), 0.0);
        assert_eq!(weighted_ratio("anything", ""), 0.0);
    }

    #[test]
    fn test_weighted_ratio_reordered_tokens() {
        let score = weighted_ratio("villiers tommy", "tommy villiers");
        assert!((score - 95.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_weighted_ratio_long_suffix_is_scaled() {
        // Length ratio >= 1.5 so only partial matches count, scaled by 0.9
        let score = weighted_ratio("soft spot", "soft spot live at the o2 arena");
        assert!((score - 90.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_weighted_ratio_bounds() {
        for (a, b) in [("a", "b"), ("abc", "abd"), ("one two", "two one three four five six seven eight")] {
            let score = weighted_ratio(a, b);
            assert!((0.0..=100.0).contains(&score), "{a:?} vs {b:?} = {score}");
        }
    }
}
