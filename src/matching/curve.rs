//! Numeric helpers for the duration sub-score.

/// Largest duration gap (seconds) that still affects the score.
pub const MAX_DURATION_GAP: f64 = 120.0;

/// Linearly map `x` from one range to another.
///
/// Either range may be given reversed (`min > max`); the interpolation
/// fraction is inverted accordingly. Values outside the input range are
/// extrapolated. A zero-width input range maps everything to `n_min`.
pub fn remap(x: f64, o_min: f64, o_max: f64, n_min: f64, n_max: f64) -> f64 {
    let old_min = o_min.min(o_max);
    let old_max = o_min.max(o_max);
    let reverse_input = old_min != o_min;

    let new_min = n_min.min(n_max);
    let new_max = n_min.max(n_max);
    let reverse_output = new_min != n_min;

    let old_span = old_max - old_min;
    if old_span == 0.0 {
        return n_min;
    }
    let new_span = new_max - new_min;

    let portion = if reverse_input {
        (old_max - x) * new_span / old_span
    } else {
        (x - old_min) * new_span / old_span
    };

    if reverse_output {
        new_max - portion
    } else {
        portion + new_min
    }
}

/// [`remap`] with `x` clamped to the input range first.
pub fn remap_clamped(x: f64, o_min: f64, o_max: f64, n_min: f64, n_max: f64) -> f64 {
    let clamped = x.clamp(o_min.min(o_max), o_min.max(o_max));
    remap(clamped, o_min, o_max, n_min, n_max)
}

/// Ease-in-out curve from 1 at `x = 0` down to 0 at `x = 1`, passing 0.5 at
/// the midpoint.
pub fn ease(x: f64) -> f64 {
    if x < 0.5 {
        1.0 - 4.0 * x * x * x
    } else {
        (-2.0 * x + 2.0).powi(3) / 2.0
    }
}

/// Similarity (0-100) of two durations in seconds.
///
/// Falls off slowly for small gaps and steeply past one minute; gaps of
/// [`MAX_DURATION_GAP`] or more score the same as exactly that gap.
pub fn duration_similarity(a: f64, b: f64) -> f64 {
    let gap = (a - b).abs();
    if gap.is_nan() {
        return 0.0;
    }
    let x = remap_clamped(gap, 0.0, MAX_DURATION_GAP, 0.0, 1.0);
    (ease(x) * 100.0).clamp(0.0, 100.0)
}
