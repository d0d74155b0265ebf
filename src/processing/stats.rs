// src/processing/stats.rs
//! Grid reductions. These run sequentially so results are reproducible
//! bit-for-bit regardless of thread scheduling.

use itertools::Itertools;

/// Minimum and maximum of `values`, ignoring non-finite entries.
/// Returns `(0.0, 0.0)` when there is nothing finite to scan.
pub fn min_max(values: &[f32]) -> (f32, f32) {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .minmax()
        .into_option()
        .unwrap_or((0.0, 0.0))
}

/// Percentile of an ascending-sorted slice, interpolating linearly between
/// the two closest ranks (`rank = p / 100 * (n - 1)`).
pub fn percentile_sorted(sorted: &[f32], p: f64) -> f32 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let lo = sorted[lower] as f64;
            let hi = sorted[upper] as f64;
            (lo + (hi - lo) * (rank - lower as f64)) as f32
        }
    }
}

/// `(lower, upper)` percentiles of `values`, sorting a copy once.
pub fn percentile_range(values: &[f32], lower: f64, upper: f64) -> (f32, f32) {
    let sorted = values.iter().copied().sorted_by(f32::total_cmp).collect_vec();
    (
        percentile_sorted(&sorted, lower),
        percentile_sorted(&sorted, upper),
    )
}
