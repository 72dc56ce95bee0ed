//! The two sampling disciplines.
//!
//! - [`sample_without_replacement`]: distinct results, for cluster
//!   selection.  Each draw removes the winner and renormalizes over the
//!   remaining pool, so later draws correctly reflect a shrinking
//!   population.
//! - [`sample_with_replacement`]: independent draws from a fixed pool, for
//!   item selection.  Repeats are intended: a dominant entry should appear
//!   disproportionately.
//!
//! Both take an injected `Rng` so callers control reproducibility; both
//! treat zero or empty weight sets as "nothing eligible" rather than an
//! error.

use std::collections::BTreeMap;

use rand::Rng;

/// Keep only entries that can actually win a draw.
///
/// Weights of 0 are legitimate (unselectable entries); non-finite weights
/// would poison the cdf walk and are dropped for the same reason.  BTreeMap
/// order makes the candidate list, and therefore the draw sequence for a
/// fixed RNG, deterministic.
fn positive_candidates(weights: &BTreeMap<String, f64>) -> Vec<(&str, f64)> {
    weights
        .iter()
        .filter(|(_, &w)| w.is_finite() && w > 0.0)
        .map(|(id, &w)| (id.as_str(), w))
        .collect()
}

/// One weighted draw over `candidates`, by cdf walk.  `total` must be the
/// sum of candidate weights and positive.
fn draw_index<R: Rng>(candidates: &[(&str, f64)], total: f64, rng: &mut R) -> usize {
    let r: f64 = rng.random::<f64>() * total;
    let mut cdf = 0.0;
    for (i, (_, w)) in candidates.iter().enumerate() {
        cdf += w;
        if r < cdf {
            return i;
        }
    }
    // Numerical fallback.
    candidates.len() - 1
}

/// Weighted sampling without replacement.
///
/// Returns `min(k, number of entries with weight > 0)` pairwise-distinct
/// ids.  Every draw removes the winner from the pool before the next draw.
/// `k == 0`, an empty map, or all-zero weights yield an empty result.
pub fn sample_without_replacement<R: Rng>(
    weights: &BTreeMap<String, f64>,
    k: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut pool = positive_candidates(weights);
    let mut selected = Vec::with_capacity(k.min(pool.len()));

    for _ in 0..k {
        let total: f64 = pool.iter().map(|(_, w)| w).sum();
        if pool.is_empty() || total <= 0.0 {
            break;
        }
        let idx = draw_index(&pool, total, rng);
        let (id, _) = pool.remove(idx);
        selected.push(id.to_string());
    }
    selected
}

/// Weighted sampling with replacement.
///
/// Returns exactly `k` ids drawn independently with probability
/// proportional to weight, or an empty result when the total weight is 0.
/// A single positive candidate appears `k` times.
pub fn sample_with_replacement<R: Rng>(
    weights: &BTreeMap<String, f64>,
    k: usize,
    rng: &mut R,
) -> Vec<String> {
    let pool = positive_candidates(weights);
    let total: f64 = pool.iter().map(|(_, w)| w).sum();
    if pool.is_empty() || total <= 0.0 {
        return Vec::new();
    }

    let mut selected = Vec::with_capacity(k);
    for _ in 0..k {
        let idx = draw_index(&pool, total, rng);
        selected.push(pool[idx].0.to_string());
    }
    selected
}
