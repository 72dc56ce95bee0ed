//! Weight calculation: stats → sampling weights.
//!
//! One formula for both levels, applied to cluster stats against all other
//! clusters and to item stats against the other items of the same cluster.
//! Constants live in an explicit [`WeightConfig`] so tests can exercise
//! alternate policies without shared state.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{Growth, StatsBundle, MIN_WEIGHT};

/// Round to three decimal places, the resolution of the weight formula.
fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Constants of the weight formula.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightConfig {
    /// Coefficient of the usage-share term.  Volume should dominate.
    pub share_weight: f64,
    /// Coefficient of the growth term.  Trend should only nudge.
    pub growth_weight: f64,
    /// Multiplier applied to the max sibling weight for new entrants,
    /// expressing a deliberate bias toward freshly introduced entries.
    pub new_entry_multiplier: f64,
    /// Stand-in for the sibling max when a level has no non-new entries,
    /// so new-entrant weights are always defined.
    pub new_entry_fallback: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            share_weight: 0.99,
            growth_weight: 0.01,
            new_entry_multiplier: 2.0,
            new_entry_fallback: 1.0,
        }
    }
}

/// Sampling weights for every cluster and item in a [`StatsBundle`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightSet {
    /// Per-cluster weights, keyed by cluster id.
    pub clusters: BTreeMap<String, f64>,
    /// Per-item weights, keyed by cluster id then item id.
    pub items: BTreeMap<String, BTreeMap<String, f64>>,
}

impl WeightSet {
    /// Item weights of one cluster, empty if the cluster is unknown.
    pub fn items_of(&self, cluster_id: &str) -> BTreeMap<String, f64> {
        self.items.get(cluster_id).cloned().unwrap_or_default()
    }
}

/// Weight of one non-new entry: share dominates, growth nudges.
///
/// Never negative (clamped at 0), and never below [`MIN_WEIGHT`] when the
/// usage share is positive, so a large negative growth cannot zero out an
/// entry that still has real usage.  A share of exactly 0 with known
/// growth yields weight 0: the entry is unselectable by design.
fn known_weight(cfg: &WeightConfig, share: f64, growth: f64) -> f64 {
    let raw = round3(share * cfg.share_weight + growth * cfg.growth_weight);
    let clamped = raw.max(0.0);
    if share > 0.0 {
        clamped.max(MIN_WEIGHT)
    } else {
        clamped
    }
}

/// Weight of one new entry: the max non-new sibling weight, boosted.
///
/// The fallback stands in both when there are no non-new siblings and when
/// none of them carries positive weight, so a new entrant is never locked
/// out by an all-zero neighborhood.
fn new_weight(cfg: &WeightConfig, max_sibling: Option<f64>) -> f64 {
    let base = match max_sibling {
        Some(m) if m > 0.0 => m,
        _ => cfg.new_entry_fallback,
    };
    round3(base * cfg.new_entry_multiplier).max(0.0)
}

/// Weight one level of entries: `(share, growth)` pairs keyed by id.
///
/// Two passes, like the source data pipeline: first every entry with known
/// growth, then new entrants against the max weight of the first pass.
fn weigh_level(
    cfg: &WeightConfig,
    entries: impl Iterator<Item = (String, f64, Growth)> + Clone,
) -> BTreeMap<String, f64> {
    let mut weights: BTreeMap<String, f64> = BTreeMap::new();
    for (id, share, growth) in entries.clone() {
        if let Growth::Known(pct) = growth {
            weights.insert(id, known_weight(cfg, share, pct));
        }
    }

    let max_known = weights.values().copied().fold(None, |acc: Option<f64>, w| {
        Some(acc.map_or(w, |m| m.max(w)))
    });
    for (id, _, growth) in entries {
        if growth.is_new() {
            weights.insert(id, new_weight(cfg, max_known));
        }
    }
    weights
}

/// Compute sampling weights for every cluster and every item in `bundle`.
///
/// Deterministic given the bundle and config; weights are finite,
/// non-negative, and defined for every entry including new entrants.
pub fn compute_weights(bundle: &StatsBundle, cfg: &WeightConfig) -> WeightSet {
    let cluster_weights = weigh_level(
        cfg,
        bundle.clusters.iter().map(|(id, stats)| {
            (id.clone(), stats.usage_share_percent, stats.growth_percent)
        }),
    );

    let mut item_weights: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for (cluster_id, items) in &bundle.items {
        let weighed = weigh_level(
            cfg,
            items.iter().map(|(id, stats)| {
                (id.clone(), stats.usage_share_percent, stats.growth_percent)
            }),
        );
        item_weights.insert(cluster_id.clone(), weighed);
    }

    debug!(
        clusters = cluster_weights.len(),
        "computed sampling weights"
    );
    WeightSet {
        clusters: cluster_weights,
        items: item_weights,
    }
}
