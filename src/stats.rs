//! Statistics aggregation: raw records → per-cluster and per-item stats.
//!
//! [`aggregate`] is a pure function over its input.  Malformed records are
//! skipped individually and tallied in an [`AggregateSummary`]; one bad row
//! never aborts a batch.  Output maps are `BTreeMap`s so iteration order is
//! stable and re-aggregation of the same input is bit-identical.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{Growth, ItemRecord};

/// Round to one decimal place, the resolution used for all percentages.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Derived statistics for one cluster.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterStats {
    /// Number of well-formed records in the cluster.
    pub item_count: usize,
    /// Sum of member current-period usage.
    pub total_current_usage: i64,
    /// Sum of member prior-period usage (absent history counted as 0).
    pub total_prior_usage: i64,
    /// Share of this cluster's current usage among all clusters, 0–100.
    pub usage_share_percent: f64,
    /// Growth of the cluster total versus the prior period.
    pub growth_percent: Growth,
}

/// Derived statistics for one item within its cluster.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemStats {
    /// Share of this item's current usage within its cluster, 0–100.
    pub usage_share_percent: f64,
    /// Growth of the item's own usage versus the prior period.
    pub growth_percent: Growth,
}

/// The two-level statistics tree produced by [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsBundle {
    /// Per-cluster stats, keyed by cluster id.
    pub clusters: BTreeMap<String, ClusterStats>,
    /// Per-item stats, keyed by cluster id then item id.
    pub items: BTreeMap<String, BTreeMap<String, ItemStats>>,
}

impl StatsBundle {
    /// `true` when no cluster survived aggregation.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Counts of records accepted and skipped by one [`aggregate`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregateSummary {
    /// Records presented to the aggregator.
    pub records_in: usize,
    /// Records that contributed to the stats.
    pub records_used: usize,
    /// Records skipped for a missing item or cluster id.
    pub skipped_missing_id: usize,
    /// Records skipped for a negative usage count.
    pub skipped_negative_usage: usize,
}

impl AggregateSummary {
    /// Total number of skipped records.
    pub fn skipped(&self) -> usize {
        self.skipped_missing_id + self.skipped_negative_usage
    }
}

/// Growth of `current` versus `prior`, with `prior == 0` meaning "new".
fn growth_of(current: i64, prior: i64) -> Growth {
    if prior == 0 {
        Growth::New
    } else {
        Growth::Known(round1(100.0 * (current - prior) as f64 / prior as f64))
    }
}

/// Aggregate raw records into per-cluster and per-item statistics.
///
/// - Cluster `usage_share_percent` is relative to the grand total across
///   all clusters; item shares are relative to their own cluster's total.
///   When the relevant total is 0, every share under it is 0.
/// - Growth is [`Growth::New`] whenever the relevant prior total is 0,
///   otherwise a signed percentage rounded to one decimal.
/// - Malformed records (empty id, negative count) are skipped and counted
///   in the returned [`AggregateSummary`].  A cluster whose records were
///   all skipped does not appear in the bundle at all.
///
/// Pure and idempotent: identical input yields identical output.
pub fn aggregate(records: &[ItemRecord]) -> (StatsBundle, AggregateSummary) {
    let mut summary = AggregateSummary {
        records_in: records.len(),
        ..AggregateSummary::default()
    };

    // Group well-formed records by cluster, first-appearance order is
    // irrelevant because BTreeMap orders by key.
    let mut by_cluster: BTreeMap<&str, Vec<&ItemRecord>> = BTreeMap::new();
    for rec in records {
        if rec.item_id.is_empty() || rec.cluster_id.is_empty() {
            summary.skipped_missing_id += 1;
            debug!(item_id = %rec.item_id, cluster_id = %rec.cluster_id, "skipping record with missing id");
            continue;
        }
        if rec.current_usage < 0 || rec.prior_usage.map_or(false, |p| p < 0) {
            summary.skipped_negative_usage += 1;
            debug!(item_id = %rec.item_id, "skipping record with negative usage");
            continue;
        }
        summary.records_used += 1;
        by_cluster.entry(rec.cluster_id.as_str()).or_default().push(rec);
    }

    let grand_total: i64 = by_cluster
        .values()
        .flat_map(|members| members.iter())
        .map(|r| r.current_usage)
        .sum();

    let mut bundle = StatsBundle::default();
    for (cluster_id, members) in &by_cluster {
        let total_current: i64 = members.iter().map(|r| r.current_usage).sum();
        let total_prior: i64 = members.iter().map(|r| r.prior_usage.unwrap_or(0)).sum();

        let share = if grand_total > 0 {
            round1(100.0 * total_current as f64 / grand_total as f64)
        } else {
            0.0
        };

        bundle.clusters.insert(
            (*cluster_id).to_string(),
            ClusterStats {
                item_count: members.len(),
                total_current_usage: total_current,
                total_prior_usage: total_prior,
                usage_share_percent: share,
                growth_percent: growth_of(total_current, total_prior),
            },
        );

        let mut item_stats: BTreeMap<String, ItemStats> = BTreeMap::new();
        for rec in members {
            let item_share = if total_current > 0 {
                round1(100.0 * rec.current_usage as f64 / total_current as f64)
            } else {
                0.0
            };
            item_stats.insert(
                rec.item_id.clone(),
                ItemStats {
                    usage_share_percent: item_share,
                    growth_percent: growth_of(rec.current_usage, rec.prior_usage.unwrap_or(0)),
                },
            );
        }
        bundle.items.insert((*cluster_id).to_string(), item_stats);
    }

    (bundle, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proton_pump_records() -> Vec<ItemRecord> {
        vec![
            ItemRecord::new("A02BC02", "A02BC", 8_094_200, Some(8_046_500)),
            ItemRecord::new("A02BC01", "A02BC", 5_280_000, Some(5_583_800)),
            ItemRecord::new("A02BC05", "A02BC", 1_111_100, Some(1_131_700)),
        ]
    }

    #[test]
    fn cluster_totals_and_growth_match_members() {
        let (bundle, summary) = aggregate(&proton_pump_records());
        assert_eq!(summary.records_used, 3);
        assert_eq!(summary.skipped(), 0);

        let cluster = &bundle.clusters["A02BC"];
        assert_eq!(cluster.item_count, 3);
        assert_eq!(cluster.total_current_usage, 14_485_300);
        assert_eq!(cluster.total_prior_usage, 14_762_000);
        // Single cluster, so it owns 100% of the grand total.
        assert_eq!(cluster.usage_share_percent, 100.0);
        assert_eq!(cluster.growth_percent, Growth::Known(-1.9));
    }

    #[test]
    fn item_shares_are_within_cluster() {
        let (bundle, _) = aggregate(&proton_pump_records());
        let items = &bundle.items["A02BC"];
        assert_eq!(items["A02BC02"].usage_share_percent, 55.9);
        assert_eq!(items["A02BC01"].usage_share_percent, 36.5);
        assert_eq!(items["A02BC05"].usage_share_percent, 7.7);
        assert_eq!(items["A02BC01"].growth_percent, Growth::Known(-5.4));
    }

    #[test]
    fn zero_prior_total_is_new() {
        let records = vec![ItemRecord::new("N02BE01", "N02BE", 1_000, None)];
        let (bundle, _) = aggregate(&records);
        assert_eq!(bundle.clusters["N02BE"].growth_percent, Growth::New);
        assert_eq!(bundle.items["N02BE"]["N02BE01"].growth_percent, Growth::New);
    }

    #[test]
    fn zero_grand_total_gives_zero_shares() {
        let records = vec![
            ItemRecord::new("a1", "a", 0, Some(10)),
            ItemRecord::new("b1", "b", 0, Some(20)),
        ];
        let (bundle, _) = aggregate(&records);
        assert_eq!(bundle.clusters["a"].usage_share_percent, 0.0);
        assert_eq!(bundle.clusters["b"].usage_share_percent, 0.0);
        assert_eq!(bundle.items["a"]["a1"].usage_share_percent, 0.0);
    }

    #[test]
    fn malformed_records_are_skipped_and_counted() {
        let mut records = proton_pump_records();
        records.push(ItemRecord::new("A02BC03", "A02BC", -5, Some(10)));
        records.push(ItemRecord::new("", "A02BC", 100, None));

        let (bundle, summary) = aggregate(&records);
        assert_eq!(summary.records_in, 5);
        assert_eq!(summary.records_used, 3);
        assert_eq!(summary.skipped_negative_usage, 1);
        assert_eq!(summary.skipped_missing_id, 1);
        // Totals exclude the skipped rows.
        assert_eq!(bundle.clusters["A02BC"].total_current_usage, 14_485_300);
        assert_eq!(bundle.clusters["A02BC"].item_count, 3);
    }

    #[test]
    fn cluster_with_only_malformed_records_is_absent() {
        let mut records = proton_pump_records();
        records.push(ItemRecord::new("X01AA01", "X01AA", -1, None));
        let (bundle, summary) = aggregate(&records);
        assert!(!bundle.clusters.contains_key("X01AA"));
        assert_eq!(summary.skipped(), 1);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let records = proton_pump_records();
        let first = aggregate(&records);
        let second = aggregate(&records);
        assert_eq!(first, second);
    }
}
