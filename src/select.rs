//! Selection orchestration: one call from weights to a structured result.
//!
//! A [`Selector`] owns the RNG (seedable, deterministic by default) and the
//! [`WeightConfig`] so repeated requests against changing weight sets stay
//! reproducible.  Request-level problems (`ClusterNotFound`,
//! `InvalidRequest`) are surfaced as errors; "nothing eligible" is a valid
//! business outcome and comes back as an empty result instead.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::{
    aggregate, compute_weights, sample_with_replacement, sample_without_replacement,
    AggregateSummary, ItemRecord, WeightConfig, WeightSet,
};

/// Request-level failures of [`Selector::select`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    /// A forced cluster id does not exist in the weight set.
    #[error("cluster `{0}` not found")]
    ClusterNotFound(String),
    /// The request itself is invalid, e.g. a negative count.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// One selection request.
///
/// Counts are signed because requests typically originate outside the
/// engine (config files, API payloads); negatives are rejected with
/// [`SelectError::InvalidRequest`] before any sampling happens.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionRequest {
    /// Number of distinct clusters to select.
    pub num_clusters: i64,
    /// Number of items to select per cluster, repeats allowed.
    pub num_items_per_cluster: i64,
    /// Skip cluster sampling and use exactly this cluster.
    pub forced_cluster: Option<String>,
}

impl SelectionRequest {
    /// A request for `num_clusters` clusters with `num_items_per_cluster`
    /// items each.
    pub fn new(num_clusters: i64, num_items_per_cluster: i64) -> Self {
        Self {
            num_clusters,
            num_items_per_cluster,
            forced_cluster: None,
        }
    }

    /// Pin the selection to one specific cluster.
    pub fn forced(cluster_id: impl Into<String>, num_items_per_cluster: i64) -> Self {
        Self {
            num_clusters: 1,
            num_items_per_cluster,
            forced_cluster: Some(cluster_id.into()),
        }
    }
}

/// The items selected for one cluster.
///
/// `item_ids` may be empty: a cluster whose items all carry weight 0 is
/// still reported, so callers can detect starvation instead of silently
/// losing a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterSelection {
    /// The selected cluster.
    pub cluster_id: String,
    /// Selected items, repeats allowed.
    pub item_ids: Vec<String>,
}

/// Ordered outcome of one selection request.
///
/// Cluster ids are pairwise distinct; item ids within one cluster may
/// repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionResult {
    /// Selected clusters in draw order.
    pub clusters: Vec<ClusterSelection>,
}

impl SelectionResult {
    /// `true` when no cluster was eligible.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total number of selected items across all clusters.
    pub fn total_items(&self) -> usize {
        self.clusters.iter().map(|c| c.item_ids.len()).sum()
    }
}

/// Two-level selector: distinct clusters first, then items per cluster.
#[derive(Debug, Clone)]
pub struct Selector {
    cfg: WeightConfig,
    rng: StdRng,
}

impl Selector {
    /// Create a selector with a deterministic fixed seed (0).
    pub fn new(cfg: WeightConfig) -> Self {
        Self::with_seed(cfg, 0)
    }

    /// Create with an explicit seed (reproducible).
    pub fn with_seed(cfg: WeightConfig, seed: u64) -> Self {
        Self {
            cfg,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The weight configuration this selector was built with.
    pub fn config(&self) -> &WeightConfig {
        &self.cfg
    }

    /// Run one selection request against a precomputed [`WeightSet`].
    ///
    /// - With `forced_cluster`, the cluster sampler is skipped and exactly
    ///   that cluster is used; an unknown id fails with
    ///   [`SelectError::ClusterNotFound`].
    /// - Otherwise up to `num_clusters` distinct clusters are drawn; fewer
    ///   come back when fewer carry positive weight, and none at all is an
    ///   empty result, not an error.
    /// - Per selected cluster, `num_items_per_cluster` items are drawn with
    ///   replacement.  A starved cluster keeps its slot with an empty item
    ///   list.
    pub fn select(
        &mut self,
        weights: &WeightSet,
        request: &SelectionRequest,
    ) -> Result<SelectionResult, SelectError> {
        if request.num_clusters < 0 {
            return Err(SelectError::InvalidRequest(format!(
                "num_clusters must be non-negative, got {}",
                request.num_clusters
            )));
        }
        if request.num_items_per_cluster < 0 {
            return Err(SelectError::InvalidRequest(format!(
                "num_items_per_cluster must be non-negative, got {}",
                request.num_items_per_cluster
            )));
        }

        let selected_clusters = match &request.forced_cluster {
            Some(id) => {
                if !weights.clusters.contains_key(id) {
                    return Err(SelectError::ClusterNotFound(id.clone()));
                }
                vec![id.clone()]
            }
            None => sample_without_replacement(
                &weights.clusters,
                request.num_clusters as usize,
                &mut self.rng,
            ),
        };

        let items_per_cluster = request.num_items_per_cluster as usize;
        let mut result = SelectionResult::default();
        for cluster_id in selected_clusters {
            let item_weights = weights.items.get(&cluster_id);
            let item_ids = match item_weights {
                Some(w) => sample_with_replacement(w, items_per_cluster, &mut self.rng),
                None => Vec::new(),
            };
            if item_ids.is_empty() && items_per_cluster > 0 {
                debug!(%cluster_id, "selected cluster has no eligible items");
            }
            result.clusters.push(ClusterSelection {
                cluster_id,
                item_ids,
            });
        }

        debug!(
            clusters = result.clusters.len(),
            items = result.total_items(),
            "selection complete"
        );
        Ok(result)
    }

    /// End-to-end convenience: aggregate `records`, weigh them with this
    /// selector's config, then run `request`.
    ///
    /// Returns the [`AggregateSummary`] alongside the result so callers see
    /// how many records were skipped.
    pub fn select_from_records(
        &mut self,
        records: &[ItemRecord],
        request: &SelectionRequest,
    ) -> Result<(SelectionResult, AggregateSummary), SelectError> {
        let (bundle, summary) = aggregate(records);
        let weights = compute_weights(&bundle, &self.cfg);
        let result = self.select(&weights, request)?;
        Ok((result, summary))
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new(WeightConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn weight_set(clusters: Vec<(&str, f64)>, items: Vec<(&str, Vec<(&str, f64)>)>) -> WeightSet {
        WeightSet {
            clusters: clusters.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            items: items
                .iter()
                .map(|(c, ws)| {
                    (
                        c.to_string(),
                        ws.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
                    )
                })
                .collect(),
        }
    }

    fn two_cluster_set() -> WeightSet {
        weight_set(
            vec![("x", 10.0), ("y", 5.0)],
            vec![
                ("x", vec![("x1", 8.0), ("x2", 2.0)]),
                ("y", vec![("y1", 5.0)]),
            ],
        )
    }

    #[test]
    fn forced_cluster_skips_cluster_sampling() {
        let mut selector = Selector::with_seed(WeightConfig::default(), 9);
        let result = selector
            .select(&two_cluster_set(), &SelectionRequest::forced("y", 3))
            .unwrap();
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].cluster_id, "y");
        assert_eq!(result.clusters[0].item_ids, vec!["y1"; 3]);
    }

    #[test]
    fn forced_unknown_cluster_is_not_found() {
        let mut selector = Selector::default();
        let err = selector
            .select(&two_cluster_set(), &SelectionRequest::forced("zzz", 3))
            .unwrap_err();
        assert_eq!(err, SelectError::ClusterNotFound("zzz".to_string()));
    }

    #[test]
    fn negative_counts_are_rejected_before_sampling() {
        let mut selector = Selector::default();
        let ws = two_cluster_set();
        assert!(matches!(
            selector.select(&ws, &SelectionRequest::new(-1, 3)),
            Err(SelectError::InvalidRequest(_))
        ));
        assert!(matches!(
            selector.select(&ws, &SelectionRequest::new(2, -1)),
            Err(SelectError::InvalidRequest(_))
        ));
    }

    #[test]
    fn no_eligible_cluster_yields_empty_result() {
        let ws = weight_set(vec![("x", 0.0)], vec![("x", vec![("x1", 1.0)])]);
        let mut selector = Selector::with_seed(WeightConfig::default(), 5);
        let result = selector.select(&ws, &SelectionRequest::new(3, 2)).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn starved_cluster_keeps_its_slot() {
        let ws = weight_set(vec![("x", 10.0)], vec![("x", vec![("x1", 0.0)])]);
        let mut selector = Selector::with_seed(WeightConfig::default(), 5);
        let result = selector.select(&ws, &SelectionRequest::new(1, 4)).unwrap();
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].cluster_id, "x");
        assert!(result.clusters[0].item_ids.is_empty());
    }

    #[test]
    fn cluster_ids_in_a_result_are_distinct() {
        let ws = two_cluster_set();
        let mut selector = Selector::with_seed(WeightConfig::default(), 77);
        for _ in 0..50 {
            let result = selector.select(&ws, &SelectionRequest::new(2, 1)).unwrap();
            assert_eq!(result.clusters.len(), 2);
            assert_ne!(result.clusters[0].cluster_id, result.clusters[1].cluster_id);
        }
    }

    #[test]
    fn select_from_records_reports_skips() {
        let records = vec![
            ItemRecord::new("x1", "x", 100, Some(50)),
            ItemRecord::new("x2", "x", -5, Some(50)),
        ];
        let mut selector = Selector::with_seed(WeightConfig::default(), 1);
        let (result, summary) = selector
            .select_from_records(&records, &SelectionRequest::new(1, 2))
            .unwrap();
        assert_eq!(summary.skipped(), 1);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].item_ids, vec!["x1"; 2]);
    }

    #[test]
    fn deterministic_given_same_seed() {
        let ws = two_cluster_set();
        let req = SelectionRequest::new(2, 3);
        let mut s1 = Selector::with_seed(WeightConfig::default(), 123);
        let mut s2 = Selector::with_seed(WeightConfig::default(), 123);
        for _ in 0..10 {
            assert_eq!(s1.select(&ws, &req).unwrap(), s2.select(&ws, &req).unwrap());
        }
    }
}
