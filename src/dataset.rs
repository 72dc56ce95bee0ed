//! Mirror of the external dataset shape.
//!
//! The engine itself consumes [`ItemRecord`]s; loading, parsing, and code
//! validation belong to an external collaborator.  This module only mirrors
//! the JSON-shaped structure that collaborator produces, so a caller with
//! the `serde` feature can deserialize it and flatten it into records in
//! one step.  No I/O happens here.
//!
//! ```text
//! { "<cluster_id>": { "name": ...,
//!                     "items": [ { "item_code": ..., "item_name": ...,
//!                                  "current_usage": ..., "prior_usage": ... } ] } }
//! ```

use std::collections::BTreeMap;

use crate::ItemRecord;

/// One item entry of the external dataset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetItem {
    /// Stable item code; format/length validation is the loader's job.
    pub item_code: String,
    /// Human-readable item name; not used by the engine.
    pub item_name: String,
    /// Current-period usage count.
    pub current_usage: i64,
    /// Prior-period usage count, absent for items without history.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub prior_usage: Option<i64>,
}

/// One cluster entry of the external dataset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetCluster {
    /// Human-readable cluster name; not used by the engine.
    pub name: String,
    /// The cluster's items.
    pub items: Vec<DatasetItem>,
}

/// The full dataset, keyed by cluster id.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct Dataset(pub BTreeMap<String, DatasetCluster>);

impl Dataset {
    /// Flatten into the record sequence the engine aggregates over.
    ///
    /// Counts pass through unvalidated; the aggregator skips and counts
    /// anything malformed.
    pub fn records(&self) -> Vec<ItemRecord> {
        self.0
            .iter()
            .flat_map(|(cluster_id, cluster)| {
                cluster.items.iter().map(move |item| {
                    ItemRecord::new(
                        item.item_code.clone(),
                        cluster_id.clone(),
                        item.current_usage,
                        item.prior_usage,
                    )
                })
            })
            .collect()
    }
}
