//! Input records and the growth variant.
//!
//! An [`ItemRecord`] is one prescribable item as produced by an external
//! data-preparation step.  Counts are kept signed on purpose: the engine
//! does not trust its input, and a negative count must be detectable and
//! skippable rather than unrepresentable (see [`aggregate`][crate::aggregate]).

/// Year-over-year growth of an entry's usage.
///
/// A tagged variant instead of a sentinel value: an entry with no
/// prior-period usage is `New`, everything else carries a signed percentage
/// (rounded to one decimal by the aggregator).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Growth {
    /// Signed percentage change versus the prior period.
    Known(f64),
    /// No prior-period usage; the entry is new to the list.
    New,
}

impl Growth {
    /// `true` for entries with no prior-period history.
    pub fn is_new(&self) -> bool {
        matches!(self, Growth::New)
    }

    /// The growth percentage, or `None` for new entries.
    pub fn percent(&self) -> Option<f64> {
        match self {
            Growth::Known(p) => Some(*p),
            Growth::New => None,
        }
    }
}

/// One prescribable item: stable ids plus raw usage counts.
///
/// Immutable input; the engine never mutates records, it only aggregates
/// over them.  `prior_usage` of `None` means "no history" and is distinct
/// from `Some(0)` only in provenance — both produce [`Growth::New`] at the
/// aggregate level when the relevant total is zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemRecord {
    /// Stable unique id of the item (e.g. a full product-level code).
    pub item_id: String,
    /// Stable id of the cluster grouping related items.
    pub cluster_id: String,
    /// Current-period usage count.  Negative values mark the record as
    /// malformed and it will be skipped.
    pub current_usage: i64,
    /// Prior-period usage count, absent when the item has no history.
    pub prior_usage: Option<i64>,
}

impl ItemRecord {
    /// Convenience constructor.
    pub fn new(
        item_id: impl Into<String>,
        cluster_id: impl Into<String>,
        current_usage: i64,
        prior_usage: Option<i64>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            cluster_id: cluster_id.into(),
            current_usage,
            prior_usage,
        }
    }

    /// A record is well-formed when both ids are non-empty and no count is
    /// negative.  Ill-formed records are skipped by the aggregator, not
    /// rejected as errors.
    pub fn is_well_formed(&self) -> bool {
        !self.item_id.is_empty()
            && !self.cluster_id.is_empty()
            && self.current_usage >= 0
            && self.prior_usage.map_or(true, |p| p >= 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_variant_accessors() {
        assert!(Growth::New.is_new());
        assert_eq!(Growth::New.percent(), None);
        assert!(!Growth::Known(-5.4).is_new());
        assert_eq!(Growth::Known(-5.4).percent(), Some(-5.4));
    }

    #[test]
    fn well_formedness_catches_bad_records() {
        assert!(ItemRecord::new("A02BC02", "A02BC", 10, Some(5)).is_well_formed());
        assert!(ItemRecord::new("A02BC02", "A02BC", 0, None).is_well_formed());
        assert!(!ItemRecord::new("", "A02BC", 10, None).is_well_formed());
        assert!(!ItemRecord::new("A02BC02", "", 10, None).is_well_formed());
        assert!(!ItemRecord::new("A02BC02", "A02BC", -5, None).is_well_formed());
        assert!(!ItemRecord::new("A02BC02", "A02BC", 10, Some(-1)).is_well_formed());
    }
}
