//! `formulary`: deterministic weighted two-level sampling over
//! prescription-usage statistics.
//!
//! Designed for "feature selection" problems in generated content: you have a
//! flat list of prescribable items grouped into clusters, each carrying a
//! current-period and prior-period usage count, and you repeatedly pick a
//! handful of clusters (distinct) and a handful of items per cluster
//! (repeats allowed) with probability proportional to real-world usage and
//! year-over-year growth.
//!
//! The pipeline is strictly one-way:
//!
//! ```text
//! ItemRecord* -> aggregate -> StatsBundle -> compute_weights -> WeightSet
//!                                                                  |
//!                              SelectionResult <-- Selector::select +
//! ```
//!
//! **Goals:**
//! - **Deterministic by default**: same records + config + seed → same
//!   selection.  All randomness flows through an injected or seedable RNG.
//! - **Pure computation**: no I/O, no shared mutable state; every call is
//!   independent and reentrant.
//! - **Lossy input tolerated**: malformed records are skipped and counted,
//!   never fatal to a batch.
//!
//! **Stages:**
//! - [`aggregate`]: per-cluster totals and per-item shares, with a
//!   [`Growth`] variant (`Known` percent or `New`) instead of sentinel
//!   values.  Returns an [`AggregateSummary`] of skipped records.
//! - [`compute_weights`]: usage share dominates, growth nudges
//!   ([`WeightConfig::share_weight`] / [`WeightConfig::growth_weight`]);
//!   new entrants get a deliberate boost
//!   ([`WeightConfig::new_entry_multiplier`]).  Weights are always finite
//!   and non-negative.
//! - [`sample_without_replacement`] / [`sample_with_replacement`]: the two
//!   sampling disciplines — distinct clusters, repeatable items.
//! - [`Selector`]: composes the samplers into one request/response call
//!   with a seedable RNG and explicit error conditions
//!   ([`SelectError::ClusterNotFound`], [`SelectError::InvalidRequest`]).
//!
//! **Non-goals:**
//! - Not a data loader: parsing, validation of item codes, fetching and
//!   caching of reference text all belong to collaborators.  The optional
//!   [`dataset`] module only mirrors the external JSON shape.
//! - Not a question generator or store: callers consume a
//!   [`SelectionResult`]; nothing here touches HTTP, HTML, or a database.
//!
//! # Example
//!
//! ```rust
//! use formulary::{
//!     aggregate, compute_weights, ItemRecord, SelectionRequest, Selector, WeightConfig,
//! };
//!
//! let records = vec![
//!     ItemRecord::new("A02BC02", "A02BC", 8_094_200, Some(8_046_500)),
//!     ItemRecord::new("A02BC01", "A02BC", 5_280_000, Some(5_583_800)),
//!     ItemRecord::new("N02BE01", "N02BE", 3_100_000, None),
//! ];
//!
//! let (bundle, summary) = aggregate(&records);
//! assert_eq!(summary.skipped(), 0);
//!
//! let weights = compute_weights(&bundle, &WeightConfig::default());
//! let mut selector = Selector::with_seed(WeightConfig::default(), 42);
//! let result = selector
//!     .select(&weights, &SelectionRequest::new(2, 3))
//!     .unwrap();
//! assert!(result.clusters.len() <= 2);
//! ```

#![forbid(unsafe_code)]

/// Smallest weight an entry with positive usage share may carry.
///
/// Matches the 3-decimal rounding granularity of the weight formula, so a
/// tiny-but-present entry can never round itself out of selectability.
pub const MIN_WEIGHT: f64 = 0.001;

mod record;
pub use record::*;

mod stats;
pub use stats::*;

mod weight;
pub use weight::*;

mod sampler;
pub use sampler::*;

mod select;
pub use select::*;

pub mod dataset;
