//! Three-stage estimation strategy selection.
//!
//! The estimator tier is chosen purely from history depth: trust the
//! declared profile until three complete cycles exist, average with recency
//! weighting until seven, then hand over to the learned sequence model.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Estimation strategy tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fewer than 3 observed cycles: use the user-declared cycle length.
    FixedDefault,
    /// 3 to 6 observed cycles: exponentially recency-weighted average.
    WeightedAverage,
    /// 7 or more observed cycles: per-user learned sequence model.
    LearnedSequence,
}

/// Minimum complete cycles before observed history outweighs the declared
/// default.
pub const WEIGHTED_THRESHOLD: usize = 3;
/// Minimum complete cycles before the learned sequence model applies.
pub const LEARNED_THRESHOLD: usize = 7;

/// Select the estimation stage for a given number of complete observed
/// cycles (confirmed occurrence count minus one).
pub fn select_stage(cycle_count: usize) -> Stage {
    let stage = if cycle_count < WEIGHTED_THRESHOLD {
        Stage::FixedDefault
    } else if cycle_count < LEARNED_THRESHOLD {
        Stage::WeightedAverage
    } else {
        Stage::LearnedSequence
    };
    debug!(cycle_count, ?stage, "stage selected");
    stage
}
