//! Cycle-length estimation strategies.
//!
//! One entry point, [`estimate_cycle_length`], dispatches on the selected
//! [`Stage`] and always returns a usable day count: every internal failure
//! of the learned path is absorbed by falling back to the weighted average,
//! and every result is clamped to a plausible range.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::UserId;
use crate::models::{Profile, DEFAULT_CYCLE_LENGTH};
use crate::services::sequence_model::SequenceModelStore;
use crate::services::stage::Stage;

/// Exponential recency-weighting base for the weighted average.
///
/// 0.7 keeps older observations meaningfully influential, so a single
/// recent outlier cannot whipsaw the estimate.
pub const WEIGHT_BASE: f64 = 0.7;

/// Output range for the fixed and weighted estimators, in days.
pub const ESTIMATE_RANGE: std::ops::RangeInclusive<u32> = 20..=60;

/// Which computation actually produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    FixedDefault,
    WeightedAverage,
    LearnedSequence,
    /// Learned stage requested, but the model was unavailable and the
    /// weighted average answered instead.
    WeightedFallback,
}

impl EstimationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FixedDefault => "fixed_default",
            Self::WeightedAverage => "weighted_average",
            Self::LearnedSequence => "learned_sequence",
            Self::WeightedFallback => "weighted_average_fallback",
        }
    }
}

impl std::fmt::Display for EstimationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cycle-length estimate plus the method that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleEstimate {
    /// Predicted interval in days.
    pub days: u32,
    pub method: EstimationMethod,
}

fn clamp_estimate(days: u32) -> u32 {
    days.clamp(*ESTIMATE_RANGE.start(), *ESTIMATE_RANGE.end())
}

/// Recency-weighted average of the observed intervals.
///
/// The i-th of n observations (oldest first) carries weight
/// `WEIGHT_BASE^(n-i-1)`, normalized to sum to one, so the newest
/// observation weighs most. Returns the nominal default when no
/// observations survive filtering. Result is clamped to [`ESTIMATE_RANGE`].
pub fn weighted_average_cycle(intervals: &[u32]) -> u32 {
    if intervals.is_empty() {
        return DEFAULT_CYCLE_LENGTH;
    }

    let n = intervals.len();
    let weights: Vec<f64> = (0..n).map(|i| WEIGHT_BASE.powi((n - i - 1) as i32)).collect();
    let total: f64 = weights.iter().sum();

    let weighted_sum: f64 = intervals
        .iter()
        .zip(&weights)
        .map(|(len, w)| f64::from(*len) * w / total)
        .sum();

    clamp_estimate(weighted_sum.round() as u32)
}

/// Produce a cycle-length estimate for the given stage.
///
/// * `FixedDefault` trusts the profile's declared cycle length, clamped
///   defensively in case validation was skipped upstream.
/// * `WeightedAverage` uses [`weighted_average_cycle`].
/// * `LearnedSequence` consults the per-user stored model; any model
///   failure (missing or corrupt artifact, short history, numerical error)
///   falls back to the weighted average over the same intervals and is
///   reported as [`EstimationMethod::WeightedFallback`].
///
/// Deterministic for identical inputs when no training trigger runs in
/// between.
pub fn estimate_cycle_length(
    stage: Stage,
    intervals: &[u32],
    profile: &Profile,
    user: UserId,
    models: &SequenceModelStore,
) -> CycleEstimate {
    let estimate = match stage {
        Stage::FixedDefault => CycleEstimate {
            days: clamp_estimate(profile.clamped_cycle_length()),
            method: EstimationMethod::FixedDefault,
        },
        Stage::WeightedAverage => CycleEstimate {
            days: weighted_average_cycle(intervals),
            method: EstimationMethod::WeightedAverage,
        },
        Stage::LearnedSequence => match models.predict(user, intervals) {
            Ok(days) => CycleEstimate {
                days,
                method: EstimationMethod::LearnedSequence,
            },
            Err(e) => {
                warn!(user = user.0, error = %e, "learned model unavailable, using weighted fallback");
                CycleEstimate {
                    days: weighted_average_cycle(intervals),
                    method: EstimationMethod::WeightedFallback,
                }
            }
        },
    };
    debug!(
        user = user.0,
        intervals = intervals.len(),
        days = estimate.days,
        method = %estimate.method,
        "cycle length estimated"
    );
    estimate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use std::sync::Arc;

    fn models() -> SequenceModelStore {
        SequenceModelStore::new(Arc::new(LocalRepository::new()))
    }

    #[test]
    fn test_weighted_average_empty_returns_default() {
        assert_eq!(weighted_average_cycle(&[]), 28);
    }

    #[test]
    fn test_weighted_average_single_value() {
        assert_eq!(weighted_average_cycle(&[31]), 31);
    }

    #[test]
    fn test_weighted_average_favors_recent() {
        // With base 0.7 the newer 40 outweighs the older 20, so the result
        // lands above the unweighted mean of 30.
        let result = weighted_average_cycle(&[20, 40]);
        assert!(result > 30, "expected recency bias, got {}", result);
        // weights 0.7/1.7 and 1.0/1.7 -> ~31.8
        assert_eq!(result, 32);
    }

    #[test]
    fn test_weighted_average_clamped() {
        // All observations at the top of the plausible-interval range stay
        // inside the estimate range untouched.
        assert_eq!(weighted_average_cycle(&[45, 45, 45]), 45);
    }

    #[test]
    fn test_fixed_default_uses_profile() {
        let profile = Profile {
            cycle_length: 31,
            period_length: 5,
        };
        let estimate = estimate_cycle_length(
            Stage::FixedDefault,
            &[],
            &profile,
            UserId::new(1),
            &models(),
        );
        assert_eq!(estimate.days, 31);
        assert_eq!(estimate.method, EstimationMethod::FixedDefault);
    }

    #[test]
    fn test_fixed_default_clamps_bad_profile() {
        // Out-of-range profile values must not crash the estimator: they
        // are pulled into the declared range first, then into the estimate
        // range, so 5 lands on 20 and 90 on 45.
        let profile = Profile {
            cycle_length: 5,
            period_length: 5,
        };
        let estimate = estimate_cycle_length(
            Stage::FixedDefault,
            &[],
            &profile,
            UserId::new(1),
            &models(),
        );
        assert_eq!(estimate.days, 20);

        let profile = Profile {
            cycle_length: 90,
            period_length: 5,
        };
        let estimate = estimate_cycle_length(
            Stage::FixedDefault,
            &[],
            &profile,
            UserId::new(1),
            &models(),
        );
        assert_eq!(estimate.days, 45);
    }

    #[test]
    fn test_learned_with_short_history_falls_back() {
        let profile = Profile::default();
        let intervals = vec![28, 30, 29];
        let estimate = estimate_cycle_length(
            Stage::LearnedSequence,
            &intervals,
            &profile,
            UserId::new(1),
            &models(),
        );
        assert_eq!(estimate.method, EstimationMethod::WeightedFallback);
        assert_eq!(estimate.days, weighted_average_cycle(&intervals));
    }

    #[test]
    fn test_estimator_is_idempotent() {
        let profile = Profile::default();
        let intervals = vec![28, 27, 29, 28, 30, 28, 29, 27, 28, 29];
        let store = models();
        let first = estimate_cycle_length(
            Stage::LearnedSequence,
            &intervals,
            &profile,
            UserId::new(1),
            &store,
        );
        let second = estimate_cycle_length(
            Stage::LearnedSequence,
            &intervals,
            &profile,
            UserId::new(1),
            &store,
        );
        assert_eq!(first, second);
        assert_eq!(first.method, EstimationMethod::LearnedSequence);
    }
}
