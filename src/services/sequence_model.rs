//! Per-user learned sequence model for cycle-length prediction.
//!
//! The model regresses the next interval length from a sliding window of
//! the six most recent intervals plus summary statistics (mean, standard
//! deviation, min, max, median, first-difference trend), twelve features in
//! all. Features are min-max normalized by a scaler fitted at training
//! time; the regressor itself is a ridge regression solved by normal
//! equations, which keeps training deterministic and fast.
//!
//! Both fitted artifacts (weights and scaler parameters) are persisted per
//! user through an [`ArtifactRepository`] and reused across calls without
//! retraining. Retraining happens only through the external
//! [`SequenceModelStore::maybe_train`] trigger; the prediction path never
//! trains implicitly unless no artifact exists yet. A per-user lock
//! serializes training and is also held while inference loads the stored
//! pair, so a prediction always sees a model and scaler from the same
//! training run.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::UserId;
use crate::db::{ArtifactKind, ArtifactRepository, RepositoryError, StoredArtifact};
use crate::models::Occurrence;
use crate::services::intervals::{cycle_count, extract_intervals};
use crate::services::stage::LEARNED_THRESHOLD;

/// Length of the interval window the model looks at.
pub const SEQUENCE_LENGTH: usize = 6;
/// Window values plus mean, std, min, max, median, trend.
pub const FEATURE_DIM: usize = SEQUENCE_LENGTH + 6;
/// Minimum training windows required for a fit.
pub const MIN_TRAINING_WINDOWS: usize = 3;
/// Output range for the learned estimator, in days. Intentionally tighter
/// than the weighted-average range.
pub const LEARNED_OUTPUT_RANGE: std::ops::RangeInclusive<u32> = 20..=45;

/// Ridge regularization strength.
const RIDGE_LAMBDA: f64 = 1e-2;

pub type ModelResult<T> = Result<T, ModelError>;

/// Internal failure modes of the learned estimator. These never reach the
/// end user; the estimation path absorbs them by falling back to the
/// weighted average.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("insufficient history: {windows} training windows, need {needed}")]
    InsufficientHistory { windows: usize, needed: usize },

    #[error("not enough intervals for an inference window: {have}, need {need}")]
    ShortWindow { have: usize, need: usize },

    #[error("no stored model for this user")]
    ArtifactMissing,

    #[error("corrupt artifact payload: {0}")]
    Decode(String),

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Fitted min-max feature normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    mins: Vec<f64>,
    maxs: Vec<f64>,
}

impl FeatureScaler {
    /// Fit per-column minima and maxima over the training rows.
    fn fit(rows: &[Vec<f64>]) -> Self {
        let dim = rows.first().map_or(0, Vec::len);
        let mut mins = vec![f64::INFINITY; dim];
        let mut maxs = vec![f64::NEG_INFINITY; dim];
        for row in rows {
            for (col, value) in row.iter().enumerate() {
                mins[col] = mins[col].min(*value);
                maxs[col] = maxs[col].max(*value);
            }
        }
        Self { mins, maxs }
    }

    /// Scale one feature row to [0, 1]. Constant columns map to 0.
    fn transform(&self, row: &[f64]) -> ModelResult<Vec<f64>> {
        if row.len() != self.mins.len() {
            return Err(ModelError::Decode(format!(
                "feature dimension mismatch: {} vs {}",
                row.len(),
                self.mins.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.mins.iter().zip(&self.maxs))
            .map(|(value, (min, max))| {
                let range = max - min;
                if range > 0.0 {
                    (value - min) / range
                } else {
                    0.0
                }
            })
            .collect())
    }
}

/// Fitted ridge-regression weights (one per feature, plus a bias term).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceModel {
    weights: Vec<f64>,
    bias: f64,
}

impl SequenceModel {
    /// Raw (unclamped) prediction for one scaled feature row.
    fn predict(&self, scaled: &[f64]) -> ModelResult<f64> {
        if scaled.len() != self.weights.len() {
            return Err(ModelError::Decode(format!(
                "weight dimension mismatch: {} vs {}",
                scaled.len(),
                self.weights.len()
            )));
        }
        let dot: f64 = self
            .weights
            .iter()
            .zip(scaled)
            .map(|(w, x)| w * x)
            .sum();
        let value = dot + self.bias;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::Numerical("non-finite prediction".to_string()))
        }
    }
}

/// Feature vector for one window of [`SEQUENCE_LENGTH`] intervals.
fn window_features(window: &[f64]) -> Vec<f64> {
    debug_assert_eq!(window.len(), SEQUENCE_LENGTH);
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = window.iter().copied().fold(f64::INFINITY, f64::min);
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut sorted = window.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let trend = window[window.len() - 1] - window[window.len() - 2];

    let mut features = window.to_vec();
    features.extend([mean, variance.sqrt(), min, max, median, trend]);
    features
}

/// Build (features, target) training pairs from the filtered interval
/// sequence: every run of six consecutive intervals predicts the next one.
fn build_training_set(intervals: &[u32]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let values: Vec<f64> = intervals.iter().map(|v| f64::from(*v)).collect();
    let mut rows = Vec::new();
    let mut targets = Vec::new();
    if values.len() > SEQUENCE_LENGTH {
        for i in 0..values.len() - SEQUENCE_LENGTH {
            rows.push(window_features(&values[i..i + SEQUENCE_LENGTH]));
            targets.push(values[i + SEQUENCE_LENGTH]);
        }
    }
    (rows, targets)
}

/// The single most recent window's feature vector, for inference.
fn latest_features(intervals: &[u32]) -> ModelResult<Vec<f64>> {
    if intervals.len() < SEQUENCE_LENGTH {
        return Err(ModelError::ShortWindow {
            have: intervals.len(),
            need: SEQUENCE_LENGTH,
        });
    }
    let values: Vec<f64> = intervals[intervals.len() - SEQUENCE_LENGTH..]
        .iter()
        .map(|v| f64::from(*v))
        .collect();
    Ok(window_features(&values))
}

/// Fit scaler and model on the filtered interval sequence.
pub fn train(intervals: &[u32]) -> ModelResult<(SequenceModel, FeatureScaler)> {
    let (rows, targets) = build_training_set(intervals);
    if rows.len() < MIN_TRAINING_WINDOWS {
        return Err(ModelError::InsufficientHistory {
            windows: rows.len(),
            needed: MIN_TRAINING_WINDOWS,
        });
    }

    let scaler = FeatureScaler::fit(&rows);
    let n = rows.len();
    let dim = FEATURE_DIM + 1; // augmented with a bias column

    let mut x = DMatrix::zeros(n, dim);
    for (i, row) in rows.iter().enumerate() {
        let scaled = scaler.transform(row)?;
        for (j, value) in scaled.iter().enumerate() {
            x[(i, j)] = *value;
        }
        x[(i, FEATURE_DIM)] = 1.0;
    }
    let y = DVector::from_vec(targets);

    // Normal equations with ridge regularization: (XᵀX + λI) w = Xᵀy.
    let xtx = x.transpose() * &x + DMatrix::identity(dim, dim) * RIDGE_LAMBDA;
    let xty = x.transpose() * y;
    let solution = xtx
        .cholesky()
        .ok_or_else(|| ModelError::Numerical("normal equations not positive definite".to_string()))?
        .solve(&xty);

    let mut weights: Vec<f64> = solution.iter().copied().collect();
    let bias = weights.pop().unwrap_or(0.0);
    if weights.iter().any(|w| !w.is_finite()) || !bias.is_finite() {
        return Err(ModelError::Numerical("non-finite weights".to_string()));
    }

    Ok((SequenceModel { weights, bias }, scaler))
}

fn encode_artifact<T: Serialize>(value: &T) -> ModelResult<StoredArtifact> {
    let payload = serde_json::to_string(value)
        .map_err(|e| ModelError::Decode(format!("failed to encode artifact: {}", e)))?;
    Ok(StoredArtifact::new(payload))
}

fn decode_artifact<T: for<'de> Deserialize<'de>>(artifact: &StoredArtifact) -> ModelResult<T> {
    if !artifact.verify() {
        return Err(ModelError::Decode("checksum mismatch".to_string()));
    }
    serde_json::from_str(&artifact.payload)
        .map_err(|e| ModelError::Decode(format!("failed to decode artifact: {}", e)))
}

/// Per-user model persistence and serialization around an
/// [`ArtifactRepository`].
///
/// The store is constructed with an explicit repository and owns nothing
/// but the per-user training locks, so there is no hidden cross-request
/// state and tests can hand it an isolated backend.
pub struct SequenceModelStore {
    repo: Arc<dyn ArtifactRepository>,
    training_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl SequenceModelStore {
    pub fn new(repo: Arc<dyn ArtifactRepository>) -> Self {
        Self {
            repo,
            training_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn ArtifactRepository> {
        &self.repo
    }

    fn training_lock(&self, user: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.training_locks.lock();
        locks.entry(user.0).or_default().clone()
    }

    /// Train on the user's intervals and persist both artifacts.
    ///
    /// At most one training runs per user at a time; a second caller blocks
    /// until the first finishes and then retrains on its own input.
    pub fn train_and_store(&self, user: UserId, intervals: &[u32]) -> ModelResult<()> {
        let lock = self.training_lock(user);
        let _guard = lock.lock();

        let (model, scaler) = train(intervals)?;
        self.repo
            .store(user, ArtifactKind::Model, &encode_artifact(&model)?)?;
        self.repo
            .store(user, ArtifactKind::Scaler, &encode_artifact(&scaler)?)?;
        info!(user = user.0, intervals = intervals.len(), "model trained and stored");
        Ok(())
    }

    /// External training trigger, called at confirmed-occurrence milestones
    /// (e.g. after the user confirms a new occurrence). Returns whether a
    /// training actually ran.
    ///
    /// Below the learned-stage threshold this is a no-op, so callers can
    /// invoke it unconditionally after every confirmation.
    pub fn maybe_train(&self, user: UserId, occurrences: &[Occurrence]) -> ModelResult<bool> {
        let cycles = cycle_count(occurrences);
        if cycles < LEARNED_THRESHOLD {
            debug!(user = user.0, cycles, "below learned threshold, skipping training");
            return Ok(false);
        }
        let intervals = extract_intervals(occurrences);
        self.train_and_store(user, &intervals)?;
        Ok(true)
    }

    /// Predict the next interval length for a user.
    ///
    /// Loads the stored artifact pair, training once if none exists yet,
    /// then runs the latest window through the model. The result is rounded
    /// and clamped to [`LEARNED_OUTPUT_RANGE`]. Any failure is returned as
    /// a [`ModelError`] for the caller to absorb.
    pub fn predict(&self, user: UserId, intervals: &[u32]) -> ModelResult<u32> {
        let (model, scaler) = match self.load_artifacts(user) {
            Ok(pair) => pair,
            Err(ModelError::ArtifactMissing) => {
                debug!(user = user.0, "no stored model, training on first use");
                self.train_and_store(user, intervals)?;
                self.load_artifacts(user)?
            }
            Err(e) => return Err(e),
        };

        let features = latest_features(intervals)?;
        let scaled = scaler.transform(&features)?;
        let raw = model.predict(&scaled)?;
        let clamped = (raw.round() as i64).clamp(
            i64::from(*LEARNED_OUTPUT_RANGE.start()),
            i64::from(*LEARNED_OUTPUT_RANGE.end()),
        ) as u32;
        debug!(user = user.0, raw, clamped, "sequence model inference");
        Ok(clamped)
    }

    /// Load the stored model and scaler as one consistent pair.
    ///
    /// Both reads happen under the per-user training lock so a concurrent
    /// [`train_and_store`](Self::train_and_store) cannot interleave between
    /// them and hand back a model from one training run paired with the
    /// scaler of another.
    fn load_artifacts(&self, user: UserId) -> ModelResult<(SequenceModel, FeatureScaler)> {
        let lock = self.training_lock(user);
        let _guard = lock.lock();

        let model_blob = self
            .repo
            .load(user, ArtifactKind::Model)?
            .ok_or(ModelError::ArtifactMissing)?;
        let scaler_blob = self
            .repo
            .load(user, ArtifactKind::Scaler)?
            .ok_or(ModelError::ArtifactMissing)?;

        let model = decode_artifact(&model_blob).inspect_err(|e| {
            warn!(user = user.0, error = %e, "stored model artifact unusable");
        })?;
        let scaler = decode_artifact(&scaler_blob).inspect_err(|e| {
            warn!(user = user.0, error = %e, "stored scaler artifact unusable");
        })?;
        Ok((model, scaler))
    }
}
