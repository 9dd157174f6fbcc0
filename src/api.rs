//! Public API surface of the forecasting engine.
//!
//! This file consolidates the types callers exchange with the engine.
//! All types derive Serialize/Deserialize for JSON serialization.

pub use crate::models::{Occurrence, Profile, ProfileError};
pub use crate::services::calendar::{CalendarDay, CalendarWeek};
pub use crate::services::estimator::{CycleEstimate, EstimationMethod};
pub use crate::services::forecast::MonthForecast;
pub use crate::services::projection::{PredictionWindow, ProjectionOptions};
pub use crate::services::stage::Stage;

use serde::{Deserialize, Serialize};

/// User identifier (owning key for occurrence history, profile, and model
/// artifacts).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    pub fn new(value: i64) -> Self {
        UserId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
