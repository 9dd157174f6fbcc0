//! Occurrence domain type.
//!
//! An [`Occurrence`] is one real or predicted cycle episode: an inclusive
//! `[start_date, end_date]` span plus lifecycle flags. Confirmed occurrences
//! are the only input to the estimation pipeline; predicted and soft-deleted
//! records are carried for the calendar but excluded from computation.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// One cycle episode reported by (or predicted for) a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// True until the user confirms the episode actually happened.
    #[serde(default)]
    pub is_predicted: bool,
    /// Soft-delete flag; deleted occurrences never reach the estimator.
    #[serde(default)]
    pub is_deleted: bool,
}

impl Occurrence {
    /// Build a confirmed occurrence. Returns `None` when the dates are out
    /// of order.
    pub fn confirmed(start_date: NaiveDate, end_date: NaiveDate) -> Option<Self> {
        Self::new(start_date, end_date, false)
    }

    /// Build a predicted occurrence. Returns `None` when the dates are out
    /// of order.
    pub fn predicted(start_date: NaiveDate, end_date: NaiveDate) -> Option<Self> {
        Self::new(start_date, end_date, true)
    }

    fn new(start_date: NaiveDate, end_date: NaiveDate, is_predicted: bool) -> Option<Self> {
        if end_date < start_date {
            return None;
        }
        Some(Self {
            start_date,
            end_date,
            is_predicted,
            is_deleted: false,
        })
    }

    /// A confirmed occurrence is one that is neither predicted nor deleted.
    pub fn is_confirmed(&self) -> bool {
        !self.is_predicted && !self.is_deleted
    }

    /// Inclusive span length in days.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Every calendar date covered by this occurrence, in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
    }

    /// Naive single-step forecast anchored on this occurrence's start date.
    ///
    /// Kept for parity with record-level previews; the engine proper anchors
    /// on the end date instead (see `services::projection`).
    pub fn next_span(&self, cycle_length: u32, period_length: u32) -> (NaiveDate, NaiveDate) {
        let next_start = self.start_date + Days::new(u64::from(cycle_length));
        let next_end = next_start + Days::new(u64::from(period_length.saturating_sub(1)));
        (next_start, next_end)
    }
}
