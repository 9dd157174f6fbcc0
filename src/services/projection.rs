//! Forward projection of prediction windows and month clipping.
//!
//! Projection is anchored on the END date of the most recent confirmed
//! occurrence: intervals are measured start-to-start for estimation, but
//! the forecast clock restarts when the last occurrence finished. The two
//! anchors are easy to conflate; every window here derives from the end
//! date.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::services::estimator::EstimationMethod;

/// One forecast occurrence: an inclusive date span plus the estimator that
/// produced it, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub method: EstimationMethod,
}

impl PredictionWindow {
    /// Every calendar date covered by this window, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// Projection behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// When set, the first window's anchor is advanced by whole cycles
    /// until its start lands strictly after this date (normally "today"),
    /// and the second window is re-derived from the adjusted first.
    ///
    /// The canonical behavior is pure forward projection from the reference
    /// date, independent of the current day; this opt-in exists for callers
    /// that never want to render a predicted window in the past.
    pub roll_forward_from: Option<NaiveDate>,
}

/// Project the next two prediction windows.
///
/// `reference_date` is the end date of the most recent confirmed
/// occurrence. The first window starts one estimated cycle after it; each
/// window spans `period_length` days inclusive; the second window follows
/// one further cycle after the first.
pub fn project_windows(
    reference_date: NaiveDate,
    cycle_length: u32,
    period_length: u32,
    method: EstimationMethod,
    options: ProjectionOptions,
) -> (PredictionWindow, PredictionWindow) {
    let cycle = Days::new(u64::from(cycle_length.max(1)));
    let span = Days::new(u64::from(period_length.saturating_sub(1)));

    let mut first_start = reference_date + cycle;
    if let Some(today) = options.roll_forward_from {
        while first_start <= today {
            first_start = first_start + cycle;
        }
    }

    let second_start = first_start + cycle;
    let window1 = PredictionWindow {
        start: first_start,
        end: first_start + span,
        method,
    };
    let window2 = PredictionWindow {
        start: second_start,
        end: second_start + span,
        method,
    };
    (window1, window2)
}

/// First and last day of a calendar month.
///
/// The month end is derived from the first day of the following month
/// (December rolls over to January of the next year), so leap-year
/// February needs no special casing.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let month_start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month_start = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((month_start, next_month_start.pred_opt()?))
}

/// Clip a window to the days falling inside the given month.
///
/// Returns the consecutive dates in the intersection, ascending; empty when
/// the window and month do not overlap (or the month is invalid).
pub fn overlap_with_month(window: &PredictionWindow, year: i32, month: u32) -> Vec<NaiveDate> {
    let Some((month_start, month_end)) = month_bounds(year, month) else {
        return Vec::new();
    };

    let start = window.start.max(month_start);
    let end = window.end.min(month_end);
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|d| *d <= end).collect()
}
