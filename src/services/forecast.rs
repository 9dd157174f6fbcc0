//! End-to-end monthly forecast orchestration.
//!
//! Runs the whole pipeline for one user and query month: filter the
//! occurrence history, extract intervals, select a stage, estimate the
//! cycle length, project two windows from the latest confirmed end date,
//! and clip both windows to the month. The calendar annotation consumes
//! the result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::UserId;
use crate::models::{Occurrence, Profile};
use crate::services::calendar::{annotate_calendar, generate_calendar, CalendarWeek};
use crate::services::estimator::{estimate_cycle_length, CycleEstimate};
use crate::services::intervals::{cycle_count, extract_intervals};
use crate::services::projection::{
    overlap_with_month, project_windows, PredictionWindow, ProjectionOptions,
};
use crate::services::sequence_model::SequenceModelStore;
use crate::services::stage::select_stage;

/// Forecast output for one query month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthForecast {
    /// The two projected windows; `None` when the user has no confirmed
    /// occurrence to anchor on.
    pub window1: Option<PredictionWindow>,
    pub window2: Option<PredictionWindow>,
    /// Window days falling inside the query month.
    pub current_dates: Vec<NaiveDate>,
    pub next_dates: Vec<NaiveDate>,
    /// The estimate behind the windows, for diagnostics.
    pub estimate: Option<CycleEstimate>,
    /// Complete observed cycles in the history.
    pub cycle_count: usize,
}

impl MonthForecast {
    fn empty() -> Self {
        Self {
            window1: None,
            window2: None,
            current_dates: Vec::new(),
            next_dates: Vec::new(),
            estimate: None,
            cycle_count: 0,
        }
    }
}

/// Compute the forecast for one user and month.
///
/// `occurrences` is the user's full record list in any order; only
/// confirmed records drive the forecast. Returns an empty forecast when no
/// confirmed occurrence exists.
pub fn forecast_month(
    models: &SequenceModelStore,
    user: UserId,
    occurrences: &[Occurrence],
    profile: &Profile,
    year: i32,
    month: u32,
    options: ProjectionOptions,
) -> MonthForecast {
    let mut confirmed: Vec<&Occurrence> =
        occurrences.iter().filter(|o| o.is_confirmed()).collect();
    confirmed.sort_by_key(|o| o.start_date);

    let Some(latest) = confirmed.last() else {
        debug!(user = user.0, "no confirmed occurrences, empty forecast");
        return MonthForecast::empty();
    };

    let cycles = cycle_count(occurrences);
    let intervals = extract_intervals(occurrences);
    let stage = select_stage(cycles);
    let estimate = estimate_cycle_length(stage, &intervals, profile, user, models);

    // The forecast clock restarts from the end of the last occurrence.
    let reference_date = latest.end_date;
    let (window1, window2) = project_windows(
        reference_date,
        estimate.days,
        profile.clamped_period_length(),
        estimate.method,
        options,
    );

    let current_dates = overlap_with_month(&window1, year, month);
    let next_dates = overlap_with_month(&window2, year, month);

    info!(
        user = user.0,
        cycles,
        method = %estimate.method,
        cycle_length = estimate.days,
        %reference_date,
        window1_start = %window1.start,
        current_in_month = current_dates.len(),
        next_in_month = next_dates.len(),
        "month forecast computed"
    );

    MonthForecast {
        window1: Some(window1),
        window2: Some(window2),
        current_dates,
        next_dates,
        estimate: Some(estimate),
        cycle_count: cycles,
    }
}

/// Convenience wrapper: forecast a month and render it straight onto an
/// annotated calendar grid.
pub fn forecast_calendar(
    models: &SequenceModelStore,
    user: UserId,
    occurrences: &[Occurrence],
    profile: &Profile,
    year: i32,
    month: u32,
    today: NaiveDate,
    options: ProjectionOptions,
) -> (Vec<CalendarWeek>, MonthForecast) {
    let forecast = forecast_month(models, user, occurrences, profile, year, month, options);
    let visible: Vec<Occurrence> = occurrences
        .iter()
        .filter(|o| !o.is_deleted)
        .cloned()
        .collect();
    let grid = annotate_calendar(
        generate_calendar(year, month, today),
        &visible,
        &forecast.current_dates,
        &forecast.next_dates,
    );
    (grid, forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use crate::services::estimator::EstimationMethod;
    use chrono::Days;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn models() -> SequenceModelStore {
        SequenceModelStore::new(Arc::new(LocalRepository::new()))
    }

    fn history(start: NaiveDate, gaps: &[u64], period_days: u64) -> Vec<Occurrence> {
        let mut out = Vec::new();
        let mut cursor = start;
        out.push(Occurrence::confirmed(cursor, cursor + Days::new(period_days - 1)).unwrap());
        for gap in gaps {
            cursor = cursor + Days::new(*gap);
            out.push(Occurrence::confirmed(cursor, cursor + Days::new(period_days - 1)).unwrap());
        }
        out
    }

    #[test]
    fn test_empty_history_gives_empty_forecast() {
        let forecast = forecast_month(
            &models(),
            UserId::new(1),
            &[],
            &Profile::default(),
            2024,
            2,
            ProjectionOptions::default(),
        );
        assert!(forecast.window1.is_none());
        assert!(forecast.estimate.is_none());
        assert!(forecast.current_dates.is_empty());
    }

    #[test]
    fn test_single_occurrence_uses_fixed_default() {
        // One record ending 2024-01-14 with defaults: window1 starts 28
        // days later on 2024-02-11.
        let occurrences = history(date(2024, 1, 10), &[], 5);
        let forecast = forecast_month(
            &models(),
            UserId::new(1),
            &occurrences,
            &Profile::default(),
            2024,
            2,
            ProjectionOptions::default(),
        );
        let estimate = forecast.estimate.unwrap();
        assert_eq!(estimate.method, EstimationMethod::FixedDefault);
        assert_eq!(estimate.days, 28);

        let w1 = forecast.window1.unwrap();
        assert_eq!(w1.start, date(2024, 2, 11));
        assert_eq!(w1.end, date(2024, 2, 15));
        assert_eq!(forecast.current_dates.len(), 5);
    }

    #[test]
    fn test_five_cycles_use_weighted_average() {
        let occurrences = history(date(2024, 1, 1), &[28, 29, 27, 30, 28], 5);
        let forecast = forecast_month(
            &models(),
            UserId::new(1),
            &occurrences,
            &Profile::default(),
            2024,
            7,
            ProjectionOptions::default(),
        );
        assert_eq!(forecast.cycle_count, 5);
        assert_eq!(
            forecast.estimate.unwrap().method,
            EstimationMethod::WeightedAverage
        );
    }

    #[test]
    fn test_projection_anchors_on_end_date_not_start() {
        let occurrences = history(date(2024, 1, 10), &[], 5);
        let forecast = forecast_month(
            &models(),
            UserId::new(1),
            &occurrences,
            &Profile::default(),
            2024,
            2,
            ProjectionOptions::default(),
        );
        // Anchored on start_date the window would begin 2024-02-07.
        assert_ne!(forecast.window1.unwrap().start, date(2024, 2, 7));
    }

    #[test]
    fn test_forecast_calendar_grid_has_predictions() {
        let occurrences = history(date(2024, 1, 10), &[], 5);
        let (grid, forecast) = forecast_calendar(
            &models(),
            UserId::new(1),
            &occurrences,
            &Profile::default(),
            2024,
            2,
            date(2024, 2, 1),
            ProjectionOptions::default(),
        );

        let marked: Vec<_> = grid
            .iter()
            .flatten()
            .filter(|d| d.is_current_prediction)
            .map(|d| d.date)
            .collect();
        assert_eq!(marked, forecast.current_dates);
    }
}
