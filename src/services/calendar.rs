//! Month calendar grid generation and annotation.
//!
//! The grid is what a month view renders: full weeks starting on Sunday,
//! with adjacent-month days carried but flagged. Annotation
//! gives confirmed occurrence days absolute priority over prediction
//! windows, and window 1 priority over window 2, so exactly one of
//! {period, current prediction, next prediction, none} holds per date.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Occurrence;
use crate::services::projection::month_bounds;

/// One calendar cell with its annotation flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Day-of-month number, for rendering.
    pub day: u32,
    /// False for the leading/trailing days borrowed from adjacent months.
    pub current_month: bool,
    /// Confirmed-occurrence day (highest priority).
    pub is_period: bool,
    /// Sub-flag of `is_period`: the owning occurrence is still predicted.
    pub is_predicted_period: bool,
    /// Sub-flag of `is_period`: the owning occurrence is confirmed.
    pub is_confirmed_period: bool,
    /// Inside the first prediction window (and not a period day).
    pub is_current_prediction: bool,
    /// Inside the second prediction window (and in neither of the above).
    pub is_next_prediction: bool,
    pub is_today: bool,
    pub is_future: bool,
}

/// A week of seven days, Sunday first.
pub type CalendarWeek = Vec<CalendarDay>;

/// Build the Sunday-first week grid for a month.
///
/// Weeks run Sunday through Saturday; the first week is padded backwards
/// and the last forwards with adjacent-month days so every week has seven
/// cells. All annotation flags start false.
pub fn generate_calendar(year: i32, month: u32, today: NaiveDate) -> Vec<CalendarWeek> {
    let Some((month_start, month_end)) = month_bounds(year, month) else {
        return Vec::new();
    };

    let mut cursor = month_start;
    while cursor.weekday() != Weekday::Sun {
        cursor = cursor - Days::new(1);
    }

    let mut weeks = Vec::new();
    while cursor <= month_end {
        let week: CalendarWeek = (0..7)
            .map(|offset| {
                let date = cursor + Days::new(offset);
                CalendarDay {
                    date,
                    day: date.day(),
                    current_month: date.month() == month && date.year() == year,
                    is_period: false,
                    is_predicted_period: false,
                    is_confirmed_period: false,
                    is_current_prediction: false,
                    is_next_prediction: false,
                    is_today: date == today,
                    is_future: date > today,
                }
            })
            .collect();
        weeks.push(week);
        cursor = cursor + Days::new(7);
    }
    weeks
}

/// Mark occurrence and prediction days on a calendar grid.
///
/// Priority per cell: an occurrence day sets `is_period` (with the
/// predicted/confirmed sub-flag taken from the occurrence itself) and
/// suppresses both prediction flags; otherwise membership in window 1 sets
/// `is_current_prediction`; otherwise membership in window 2 sets
/// `is_next_prediction`.
///
/// `occurrences` carries every non-deleted record for the user, so
/// predicted episodes render too; `window1_dates` and `window2_dates` are
/// the month-clipped day lists of the two forecast windows.
pub fn annotate_calendar(
    mut grid: Vec<CalendarWeek>,
    occurrences: &[Occurrence],
    window1_dates: &[NaiveDate],
    window2_dates: &[NaiveDate],
) -> Vec<CalendarWeek> {
    for week in &mut grid {
        for day in week {
            let span = occurrences
                .iter()
                .filter(|o| !o.is_deleted)
                .find(|o| o.start_date <= day.date && day.date <= o.end_date);

            if let Some(occurrence) = span {
                day.is_period = true;
                day.is_predicted_period = occurrence.is_predicted;
                day.is_confirmed_period = !occurrence.is_predicted;
                day.is_current_prediction = false;
                day.is_next_prediction = false;
            } else if window1_dates.contains(&day.date) {
                day.is_current_prediction = true;
            } else if window2_dates.contains(&day.date) {
                day.is_next_prediction = true;
            }
        }
    }

    let period_days: usize = grid
        .iter()
        .flatten()
        .filter(|d| d.is_period)
        .count();
    debug!(
        period_days,
        current_prediction_days = window1_dates.len(),
        next_prediction_days = window2_dates.len(),
        "calendar annotated"
    );
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn find_day(grid: &[CalendarWeek], target: NaiveDate) -> &CalendarDay {
        grid.iter()
            .flatten()
            .find(|d| d.date == target)
            .expect("date missing from grid")
    }

    #[test]
    fn test_grid_weeks_start_sunday() {
        let grid = generate_calendar(2024, 2, date(2024, 2, 15));
        for week in &grid {
            assert_eq!(week.len(), 7);
            assert_eq!(week[0].date.weekday(), Weekday::Sun);
        }
        // February 2024 starts on a Thursday; the grid leads with January days.
        assert_eq!(grid[0][0].date, date(2024, 1, 28));
        assert!(!grid[0][0].current_month);
        assert!(find_day(&grid, date(2024, 2, 1)).current_month);
    }

    #[test]
    fn test_grid_covers_whole_month() {
        let grid = generate_calendar(2024, 2, date(2024, 2, 15));
        let in_month = grid
            .iter()
            .flatten()
            .filter(|d| d.current_month)
            .count();
        assert_eq!(in_month, 29); // leap February
    }

    #[test]
    fn test_today_and_future_flags() {
        let today = date(2024, 2, 15);
        let grid = generate_calendar(2024, 2, today);
        assert!(find_day(&grid, today).is_today);
        assert!(find_day(&grid, date(2024, 2, 16)).is_future);
        assert!(!find_day(&grid, date(2024, 2, 14)).is_future);
    }

    #[test]
    fn test_period_day_overrides_prediction() {
        let today = date(2024, 2, 1);
        let grid = generate_calendar(2024, 2, today);
        let occurrence =
            Occurrence::confirmed(date(2024, 2, 7), date(2024, 2, 9)).unwrap();
        let window1: Vec<_> = (7..=11).map(|d| date(2024, 2, d)).collect();

        let grid = annotate_calendar(grid, &[occurrence], &window1, &[]);

        // 02-07 is both a confirmed day and inside window 1: period wins.
        let day = find_day(&grid, date(2024, 2, 7));
        assert!(day.is_period);
        assert!(day.is_confirmed_period);
        assert!(!day.is_current_prediction);

        // 02-10 is only in window 1.
        let day = find_day(&grid, date(2024, 2, 10));
        assert!(!day.is_period);
        assert!(day.is_current_prediction);
    }

    #[test]
    fn test_window1_overrides_window2() {
        let grid = generate_calendar(2024, 2, date(2024, 2, 1));
        let shared = vec![date(2024, 2, 20)];
        let grid = annotate_calendar(grid, &[], &shared, &shared);

        let day = find_day(&grid, date(2024, 2, 20));
        assert!(day.is_current_prediction);
        assert!(!day.is_next_prediction);
    }

    #[test]
    fn test_predicted_occurrence_sets_sub_flag() {
        let grid = generate_calendar(2024, 2, date(2024, 2, 1));
        let occurrence =
            Occurrence::predicted(date(2024, 2, 12), date(2024, 2, 14)).unwrap();
        let grid = annotate_calendar(grid, &[occurrence], &[], &[]);

        let day = find_day(&grid, date(2024, 2, 13));
        assert!(day.is_period);
        assert!(day.is_predicted_period);
        assert!(!day.is_confirmed_period);
    }

    #[test]
    fn test_deleted_occurrence_not_marked() {
        let grid = generate_calendar(2024, 2, date(2024, 2, 1));
        let mut occurrence =
            Occurrence::confirmed(date(2024, 2, 12), date(2024, 2, 14)).unwrap();
        occurrence.is_deleted = true;
        let grid = annotate_calendar(grid, &[occurrence], &[], &[]);

        assert!(!find_day(&grid, date(2024, 2, 13)).is_period);
    }

    #[test]
    fn test_exactly_one_state_per_day() {
        let grid = generate_calendar(2024, 3, date(2024, 3, 1));
        let occurrence =
            Occurrence::confirmed(date(2024, 3, 4), date(2024, 3, 8)).unwrap();
        let window1: Vec<_> = (6..=10).map(|d| date(2024, 3, d)).collect();
        let window2: Vec<_> = (8..=12).map(|d| date(2024, 3, d)).collect();
        let grid = annotate_calendar(grid, &[occurrence], &window1, &window2);

        for day in grid.iter().flatten() {
            let states = [
                day.is_period,
                day.is_current_prediction,
                day.is_next_prediction,
            ]
            .iter()
            .filter(|s| **s)
            .count();
            assert!(states <= 1, "conflicting flags on {}", day.date);
        }
    }
}
