//! Interval extraction from confirmed occurrence history.

use tracing::debug;

use crate::models::Occurrence;

/// Plausible range for one observed cycle interval, in days. Gaps outside
/// this range are data-entry anomalies (a missed or double-entered
/// occurrence) and carry no signal.
pub const INTERVAL_RANGE: std::ops::RangeInclusive<i64> = 20..=45;

/// Derive the confirmed cycle-length observations from occurrence history.
///
/// Takes the start-to-start day gaps between chronologically adjacent
/// confirmed occurrences, keeping only gaps inside [`INTERVAL_RANGE`].
/// Out-of-range gaps are dropped silently; they are noise, not an error.
/// Fewer than two confirmed occurrences yield an empty sequence.
///
/// The input is filtered and sorted here, so callers may pass the raw
/// record list in any order.
pub fn extract_intervals(occurrences: &[Occurrence]) -> Vec<u32> {
    let mut confirmed: Vec<&Occurrence> =
        occurrences.iter().filter(|o| o.is_confirmed()).collect();
    confirmed.sort_by_key(|o| o.start_date);

    let mut intervals = Vec::new();
    for pair in confirmed.windows(2) {
        let gap = (pair[1].start_date - pair[0].start_date).num_days();
        if INTERVAL_RANGE.contains(&gap) {
            intervals.push(gap as u32);
        } else {
            debug!(
                gap,
                start = %pair[0].start_date,
                next_start = %pair[1].start_date,
                "dropping anomalous interval"
            );
        }
    }
    intervals
}

/// Number of complete observed cycles: confirmed occurrence count minus one.
///
/// This drives stage selection and counts raw adjacency, not the filtered
/// interval list, matching how the user-visible history depth is reported.
pub fn cycle_count(occurrences: &[Occurrence]) -> usize {
    occurrences
        .iter()
        .filter(|o| o.is_confirmed())
        .count()
        .saturating_sub(1)
}
