//! Service layer: the estimation and projection pipeline.
//!
//! This module contains the business logic between the occurrence records
//! handed in by the caller and the calendar annotations handed back out:
//! interval extraction, stage selection, cycle-length estimation (including
//! the learned sequence model), window projection, month clipping, and
//! calendar annotation.

pub mod calendar;
pub mod estimator;
pub mod forecast;
pub mod intervals;
pub mod projection;
pub mod sequence_model;
pub mod stage;

pub use calendar::{annotate_calendar, generate_calendar};
pub use estimator::{estimate_cycle_length, weighted_average_cycle};
pub use forecast::{forecast_calendar, forecast_month};
pub use intervals::{cycle_count, extract_intervals};
pub use projection::{overlap_with_month, project_windows};
pub use sequence_model::SequenceModelStore;
pub use stage::select_stage;
