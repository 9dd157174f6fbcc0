//! Per-user cycle configuration.

use serde::{Deserialize, Serialize};

/// Valid range for a user-declared cycle length, in days.
pub const CYCLE_LENGTH_RANGE: std::ops::RangeInclusive<u32> = 15..=45;
/// Valid range for a user-declared period length, in days.
pub const PERIOD_LENGTH_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Nominal cycle length applied when a user has declared nothing.
pub const DEFAULT_CYCLE_LENGTH: u32 = 28;
/// Nominal period length applied when a user has declared nothing.
pub const DEFAULT_PERIOD_LENGTH: u32 = 5;

/// User-declared cycle parameters: the fallback interval when history is
/// thin, and the nominal duration of each occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Nominal days between occurrence starts.
    pub cycle_length: u32,
    /// Nominal duration of one occurrence, in days.
    pub period_length: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            cycle_length: DEFAULT_CYCLE_LENGTH,
            period_length: DEFAULT_PERIOD_LENGTH,
        }
    }
}

/// Rejection reason for an out-of-range profile update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("cycle_length {0} outside valid range 15..=45")]
    CycleLengthOutOfRange(u32),
    #[error("period_length {0} outside valid range 1..=10")]
    PeriodLengthOutOfRange(u32),
}

impl Profile {
    pub fn new(cycle_length: u32, period_length: u32) -> Result<Self, ProfileError> {
        let profile = Self {
            cycle_length,
            period_length,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Range check enforced at the profile-update boundary.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !CYCLE_LENGTH_RANGE.contains(&self.cycle_length) {
            return Err(ProfileError::CycleLengthOutOfRange(self.cycle_length));
        }
        if !PERIOD_LENGTH_RANGE.contains(&self.period_length) {
            return Err(ProfileError::PeriodLengthOutOfRange(self.period_length));
        }
        Ok(())
    }

    /// Cycle length clamped to its valid range. The estimation core uses
    /// this instead of trusting that the boundary validation ran.
    pub fn clamped_cycle_length(&self) -> u32 {
        self.cycle_length
            .clamp(*CYCLE_LENGTH_RANGE.start(), *CYCLE_LENGTH_RANGE.end())
    }

    /// Period length clamped to its valid range, same contract as
    /// [`clamped_cycle_length`](Self::clamped_cycle_length).
    pub fn clamped_period_length(&self) -> u32 {
        self.period_length
            .clamp(*PERIOD_LENGTH_RANGE.start(), *PERIOD_LENGTH_RANGE.end())
    }
}
