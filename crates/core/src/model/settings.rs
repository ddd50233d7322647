use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("passing score must be between 1 and 100")]
    InvalidPassingScore,

    #[error("quiz time limit must be > 0 minutes")]
    InvalidTimeLimit,

    #[error("max attempts must be > 0")]
    InvalidMaxAttempts,
}

/// Values applied to every quiz the importer materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseDefaults {
    passing_score: u8,
    time_limit_minutes: u32,
    max_attempts: u32,
}

impl CourseDefaults {
    /// # Errors
    ///
    /// Returns `SettingsError` if the passing score is outside 1..=100 or if the
    /// time limit or attempt cap is zero.
    pub fn new(
        passing_score: u8,
        time_limit_minutes: u32,
        max_attempts: u32,
    ) -> Result<Self, SettingsError> {
        if !(1..=100).contains(&passing_score) {
            return Err(SettingsError::InvalidPassingScore);
        }
        if time_limit_minutes == 0 {
            return Err(SettingsError::InvalidTimeLimit);
        }
        if max_attempts == 0 {
            return Err(SettingsError::InvalidMaxAttempts);
        }
        Ok(Self {
            passing_score,
            time_limit_minutes,
            max_attempts,
        })
    }

    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for CourseDefaults {
    fn default() -> Self {
        Self {
            passing_score: 70,
            time_limit_minutes: 15,
            max_attempts: 3,
        }
    }
}
