//! Work criteria and performance classification.
//!
//! A work duration is bucketed into one of four ordered tiers by comparing
//! it against multiples of [`WorkCriteria::min_work_duration`]:
//!
//! | Condition | Category |
//! |-----------|----------|
//! | `duration > 2.0 × min` | [`Best`](PerformanceCategory::Best) |
//! | `duration > 1.5 × min` | [`Better`](PerformanceCategory::Better) |
//! | `duration > min` | [`Good`](PerformanceCategory::Good) |
//! | otherwise | [`Poor`](PerformanceCategory::Poor) |
//!
//! Every boundary is strict: a duration exactly equal to the minimum is
//! still `Poor`.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::ActivityError;

/// Multiplier of the minimum duration above which work is rated `Better`.
pub const BETTER_FACTOR: f64 = 1.5;

/// Multiplier of the minimum duration above which work is rated `Best`.
pub const BEST_FACTOR: f64 = 2.0;

/// Criteria used to rate a work duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkCriteria {
    min_work_duration: f64,
}

impl WorkCriteria {
    /// Create criteria with the given minimum work duration in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidCriteria`] unless the duration is
    /// finite and strictly positive.
    pub fn new(min_work_duration: f64) -> Result<Self, ActivityError> {
        if !min_work_duration.is_finite() || min_work_duration <= 0.0 {
            return Err(ActivityError::InvalidCriteria(format!(
                "min_work_duration must be a positive number of seconds, got {min_work_duration}"
            )));
        }
        Ok(Self { min_work_duration })
    }

    /// Minimum work duration in seconds.
    pub fn min_work_duration(&self) -> f64 {
        self.min_work_duration
    }
}

/// Coarse performance rating, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PerformanceCategory {
    /// At or below the minimum work duration.
    #[default]
    Poor,
    /// Above the minimum.
    Good,
    /// Above 1.5 × the minimum.
    Better,
    /// Above 2 × the minimum.
    Best,
}

impl PerformanceCategory {
    /// The label used in reports: `"Poor"`, `"Good"`, `"Better"` or `"Best"`.
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceCategory::Poor => "Poor",
            PerformanceCategory::Good => "Good",
            PerformanceCategory::Better => "Better",
            PerformanceCategory::Best => "Best",
        }
    }
}

impl Display for PerformanceCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Rate `work_duration` against `criteria`.
///
/// Thresholds are checked in ascending order and each satisfied check
/// overrides the previous label, so the highest satisfied tier wins.
///
/// # Example
///
/// ```
/// use activity_meter::{classify, PerformanceCategory, WorkCriteria};
///
/// let criteria = WorkCriteria::new(10.0)?;
/// assert_eq!(classify(12.0, &criteria), PerformanceCategory::Good);
/// assert_eq!(classify(21.0, &criteria), PerformanceCategory::Best);
/// assert_eq!(classify(10.0, &criteria), PerformanceCategory::Poor);
/// # Ok::<(), activity_meter::ActivityError>(())
/// ```
pub fn classify(work_duration: f64, criteria: &WorkCriteria) -> PerformanceCategory {
    let minimum = criteria.min_work_duration;
    let mut category = PerformanceCategory::Poor;

    if work_duration > minimum {
        category = PerformanceCategory::Good;
    }
    if work_duration > minimum * BETTER_FACTOR {
        category = PerformanceCategory::Better;
    }
    if work_duration > minimum * BEST_FACTOR {
        category = PerformanceCategory::Best;
    }

    category
}
