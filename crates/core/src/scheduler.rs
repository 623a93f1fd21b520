use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{LearningSession, MasteryLevel, ReviewScheduleEntry};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("maximum interval must be at least {min} days, got {provided}")]
    InvalidMaxInterval { provided: u32, min: u32 },
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Forgetting-curve interval schedule.
///
/// The first interval depends only on mastery:
///
/// | mastery   | base |
/// |-----------|------|
/// | poor      | 1 d  |
/// | fair      | 2 d  |
/// | good      | 4 d  |
/// | excellent | 7 d  |
///
/// Each further review that is not `poor` doubles it: the interval is
/// `base × 2^streak`, where `streak` is the number of consecutive non-poor
/// reviews before this one, capped at `max_interval_days`. A poor review
/// resets the streak and brings the question back the next day.
///
/// # Examples
///
/// ```
/// # use companion_core::scheduler::IntervalScheduler;
/// # use companion_core::model::MasteryLevel;
/// let s = IntervalScheduler::new();
/// assert_eq!(s.interval_days(MasteryLevel::Excellent, 0), 7);
/// assert_eq!(s.interval_days(MasteryLevel::Excellent, 2), 28);
/// assert_eq!(s.interval_days(MasteryLevel::Poor, 5), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalScheduler {
    max_interval_days: u32,
}

impl IntervalScheduler {
    pub const DEFAULT_MAX_INTERVAL_DAYS: u32 = 180;

    #[must_use]
    pub fn new() -> Self {
        Self {
            max_interval_days: Self::DEFAULT_MAX_INTERVAL_DAYS,
        }
    }

    /// Scheduler with a custom interval cap.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::InvalidMaxInterval` if the cap is shorter than
    /// the longest base interval.
    pub fn with_max_interval(max_interval_days: u32) -> Result<Self, ScheduleError> {
        let min = base_interval_days(MasteryLevel::Excellent);
        if max_interval_days < min {
            return Err(ScheduleError::InvalidMaxInterval {
                provided: max_interval_days,
                min,
            });
        }
        Ok(Self { max_interval_days })
    }

    #[must_use]
    pub fn max_interval_days(&self) -> u32 {
        self.max_interval_days
    }

    /// Interval for a review at `mastery` following `streak` consecutive
    /// non-poor reviews.
    #[must_use]
    pub fn interval_days(&self, mastery: MasteryLevel, streak: u32) -> u32 {
        if mastery == MasteryLevel::Poor {
            return base_interval_days(MasteryLevel::Poor);
        }
        let factor = 1_u32.checked_shl(streak).unwrap_or(u32::MAX);
        base_interval_days(mastery)
            .saturating_mul(factor)
            .min(self.max_interval_days)
    }

    /// Compute the next review for a question from its previous entry (if any)
    /// and the mastery shown at `reviewed_at`.
    ///
    /// Review count is the previous count plus one.
    #[must_use]
    pub fn calculate_next_review(
        &self,
        previous: Option<&ReviewScheduleEntry>,
        mastery: MasteryLevel,
        reviewed_at: DateTime<Utc>,
    ) -> NextReview {
        let streak_before = previous.map_or(0, |p| p.streak);
        let interval_days = self.interval_days(mastery, streak_before);
        let streak = if mastery == MasteryLevel::Poor {
            0
        } else {
            streak_before.saturating_add(1)
        };

        NextReview {
            next_review: reviewed_at + Duration::days(i64::from(interval_days)),
            interval_days,
            review_count: previous.map_or(0, |p| p.review_count).saturating_add(1),
            streak,
        }
    }

    /// Build the schedule entry that follows `session`.
    #[must_use]
    pub fn schedule_session(
        &self,
        previous: Option<&ReviewScheduleEntry>,
        session: &LearningSession,
    ) -> ReviewScheduleEntry {
        let next = self.calculate_next_review(previous, session.mastery_level, session.timestamp);
        ReviewScheduleEntry {
            question_id: session.question_id,
            next_review: next.next_review,
            review_count: next.review_count,
            topic: session.topic.clone(),
            question_zh: session.question_zh.clone(),
            mastery_level: session.mastery_level,
            interval_days: next.interval_days,
            streak: next.streak,
            last_reviewed: session.timestamp,
        }
    }
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// First-review interval for each mastery band.
#[must_use]
pub fn base_interval_days(mastery: MasteryLevel) -> u32 {
    match mastery {
        MasteryLevel::Poor => 1,
        MasteryLevel::Fair => 2,
        MasteryLevel::Good => 4,
        MasteryLevel::Excellent => 7,
    }
}

/// Result of `IntervalScheduler::calculate_next_review`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextReview {
    pub next_review: DateTime<Utc>,
    pub interval_days: u32,
    pub review_count: u32,
    pub streak: u32,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
