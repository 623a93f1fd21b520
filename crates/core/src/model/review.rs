use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::session::MasteryLevel;

/// Where a tracked question stands in its review cycle.
///
/// One entry exists per question. It is replaced every time the question is
/// answered again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewScheduleEntry {
    pub question_id: QuestionId,
    pub next_review: DateTime<Utc>,
    pub review_count: u32,

    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub question_zh: String,
    pub mastery_level: MasteryLevel,
    pub interval_days: u32,
    /// Consecutive non-poor reviews, including the latest one.
    #[serde(default)]
    pub streak: u32,
    pub last_reviewed: DateTime<Utc>,
}

impl ReviewScheduleEntry {
    /// True if the entry is due at or before `horizon`.
    #[must_use]
    pub fn is_due_by(&self, horizon: DateTime<Utc>) -> bool {
        self.next_review <= horizon
    }
}
