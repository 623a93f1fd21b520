use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::topic::{TopicError, TopicName};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("score must be an integer in 0..=10, got {provided}")]
pub struct ScoreError {
    pub provided: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QaRecordError {
    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Topic(#[from] TopicError),

    #[error("question_zh cannot be empty")]
    EmptyQuestion,
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Answer score on a 0–10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 10;

    /// Scores at or above this count as a correct answer.
    pub const PASS: u8 = 6;

    /// # Errors
    ///
    /// Returns `ScoreError` if `value` is outside `0..=10`.
    pub fn new(value: i64) -> Result<Self, ScoreError> {
        match u8::try_from(value) {
            Ok(v) if v <= Self::MAX => Ok(Self(v)),
            _ => Err(ScoreError { provided: value }),
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_passing(self) -> bool {
        self.0 >= Self::PASS
    }

    #[must_use]
    pub fn mastery(self) -> MasteryLevel {
        MasteryLevel::from_score(self)
    }
}

impl TryFrom<i64> for Score {
    type Error = ScoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

//
// ─── MASTERY ───────────────────────────────────────────────────────────────────
//

/// Qualitative band derived from a score.
///
/// | score | level     |
/// |-------|-----------|
/// | 9–10  | excellent |
/// | 7–8   | good      |
/// | 5–6   | fair      |
/// | 0–4   | poor      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl MasteryLevel {
    #[must_use]
    pub fn from_score(score: Score) -> Self {
        match score.value() {
            9.. => MasteryLevel::Excellent,
            7..=8 => MasteryLevel::Good,
            5..=6 => MasteryLevel::Fair,
            _ => MasteryLevel::Poor,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MasteryLevel::Poor => "poor",
            MasteryLevel::Fair => "fair",
            MasteryLevel::Good => "good",
            MasteryLevel::Excellent => "excellent",
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── Q&A RECORD DRAFT ──────────────────────────────────────────────────────────
//

/// Input for one answered question.
///
/// `score` is kept raw so out-of-range values surface as a validation error
/// instead of being impossible to express.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QaRecordDraft {
    pub topic: String,
    pub question_zh: String,
    pub question_en: String,
    pub user_answer: String,
    pub correct_answer_zh: String,
    pub correct_answer_en: String,
    pub score: i64,
    pub notes: String,
    /// Knowledge-base id of the question, when the caller has one.
    pub question_id: Option<QuestionId>,
}

impl QaRecordDraft {
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        question_zh: impl Into<String>,
        question_en: impl Into<String>,
        score: i64,
    ) -> Self {
        Self {
            topic: topic.into(),
            question_zh: question_zh.into(),
            question_en: question_en.into(),
            score,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_answers(
        mut self,
        user_answer: impl Into<String>,
        correct_answer_zh: impl Into<String>,
        correct_answer_en: impl Into<String>,
    ) -> Self {
        self.user_answer = user_answer.into();
        self.correct_answer_zh = correct_answer_zh.into();
        self.correct_answer_en = correct_answer_en.into();
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    #[must_use]
    pub fn for_question(mut self, id: QuestionId) -> Self {
        self.question_id = Some(id);
        self
    }

    /// Validate and stamp the record.
    ///
    /// # Errors
    ///
    /// Returns `QaRecordError` for an out-of-range score, blank topic or blank
    /// question text.
    pub fn validate(self, now: DateTime<Utc>) -> Result<LearningSession, QaRecordError> {
        let score = Score::new(self.score)?;
        let topic = TopicName::new(self.topic)?;
        if self.question_zh.trim().is_empty() {
            return Err(QaRecordError::EmptyQuestion);
        }

        let question_id = self
            .question_id
            .unwrap_or_else(|| QuestionId::derived(topic.as_str(), &self.question_zh));

        Ok(LearningSession {
            timestamp: now,
            question_id,
            topic: topic.into_string(),
            question_zh: self.question_zh,
            question_en: self.question_en,
            user_answer: self.user_answer,
            correct_answer_zh: self.correct_answer_zh,
            correct_answer_en: self.correct_answer_en,
            score,
            mastery_level: score.mastery(),
            notes: self.notes,
        })
    }
}

//
// ─── LEARNING SESSION ──────────────────────────────────────────────────────────
//

/// One answered question, as appended to the session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningSession {
    pub timestamp: DateTime<Utc>,
    pub question_id: QuestionId,
    pub topic: String,
    pub question_zh: String,
    #[serde(default)]
    pub question_en: String,
    #[serde(default)]
    pub user_answer: String,
    #[serde(default)]
    pub correct_answer_zh: String,
    #[serde(default)]
    pub correct_answer_en: String,
    pub score: Score,
    pub mastery_level: MasteryLevel,
    #[serde(default)]
    pub notes: String,
}
