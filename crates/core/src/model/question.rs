use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::topic::{TopicError, TopicName};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty {raw:?}, expected easy, medium or hard")]
pub struct DifficultyError {
    raw: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error(transparent)]
    Topic(#[from] TopicError),

    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error(transparent)]
    Difficulty(#[from] DifficultyError),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// How hard a question is judged to be when it is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(DifficultyError { raw: s.to_string() }),
        }
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated input for a new question.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionDraft {
    pub topic: String,
    pub question_zh: String,
    pub question_en: String,
    pub answer_zh: String,
    pub answer_en: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        question_zh: impl Into<String>,
        question_en: impl Into<String>,
        answer_zh: impl Into<String>,
        answer_en: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            question_zh: question_zh.into(),
            question_en: question_en.into(),
            answer_zh: answer_zh.into(),
            answer_en: answer_en.into(),
            difficulty: Difficulty::default(),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Set the difficulty from its textual form (`easy`, `medium`, `hard`).
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::Difficulty` for any other value.
    pub fn with_difficulty_str(mut self, raw: &str) -> Result<Self, QuestionError> {
        self.difficulty = raw.parse()?;
        Ok(self)
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Validate required fields and normalize tags.
    ///
    /// Texts are kept as written; only emptiness is checked. Tags are trimmed,
    /// blank ones dropped and duplicates collapsed.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the topic or any of the four texts is blank.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedQuestion, QuestionError> {
        let topic = TopicName::new(self.topic)?;
        let question_zh = require("question_zh", self.question_zh)?;
        let question_en = require("question_en", self.question_en)?;
        let answer_zh = require("answer_zh", self.answer_zh)?;
        let answer_en = require("answer_en", self.answer_en)?;

        let tags = self
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Ok(ValidatedQuestion {
            topic,
            question_zh,
            question_en,
            answer_zh,
            answer_en,
            difficulty: self.difficulty,
            tags,
            created_at: now,
        })
    }
}

fn require(field: &'static str, value: String) -> Result<String, QuestionError> {
    if value.trim().is_empty() {
        return Err(QuestionError::EmptyField { field });
    }
    Ok(value)
}

//
// ─── VALIDATED / STORED ────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub topic: TopicName,
    pub question_zh: String,
    pub question_en: String,
    pub answer_zh: String,
    pub answer_en: String,
    pub difficulty: Difficulty,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            topic: self.topic.into_string(),
            question_zh: self.question_zh,
            question_en: self.question_en,
            answer_zh: self.answer_zh,
            answer_en: self.answer_en,
            difficulty: self.difficulty,
            tags: self.tags,
            created_at: self.created_at,
        }
    }
}

/// A bilingual question/answer pair owned by one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub topic: String,
    pub question_zh: String,
    pub question_en: String,
    pub answer_zh: String,
    pub answer_en: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Case-insensitive substring match over both questions and both answers.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        [
            &self.question_zh,
            &self.question_en,
            &self.answer_zh,
            &self.answer_en,
        ]
        .iter()
        .any(|text| text.to_lowercase().contains(needle))
    }

    /// True when the Chinese question text matches, ignoring case and
    /// whitespace runs. The English text only feeds similarity scoring.
    #[must_use]
    pub fn same_wording(&self, question_zh: &str) -> bool {
        normalize(&self.question_zh) == normalize(question_zh)
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
