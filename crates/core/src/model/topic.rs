use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic name cannot be empty")]
    EmptyName,
}

/// Validated topic name (trimmed, non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicName(String);

impl TopicName {
    /// Create a validated topic name.
    ///
    /// # Errors
    ///
    /// Returns `TopicError::EmptyName` if the name is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TopicError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TopicError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TopicName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered questions filed under one topic name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Topic {
    #[must_use]
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            questions: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Removes and returns the question, preserving the order of the rest.
    pub fn remove(&mut self, id: QuestionId) -> Option<Question> {
        let index = self.questions.iter().position(|q| q.id == id)?;
        Some(self.questions.remove(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Listing row for a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    pub name: String,
    pub question_count: usize,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::QuestionDraft;
    use crate::time::fixed_now;

    fn question(text: &str) -> Question {
        QuestionDraft::new("T", text, text, "a", "a")
            .validate(fixed_now())
            .unwrap()
            .assign_id(QuestionId::generate())
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(TopicName::new("  SQL joins ").unwrap().as_str(), "SQL joins");
        assert_eq!(TopicName::new(" \t"), Err(TopicError::EmptyName));
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut topic = Topic::new(fixed_now());
        let a = question("a");
        let b = question("b");
        let c = question("c");
        topic.questions = vec![a.clone(), b.clone(), c.clone()];

        assert_eq!(topic.remove(b.id), Some(b.clone()));
        assert_eq!(topic.remove(b.id), None);
        assert_eq!(topic.questions, vec![a, c]);
    }
}
