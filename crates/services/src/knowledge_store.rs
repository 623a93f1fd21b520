use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use companion_core::model::{Question, QuestionDraft, QuestionId, Topic, TopicSummary};
use companion_core::similarity::{KeywordJaccard, SimilarityMeasure};
use storage::{JsonFile, KnowledgeBaseDocument};

use crate::Clock;
use crate::error::KnowledgeError;

/// Existing question that resembles a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarQuestion {
    pub id: QuestionId,
    pub question_zh: String,
    pub question_en: String,
    pub similarity: f64,
}

/// Result of `KnowledgeStore::add_question`.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Question),
    /// A question with the same wording already exists; nothing was stored.
    ExactDuplicate { existing: QuestionId },
    /// Near matches, most similar first; nothing was stored.
    SimilarFound(Vec<SimilarQuestion>),
}

impl AddOutcome {
    #[must_use]
    pub fn added(&self) -> Option<&Question> {
        match self {
            AddOutcome::Added(q) => Some(q),
            _ => None,
        }
    }
}

/// File-backed topics of bilingual questions with near-duplicate detection.
#[derive(Clone)]
pub struct KnowledgeStore {
    clock: Clock,
    file: JsonFile<KnowledgeBaseDocument>,
    similarity: Arc<dyn SimilarityMeasure>,
    threshold: f64,
}

impl KnowledgeStore {
    pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

    #[must_use]
    pub fn new(clock: Clock, path: impl Into<PathBuf>) -> Self {
        Self {
            clock,
            file: JsonFile::new(path),
            similarity: Arc::new(KeywordJaccard),
            threshold: Self::DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Replace the duplicate-detection measure.
    #[must_use]
    pub fn with_similarity(mut self, measure: impl SimilarityMeasure + 'static) -> Self {
        self.similarity = Arc::new(measure);
        self
    }

    /// Scores at or above `threshold` count as similar. Values above 1.0
    /// effectively disable near-duplicate detection.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.file = self.file.with_lock_timeout(timeout);
        self
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    /// Validate and insert a question.
    ///
    /// Unless `force` is set, a question in the same topic with the same
    /// Chinese wording, or any scoring at or above the similarity threshold,
    /// blocks the insert and is reported instead.
    ///
    /// # Errors
    ///
    /// Returns `KnowledgeError::Question` for invalid input and
    /// `KnowledgeError::Storage` if the file cannot be locked, read or written.
    pub fn add_question(
        &self,
        draft: QuestionDraft,
        force: bool,
    ) -> Result<AddOutcome, KnowledgeError> {
        let now = self.clock.now();
        let validated = draft.validate(now)?;

        self.file.update(now, |doc| {
            let topic_name = validated.topic.as_str().to_string();

            if !force {
                if let Some(topic) = doc.topics.get(&topic_name) {
                    if let Some(existing) = topic
                        .questions
                        .iter()
                        .find(|q| q.same_wording(&validated.question_zh))
                    {
                        tracing::info!(topic = %topic_name, existing = %existing.id, "exact duplicate rejected");
                        return Ok(AddOutcome::ExactDuplicate {
                            existing: existing.id,
                        });
                    }

                    let similar = self.similar_in(
                        topic,
                        &validated.question_zh,
                        &validated.question_en,
                    );
                    if !similar.is_empty() {
                        tracing::info!(topic = %topic_name, matches = similar.len(), "similar questions found");
                        return Ok(AddOutcome::SimilarFound(similar));
                    }
                }
            }

            let question = validated.assign_id(QuestionId::generate());
            doc.topics
                .entry(topic_name)
                .or_insert_with(|| Topic::new(now))
                .questions
                .push(question.clone());
            tracing::info!(topic = %question.topic, id = %question.id, force, "question added");
            Ok(AddOutcome::Added(question))
        })
    }

    /// Questions in `topic` resembling the given wording, most similar first.
    ///
    /// # Errors
    ///
    /// Returns `KnowledgeError::Storage` if the file cannot be read.
    pub fn find_similar(
        &self,
        topic: &str,
        question_zh: &str,
        question_en: &str,
    ) -> Result<Vec<SimilarQuestion>, KnowledgeError> {
        let similar = self.file.read(self.clock.now(), |doc| {
            doc.topics
                .get(topic.trim())
                .map(|t| self.similar_in(t, question_zh, question_en))
                .unwrap_or_default()
        })?;
        Ok(similar)
    }

    fn similar_in(&self, topic: &Topic, question_zh: &str, question_en: &str) -> Vec<SimilarQuestion> {
        let mut matches: Vec<SimilarQuestion> = topic
            .questions
            .iter()
            .filter_map(|q| {
                let score = self
                    .similarity
                    .similarity(question_zh, &q.question_zh)
                    .max(self.similarity.similarity(question_en, &q.question_en));
                (score >= self.threshold).then(|| SimilarQuestion {
                    id: q.id,
                    question_zh: q.question_zh.clone(),
                    question_en: q.question_en.clone(),
                    similarity: score,
                })
            })
            .collect();
        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches
    }

    /// Questions whose question or answer text, in either language, contains
    /// `keyword` ignoring case. Topics are visited by name, questions in
    /// insertion order. A blank keyword matches nothing.
    ///
    /// # Errors
    ///
    /// Returns `KnowledgeError::Storage` if the file cannot be read.
    pub fn search_questions(&self, keyword: &str) -> Result<Vec<Question>, KnowledgeError> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let found = self.file.read(self.clock.now(), |doc| {
            doc.topics
                .values()
                .flat_map(|t| t.questions.iter())
                .filter(|q| q.matches_lowercase(&needle))
                .cloned()
                .collect()
        })?;
        Ok(found)
    }

    /// Questions of `topic` in insertion order; empty if the topic is unknown.
    ///
    /// # Errors
    ///
    /// Returns `KnowledgeError::Storage` if the file cannot be read.
    pub fn get_topic_questions(&self, topic: &str) -> Result<Vec<Question>, KnowledgeError> {
        let questions = self.file.read(self.clock.now(), |doc| {
            doc.topics
                .get(topic.trim())
                .map(|t| t.questions.clone())
                .unwrap_or_default()
        })?;
        Ok(questions)
    }

    /// # Errors
    ///
    /// Returns `KnowledgeError::Storage` if the file cannot be read.
    pub fn list_topics(&self) -> Result<BTreeSet<String>, KnowledgeError> {
        let names = self
            .file
            .read(self.clock.now(), |doc| doc.topics.keys().cloned().collect())?;
        Ok(names)
    }

    /// # Errors
    ///
    /// Returns `KnowledgeError::Storage` if the file cannot be read.
    pub fn topic_summaries(&self) -> Result<Vec<TopicSummary>, KnowledgeError> {
        let rows = self.file.read(self.clock.now(), |doc| {
            doc.topics
                .iter()
                .map(|(name, t)| TopicSummary {
                    name: name.clone(),
                    question_count: t.len(),
                    created_at: t.created_at,
                })
                .collect()
        })?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `TopicNotFound`/`QuestionNotFound` for unknown keys, or
    /// `KnowledgeError::Storage` if the file cannot be read.
    pub fn get_question(&self, topic: &str, id: QuestionId) -> Result<Question, KnowledgeError> {
        let topic = topic.trim();
        self.file.read(self.clock.now(), |doc| -> Result<Question, KnowledgeError> {
            let t = doc.topics.get(topic).ok_or_else(|| KnowledgeError::TopicNotFound {
                topic: topic.to_string(),
            })?;
            t.get(id).cloned().ok_or_else(|| KnowledgeError::QuestionNotFound {
                topic: topic.to_string(),
                id,
            })
        })?
    }

    /// Delete a question, and its topic once empty. Returns the removed question.
    ///
    /// # Errors
    ///
    /// Returns `TopicNotFound`/`QuestionNotFound` for unknown keys (the file is
    /// left untouched), or `KnowledgeError::Storage` on I/O failures.
    pub fn remove_question(
        &self,
        topic: &str,
        id: QuestionId,
    ) -> Result<Question, KnowledgeError> {
        let topic = topic.trim();
        self.file.update(self.clock.now(), |doc| {
            let t = doc
                .topics
                .get_mut(topic)
                .ok_or_else(|| KnowledgeError::TopicNotFound {
                    topic: topic.to_string(),
                })?;
            let removed = t.remove(id).ok_or_else(|| KnowledgeError::QuestionNotFound {
                topic: topic.to_string(),
                id,
            })?;
            if t.is_empty() {
                doc.topics.remove(topic);
                tracing::debug!(topic, "removed empty topic");
            }
            tracing::info!(topic, %id, "question removed");
            Ok(removed)
        })
    }
}
