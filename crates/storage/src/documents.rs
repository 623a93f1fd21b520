//! On-disk shapes of the three companion files.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use companion_core::model::{CoordinatorState, LearningSession, ReviewScheduleEntry, Topic};
use companion_core::stats::Statistics;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

fn legacy_schema_version() -> u32 {
    1
}

/// A JSON document persisted by `JsonFile`.
pub trait Document: Serialize + DeserializeOwned + Clone + PartialEq {
    /// Short name used in logs and errors.
    const KIND: &'static str;

    /// Document to use when the file does not exist yet.
    fn empty(now: DateTime<Utc>) -> Self;

    fn schema_version(&self) -> u32;

    /// Hook run on the mutated document just before it is serialized.
    fn before_write(&mut self) {}
}

//
// ─── KNOWLEDGE BASE ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseMetadata {
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseDocument {
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub topics: BTreeMap<String, Topic>,
    pub metadata: KnowledgeBaseMetadata,
}

impl Document for KnowledgeBaseDocument {
    const KIND: &'static str = "knowledge base";

    fn empty(now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            topics: BTreeMap::new(),
            metadata: KnowledgeBaseMetadata { created_at: now },
        }
    }

    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

//
// ─── LEARNING RECORDS ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordsDocument {
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub student_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub learning_sessions: Vec<LearningSession>,
    #[serde(default)]
    pub review_schedule: Vec<ReviewScheduleEntry>,
    /// Snapshot for external readers. Rebuilt from `learning_sessions` on
    /// every write and never read back: loading always yields the default.
    #[serde(default, skip_deserializing)]
    pub statistics: Statistics,
}

impl RecordsDocument {
    #[must_use]
    pub fn schedule_entry(
        &self,
        question_id: companion_core::model::QuestionId,
    ) -> Option<&ReviewScheduleEntry> {
        self.review_schedule
            .iter()
            .find(|e| e.question_id == question_id)
    }

    /// Insert `entry`, replacing any entry for the same question.
    pub fn upsert_schedule(&mut self, entry: ReviewScheduleEntry) {
        match self
            .review_schedule
            .iter_mut()
            .find(|e| e.question_id == entry.question_id)
        {
            Some(existing) => *existing = entry,
            None => self.review_schedule.push(entry),
        }
    }
}

impl Document for RecordsDocument {
    const KIND: &'static str = "learning records";

    fn empty(now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            student_name: String::new(),
            created_at: now,
            learning_sessions: Vec::new(),
            review_schedule: Vec::new(),
            statistics: Statistics::default(),
        }
    }

    fn schema_version(&self) -> u32 {
        self.schema_version
    }

    fn before_write(&mut self) {
        self.statistics = Statistics::from_sessions(&self.learning_sessions);
    }
}

//
// ─── COORDINATOR ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorDocument {
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    #[serde(flatten)]
    pub state: CoordinatorState,
}

impl Document for CoordinatorDocument {
    const KIND: &'static str = "coordinator";

    fn empty(_now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            state: CoordinatorState::default(),
        }
    }

    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}
