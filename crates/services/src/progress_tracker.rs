use std::path::PathBuf;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use companion_core::model::{
    LearningSession, MasteryLevel, QaRecordDraft, QuestionId, ReviewScheduleEntry,
};
use companion_core::scheduler::{IntervalScheduler, NextReview};
use companion_core::stats::{self, Statistics, WeakTopic};
use storage::{JsonFile, RecordsDocument};

use crate::Clock;
use crate::error::ProgressError;

/// A session as appended to the log, with the schedule entry it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSession {
    pub session: LearningSession,
    pub schedule: ReviewScheduleEntry,
}

/// File-backed session log and review schedule for one student.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    clock: Clock,
    file: JsonFile<RecordsDocument>,
    student_name: String,
    scheduler: IntervalScheduler,
}

impl ProgressTracker {
    pub const DEFAULT_DAYS_AHEAD: i64 = 7;

    /// `student_name` is written into the records file the first time it is
    /// created; an existing file keeps its own name.
    #[must_use]
    pub fn new(clock: Clock, path: impl Into<PathBuf>, student_name: impl Into<String>) -> Self {
        Self {
            clock,
            file: JsonFile::new(path),
            student_name: student_name.into(),
            scheduler: IntervalScheduler::new(),
        }
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: IntervalScheduler) -> Self {
        self.scheduler = scheduler;
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

    /// Validate and append a session, then advance the question's schedule.
    ///
    /// The log and the schedule are written in a single file replacement.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Record` for invalid input (nothing is written)
    /// and `ProgressError::Storage` on lock or I/O failures.
    pub fn add_qa_record(&self, draft: QaRecordDraft) -> Result<RecordedSession, ProgressError> {
        let now = self.clock.now();
        let session = draft.validate(now)?;

        self.file.update(now, |doc| {
            if doc.student_name.is_empty() {
                doc.student_name.clone_from(&self.student_name);
            }

            let schedule = self
                .scheduler
                .schedule_session(doc.schedule_entry(session.question_id), &session);
            doc.learning_sessions.push(session.clone());
            doc.upsert_schedule(schedule.clone());

            tracing::info!(
                topic = %session.topic,
                score = session.score.value(),
                mastery = %session.mastery_level,
                next_review = %schedule.next_review,
                "learning session recorded"
            );
            Ok(RecordedSession { session, schedule })
        })
    }

    /// Preview the schedule a review at `mastery` would produce now, without
    /// recording anything.
    #[must_use]
    pub fn calculate_next_review(
        &self,
        previous: Option<&ReviewScheduleEntry>,
        mastery: MasteryLevel,
    ) -> NextReview {
        self.scheduler
            .calculate_next_review(previous, mastery, self.clock.now())
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the file cannot be read.
    pub fn schedule_for(
        &self,
        question_id: QuestionId,
    ) -> Result<Option<ReviewScheduleEntry>, ProgressError> {
        let entry = self
            .file
            .read(self.clock.now(), |doc| doc.schedule_entry(question_id).cloned())?;
        Ok(entry)
    }

    /// Schedule entries due within `days_ahead` days from now, earliest first.
    /// Overdue entries are included as well, so the window is
    /// `(-inf, now + days_ahead]` rather than `[now, now + days_ahead]`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidHorizon` for a negative horizon and
    /// `ProgressError::Storage` if the file cannot be read.
    pub fn get_pending_reviews(
        &self,
        days_ahead: i64,
    ) -> Result<Vec<ReviewScheduleEntry>, ProgressError> {
        if days_ahead < 0 {
            return Err(ProgressError::InvalidHorizon { days: days_ahead });
        }
        let now = self.clock.now();
        let horizon = ChronoDuration::try_days(days_ahead)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC);

        let mut pending: Vec<ReviewScheduleEntry> = self.file.read(now, |doc| {
            doc.review_schedule
                .iter()
                .filter(|e| e.is_due_by(horizon))
                .cloned()
                .collect()
        })?;
        pending.sort_by(|a, b| {
            a.next_review
                .cmp(&b.next_review)
                .then_with(|| a.question_id.cmp(&b.question_id))
        });
        Ok(pending)
    }

    /// Statistics recomputed from the full session log.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the file cannot be read.
    pub fn get_statistics(&self) -> Result<Statistics, ProgressError> {
        let stats = self.file.read(self.clock.now(), |doc| {
            Statistics::from_sessions(&doc.learning_sessions)
        })?;
        Ok(stats)
    }

    /// Topics averaging below `stats::WEAK_TOPIC_THRESHOLD`, worst first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the file cannot be read.
    pub fn get_weak_topics(&self) -> Result<Vec<WeakTopic>, ProgressError> {
        let weak = self.file.read(self.clock.now(), |doc| {
            stats::weak_topics(&doc.learning_sessions, stats::WEAK_TOPIC_THRESHOLD)
        })?;
        Ok(weak)
    }

    /// The full session log in recording order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the file cannot be read.
    pub fn sessions(&self) -> Result<Vec<LearningSession>, ProgressError> {
        let sessions = self
            .file
            .read(self.clock.now(), |doc| doc.learning_sessions.clone())?;
        Ok(sessions)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the file cannot be read.
    pub fn sessions_for_topic(&self, topic: &str) -> Result<Vec<LearningSession>, ProgressError> {
        let topic = topic.trim();
        let sessions = self.file.read(self.clock.now(), |doc| {
            doc.learning_sessions
                .iter()
                .filter(|s| s.topic == topic)
                .cloned()
                .collect()
        })?;
        Ok(sessions)
    }

    /// Student name stored in the records file, or the configured name when
    /// nothing has been recorded yet.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the file cannot be read.
    pub fn student_name(&self) -> Result<String, ProgressError> {
        let name = self.file.read(self.clock.now(), |doc| {
            if doc.student_name.is_empty() {
                self.student_name.clone()
            } else {
                doc.student_name.clone()
            }
        })?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use companion_core::time::{fixed_clock, fixed_now};

    fn tracker(dir: &tempfile::TempDir, clock: Clock) -> ProgressTracker {
        ProgressTracker::new(clock, dir.path().join("learning_records.json"), "Sixi")
    }

    #[test]
    fn out_of_range_score_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let t = tracker(&dir, fixed_clock());
        let err = t
            .add_qa_record(QaRecordDraft::new("SQL", "q", "q", 11))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!t.path().exists());
    }

    #[test]
    fn repeated_sessions_advance_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let t = tracker(&dir, fixed_clock());
        let draft = QaRecordDraft::new("SQL", "什么是左连接?", "What is a left join?", 8);

        let first = t.add_qa_record(draft.clone()).unwrap();
        let second = t.add_qa_record(draft).unwrap();

        assert_eq!(first.schedule.interval_days, 4);
        assert_eq!(second.schedule.interval_days, 8);
        assert_eq!(second.schedule.review_count, 2);

        let all = t.get_pending_reviews(30).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], second.schedule);
    }

    #[test]
    fn schedule_for_known_question() {
        let dir = tempfile::tempdir().unwrap();
        let t = tracker(&dir, fixed_clock());
        let id = QuestionId::generate();
        assert_eq!(t.schedule_for(id).unwrap(), None);

        let recorded = t
            .add_qa_record(QaRecordDraft::new("SQL", "q", "q", 3).for_question(id))
            .unwrap();
        assert_eq!(t.schedule_for(id).unwrap(), Some(recorded.schedule));
    }

    #[test]
    fn negative_horizon_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let t = tracker(&dir, fixed_clock());
        assert!(matches!(
            t.get_pending_reviews(-1),
            Err(ProgressError::InvalidHorizon { days: -1 })
        ));
    }

    #[test]
    fn student_name_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let t = tracker(&dir, fixed_clock());
        assert_eq!(t.student_name().unwrap(), "Sixi");
        t.add_qa_record(QaRecordDraft::new("SQL", "q", "q", 5)).unwrap();

        let other = ProgressTracker::new(fixed_clock(), t.path(), "Someone else");
        assert_eq!(other.student_name().unwrap(), "Sixi");
    }

    #[test]
    fn preview_does_not_record() {
        let dir = tempfile::tempdir().unwrap();
        let t = tracker(&dir, fixed_clock());
        let next = t.calculate_next_review(None, MasteryLevel::Good);
        assert_eq!(next.next_review, fixed_now() + ChronoDuration::days(4));
        assert!(t.sessions().unwrap().is_empty());
    }
}
