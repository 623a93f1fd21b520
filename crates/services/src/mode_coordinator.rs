use std::path::PathBuf;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use companion_core::model::{AutoTeachingGate, CoordinatorMode, CoordinatorState};
use storage::{CoordinatorDocument, JsonFile};

use crate::Clock;
use crate::error::CoordinatorError;

/// Cross-process flag telling background teaching whether to stay quiet.
///
/// Each call is one locked read-modify-write of the coordinator file, so an
/// interactive session in one process and a scheduler in another always see
/// each other's transitions in order.
#[derive(Debug, Clone)]
pub struct ModeCoordinator {
    clock: Clock,
    file: JsonFile<CoordinatorDocument>,
    idle_timeout: ChronoDuration,
}

impl ModeCoordinator {
    pub const DEFAULT_IDLE_TIMEOUT: ChronoDuration = ChronoDuration::minutes(30);

    #[must_use]
    pub fn new(clock: Clock, path: impl Into<PathBuf>) -> Self {
        Self {
            clock,
            file: JsonFile::new(path),
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: ChronoDuration) -> Self {
        self.idle_timeout = timeout;
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

    #[must_use]
    pub fn idle_timeout(&self) -> ChronoDuration {
        self.idle_timeout
    }

    /// # Errors
    ///
    /// Returns `CoordinatorError` on lock or I/O failures.
    pub fn start_active_learning<I, S>(&self, topics: I) -> Result<(), CoordinatorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = self.clock.now();
        self.file.update(now, |doc| {
            doc.state.start_active_learning(topics, now);
            tracing::info!(topics = ?doc.state.active_topics, "active learning started");
            Ok(())
        })
    }

    /// Returns false when no session was active.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError` on lock or I/O failures.
    pub fn end_active_learning(&self) -> Result<bool, CoordinatorError> {
        let now = self.clock.now();
        self.file.update(now, |doc| {
            let ended = doc.state.end_active_learning(now);
            if ended {
                tracing::info!("active learning ended");
            }
            Ok(ended)
        })
    }

    /// True while an interactive session is running.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError` if the state file cannot be read.
    pub fn should_suppress_auto_teaching(&self) -> Result<bool, CoordinatorError> {
        let suppress = self.file.read(self.clock.now(), |doc| {
            doc.state.should_suppress_auto_teaching()
        })?;
        Ok(suppress)
    }

    /// # Errors
    ///
    /// Returns `CoordinatorError` on lock or I/O failures.
    pub fn set_state(&self, mode: CoordinatorMode) -> Result<(), CoordinatorError> {
        let now = self.clock.now();
        self.file.update(now, |doc| {
            let from = doc.state.mode;
            doc.state.set_mode(mode, now);
            tracing::info!(%from, to = %mode, "coordinator mode set");
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns `CoordinatorError` if the state file cannot be read.
    pub fn get_state(&self) -> Result<CoordinatorState, CoordinatorError> {
        let state = self
            .file
            .read(self.clock.now(), |doc| doc.state.clone())?;
        Ok(state)
    }

    /// # Errors
    ///
    /// Returns `CoordinatorError` on lock or I/O failures.
    pub fn touch_activity(&self) -> Result<(), CoordinatorError> {
        let now = self.clock.now();
        self.file.update(now, |doc| {
            doc.state.touch(now);
            Ok(())
        })
    }

    /// End an active session that has seen no activity for longer than the
    /// idle timeout. Returns whether one was ended.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError` on lock or I/O failures.
    pub fn expire_idle_session(&self) -> Result<bool, CoordinatorError> {
        let now = self.clock.now();
        self.file.update(now, |doc| {
            let expired = doc.state.expire_idle(self.idle_timeout, now);
            if expired {
                tracing::info!(
                    idle_minutes = self.idle_timeout.num_minutes(),
                    "idle active learning session expired"
                );
            }
            Ok(expired)
        })
    }

    /// Pause automated teaching, for `duration` if given, otherwise until
    /// `resume_auto_teaching`.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError` on lock or I/O failures.
    pub fn suppress_auto_teaching(
        &self,
        duration: Option<ChronoDuration>,
    ) -> Result<(), CoordinatorError> {
        let now = self.clock.now();
        let until = duration.and_then(|d| now.checked_add_signed(d));
        self.file.update(now, |doc| {
            doc.state.suppress(until, now);
            tracing::info!(?until, "auto teaching suppressed");
            Ok(())
        })
    }

    /// Returns false when teaching was not suppressed.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError` on lock or I/O failures.
    pub fn resume_auto_teaching(&self) -> Result<bool, CoordinatorError> {
        let now = self.clock.now();
        self.file.update(now, |doc| {
            let resumed = doc.state.resume(now);
            if resumed {
                tracing::info!("auto teaching resumed");
            }
            Ok(resumed)
        })
    }

    /// # Errors
    ///
    /// Returns `CoordinatorError` if the state file cannot be read.
    pub fn auto_teaching_gate(&self) -> Result<AutoTeachingGate, CoordinatorError> {
        let now = self.clock.now();
        let gate = self
            .file
            .read(now, |doc| doc.state.auto_teaching_gate(now))?;
        Ok(gate)
    }
}
