use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What the learner is currently doing, as seen by automated teaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorMode {
    #[default]
    Idle,
    ActiveLearning,
    Suppressed,
}

impl fmt::Display for CoordinatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CoordinatorMode::Idle => "idle",
            CoordinatorMode::ActiveLearning => "active_learning",
            CoordinatorMode::Suppressed => "suppressed",
        })
    }
}

/// Answer to "may the auto-teaching process act now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoTeachingGate {
    Allowed,
    BlockedByActiveLearning,
    /// `until` is `None` when suppressed without an end time.
    Suppressed { until: Option<DateTime<Utc>> },
}

impl AutoTeachingGate {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, AutoTeachingGate::Allowed)
    }
}

/// Shared coordination flag between an interactive session and background
/// teaching.
///
/// Every transition is total: calling one from a state it does not apply to
/// leaves the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoordinatorState {
    #[serde(default)]
    pub mode: CoordinatorMode,
    #[serde(default)]
    pub active_topics: BTreeSet<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub suppress_until: Option<DateTime<Utc>>,
}

impl CoordinatorState {
    /// Enter active learning on `topics`.
    ///
    /// Re-entering while already active replaces the topics and keeps the
    /// original start time.
    pub fn start_active_learning<I, S>(&mut self, topics: I, now: DateTime<Utc>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.mode != CoordinatorMode::ActiveLearning {
            self.started_at = Some(now);
        }
        self.mode = CoordinatorMode::ActiveLearning;
        self.active_topics = topics
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self.suppress_until = None;
        self.last_activity = Some(now);
    }

    /// Leave active learning. Returns false when there was nothing to end.
    pub fn end_active_learning(&mut self, now: DateTime<Utc>) -> bool {
        if self.mode != CoordinatorMode::ActiveLearning {
            return false;
        }
        self.mode = CoordinatorMode::Idle;
        self.active_topics.clear();
        self.started_at = None;
        self.last_activity = Some(now);
        true
    }

    /// Pause automated teaching, optionally until `until`.
    pub fn suppress(&mut self, until: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        self.mode = CoordinatorMode::Suppressed;
        self.active_topics.clear();
        self.started_at = None;
        self.suppress_until = until;
        self.last_activity = Some(now);
    }

    /// Lift a suppression. Returns false when not suppressed.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.mode != CoordinatorMode::Suppressed {
            return false;
        }
        self.mode = CoordinatorMode::Idle;
        self.suppress_until = None;
        self.last_activity = Some(now);
        true
    }

    /// Administrative override. Any mode other than active learning clears
    /// the topic set.
    pub fn set_mode(&mut self, mode: CoordinatorMode, now: DateTime<Utc>) {
        if mode != CoordinatorMode::ActiveLearning {
            self.active_topics.clear();
            self.started_at = None;
        } else if self.mode != CoordinatorMode::ActiveLearning {
            self.started_at = Some(now);
        }
        if mode != CoordinatorMode::Suppressed {
            self.suppress_until = None;
        }
        self.mode = mode;
        self.last_activity = Some(now);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = Some(now);
    }

    /// End an active session whose last activity is older than `timeout`.
    /// Returns whether a session was ended.
    pub fn expire_idle(&mut self, timeout: Duration, now: DateTime<Utc>) -> bool {
        if self.mode != CoordinatorMode::ActiveLearning {
            return false;
        }
        let stale = self
            .last_activity
            .is_none_or(|last| now.signed_duration_since(last) > timeout);
        stale && self.end_active_learning(now)
    }

    #[must_use]
    pub fn should_suppress_auto_teaching(&self) -> bool {
        self.mode == CoordinatorMode::ActiveLearning
    }

    /// Gate for the auto-teaching process; a suppression whose end time has
    /// passed no longer blocks.
    #[must_use]
    pub fn auto_teaching_gate(&self, now: DateTime<Utc>) -> AutoTeachingGate {
        match self.mode {
            CoordinatorMode::ActiveLearning => AutoTeachingGate::BlockedByActiveLearning,
            CoordinatorMode::Suppressed => match self.suppress_until {
                Some(until) if until <= now => AutoTeachingGate::Allowed,
                until => AutoTeachingGate::Suppressed { until },
            },
            CoordinatorMode::Idle => AutoTeachingGate::Allowed,
        }
    }
}
