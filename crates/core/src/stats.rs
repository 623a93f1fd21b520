//! Aggregates derived from the learning session log.
//!
//! Everything here is a pure function of a slice of `LearningSession`s; the
//! values are recomputed on demand and never treated as stored truth.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::LearningSession;

/// Topics averaging below this score are reported as weak.
pub const WEAK_TOPIC_THRESHOLD: f64 = 6.0;

/// Overall learning statistics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub total_questions: usize,
    /// Sessions scoring at or above `Score::PASS`.
    pub correct_answers: usize,
    /// `correct_answers / total_questions`, 0.0 for an empty log.
    pub accuracy: f64,
    /// Mean score, 0.0 for an empty log.
    pub average_score: f64,
}

impl Statistics {
    #[must_use]
    pub fn from_sessions(sessions: &[LearningSession]) -> Self {
        if sessions.is_empty() {
            return Self::default();
        }

        let total = sessions.len();
        let correct = sessions.iter().filter(|s| s.score.is_passing()).count();
        let sum: u64 = sessions.iter().map(|s| u64::from(s.score.value())).sum();

        #[allow(clippy::cast_precision_loss)]
        let (total_f, correct_f, sum_f) = (total as f64, correct as f64, sum as f64);

        Self {
            total_questions: total,
            correct_answers: correct,
            accuracy: correct_f / total_f,
            average_score: sum_f / total_f,
        }
    }
}

/// Per-topic aggregate for a topic below the weak threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakTopic {
    pub topic: String,
    pub average_score: f64,
    pub attempts: usize,
}

/// Topics whose average score is below `threshold`, worst first.
///
/// Ties keep the order in which topics first appear in the log.
#[must_use]
pub fn weak_topics(sessions: &[LearningSession], threshold: f64) -> Vec<WeakTopic> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, (u64, usize)> = HashMap::new();

    for s in sessions {
        let entry = totals.entry(s.topic.as_str()).or_insert_with(|| {
            order.push(s.topic.as_str());
            (0, 0)
        });
        entry.0 += u64::from(s.score.value());
        entry.1 += 1;
    }

    let mut weak: Vec<WeakTopic> = order
        .into_iter()
        .filter_map(|topic| {
            let (sum, attempts) = totals[topic];
            #[allow(clippy::cast_precision_loss)]
            let average_score = sum as f64 / attempts as f64;
            (average_score < threshold).then(|| WeakTopic {
                topic: topic.to_string(),
                average_score,
                attempts,
            })
        })
        .collect();

    weak.sort_by(|a, b| a.average_score.total_cmp(&b.average_score));
    weak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QaRecordDraft;
    use crate::time::fixed_now;

    fn s(topic: &str, score: i64) -> LearningSession {
        QaRecordDraft::new(topic, format!("{topic} question"), "q", score)
            .validate(fixed_now())
            .unwrap()
    }

    #[test]
    fn empty_log_is_all_zero() {
        assert_eq!(Statistics::from_sessions(&[]), Statistics::default());
    }

    #[test]
    fn counts_correct_answers_at_pass_threshold() {
        let log = vec![s("A", 10), s("A", 6), s("B", 5), s("B", 3)];
        let stats = Statistics::from_sessions(&log);
        assert_eq!(stats.total_questions, 4);
        assert_eq!(stats.correct_answers, 2);
        assert!((stats.accuracy - 0.5).abs() < f64::EPSILON);
        assert!((stats.average_score - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weak_topics_are_sorted_worst_first() {
        let log = vec![
            s("Rust", 9),
            s("SQL", 5),
            s("Go", 2),
            s("SQL", 4),
            s("Go", 4),
            s("Rust", 3),
        ];
        let weak = weak_topics(&log, WEAK_TOPIC_THRESHOLD);
        let names: Vec<_> = weak.iter().map(|w| w.topic.as_str()).collect();
        assert_eq!(names, vec!["Go", "SQL"]);
        assert_eq!(weak[0].attempts, 2);
        assert!((weak[0].average_score - 3.0).abs() < f64::EPSILON);
        assert!((weak[1].average_score - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn topic_at_threshold_is_not_weak() {
        let log = vec![s("A", 6), s("A", 6)];
        assert!(weak_topics(&log, WEAK_TOPIC_THRESHOLD).is_empty());
    }
}
