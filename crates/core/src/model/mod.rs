mod coordinator;
mod ids;
mod question;
mod review;
mod session;
mod topic;

pub use coordinator::{AutoTeachingGate, CoordinatorMode, CoordinatorState};
pub use ids::{ParseIdError, QuestionId};
pub use question::{
    Difficulty, DifficultyError, Question, QuestionDraft, QuestionError, ValidatedQuestion,
};
pub use review::ReviewScheduleEntry;
pub use session::{LearningSession, MasteryLevel, QaRecordDraft, QaRecordError, Score, ScoreError};
pub use topic::{Topic, TopicError, TopicName, TopicSummary};
