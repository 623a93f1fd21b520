#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod knowledge_store;
pub mod mode_coordinator;
pub mod progress_tracker;

pub use companion_core::Clock;

pub use app_services::CompanionServices;
pub use config::CompanionConfig;
pub use error::{ConfigError, CoordinatorError, ErrorKind, KnowledgeError, ProgressError};
pub use knowledge_store::{AddOutcome, KnowledgeStore, SimilarQuestion};
pub use mode_coordinator::ModeCoordinator;
pub use progress_tracker::{ProgressTracker, RecordedSession};
