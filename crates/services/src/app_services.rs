use std::sync::Arc;

use crate::Clock;
use crate::config::CompanionConfig;
use crate::error::ConfigError;
use crate::knowledge_store::KnowledgeStore;
use crate::mode_coordinator::ModeCoordinator;
use crate::progress_tracker::ProgressTracker;

/// The three file-backed components wired from one configuration.
#[derive(Clone)]
pub struct CompanionServices {
    config: CompanionConfig,
    knowledge: Arc<KnowledgeStore>,
    progress: Arc<ProgressTracker>,
    coordinator: Arc<ModeCoordinator>,
}

impl CompanionServices {
    /// Validate `config`, create its data directory and build every service.
    ///
    /// Data files themselves are created lazily on first write.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails or the directory cannot be
    /// created.
    pub fn open(config: &CompanionConfig, clock: Clock) -> Result<Self, ConfigError> {
        config.validate()?;
        config.ensure_data_dir()?;

        let knowledge = Arc::new(
            KnowledgeStore::new(clock, &config.knowledge_base_file)
                .with_threshold(config.similarity_threshold)
                .with_lock_timeout(config.lock_timeout),
        );
        let progress = Arc::new(
            ProgressTracker::new(clock, &config.records_file, config.student_name.clone())
                .with_lock_timeout(config.lock_timeout),
        );
        let coordinator = Arc::new(
            ModeCoordinator::new(clock, &config.coordinator_file)
                .with_idle_timeout(config.idle_timeout)
                .with_lock_timeout(config.lock_timeout),
        );

        tracing::debug!(data_dir = %config.data_dir.display(), "companion services opened");

        Ok(Self {
            config: config.clone(),
            knowledge,
            progress,
            coordinator,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CompanionConfig {
        &self.config
    }

    #[must_use]
    pub fn knowledge(&self) -> Arc<KnowledgeStore> {
        Arc::clone(&self.knowledge)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn coordinator(&self) -> Arc<ModeCoordinator> {
        Arc::clone(&self.coordinator)
    }
}
