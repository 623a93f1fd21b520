use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use storage::JsonFile;
use storage::KnowledgeBaseDocument;

use crate::error::ConfigError;
use crate::knowledge_store::KnowledgeStore;
use crate::mode_coordinator::ModeCoordinator;

pub const DATA_DIR_VAR: &str = "LEARNING_COMPANION_DIR";
pub const KB_FILE_VAR: &str = "KB_FILE";
pub const RECORDS_FILE_VAR: &str = "RECORDS_FILE";
pub const STATE_FILE_VAR: &str = "STATE_FILE";
pub const STUDENT_VAR: &str = "LEARNING_COMPANION_STUDENT";
pub const LOCK_TIMEOUT_VAR: &str = "LEARNING_COMPANION_LOCK_TIMEOUT_MS";

pub const KNOWLEDGE_BASE_FILE_NAME: &str = "knowledge_base.json";
pub const RECORDS_FILE_NAME: &str = "learning_records.json";
pub const COORDINATOR_FILE_NAME: &str = "coordination_state.json";
pub const DEFAULT_STUDENT_NAME: &str = "Student";

/// Where the three data files live and how the services built on them behave.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanionConfig {
    pub data_dir: PathBuf,
    pub knowledge_base_file: PathBuf,
    pub records_file: PathBuf,
    pub coordinator_file: PathBuf,
    pub student_name: String,
    pub similarity_threshold: f64,
    pub lock_timeout: Duration,
    pub idle_timeout: ChronoDuration,
}

impl CompanionConfig {
    /// Default file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let data_dir = dir.into();
        Self {
            knowledge_base_file: data_dir.join(KNOWLEDGE_BASE_FILE_NAME),
            records_file: data_dir.join(RECORDS_FILE_NAME),
            coordinator_file: data_dir.join(COORDINATOR_FILE_NAME),
            data_dir,
            student_name: DEFAULT_STUDENT_NAME.to_string(),
            similarity_threshold: KnowledgeStore::DEFAULT_SIMILARITY_THRESHOLD,
            lock_timeout: JsonFile::<KnowledgeBaseDocument>::DEFAULT_LOCK_TIMEOUT,
            idle_timeout: ModeCoordinator::DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// A separate data directory per student under `base`.
    #[must_use]
    pub fn for_student(base: impl AsRef<Path>, student_id: &str) -> Self {
        let student_id = student_id.trim();
        let mut config = Self::in_dir(base.as_ref().join(student_id));
        if !student_id.is_empty() {
            config.student_name = student_id.to_string();
        }
        config
    }

    #[must_use]
    pub fn with_student_name(mut self, name: impl Into<String>) -> Self {
        self.student_name = name.into();
        self
    }

    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: ChronoDuration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Build from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a numeric variable does not parse or the
    /// result fails `validate`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    ///
    /// `KB_FILE`, `RECORDS_FILE` and `STATE_FILE` may be relative, in which
    /// case they resolve against the data directory.
    ///
    /// # Errors
    ///
    /// Same as `from_env`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = var(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("learning_companion"));
        let mut config = Self::in_dir(data_dir);

        if let Some(file) = var(KB_FILE_VAR) {
            config.knowledge_base_file = config.data_dir.join(file);
        }
        if let Some(file) = var(RECORDS_FILE_VAR) {
            config.records_file = config.data_dir.join(file);
        }
        if let Some(file) = var(STATE_FILE_VAR) {
            config.coordinator_file = config.data_dir.join(file);
        }
        if let Some(name) = var(STUDENT_VAR) {
            config.student_name = name.trim().to_string();
        }
        if let Some(raw) = var(LOCK_TIMEOUT_VAR) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: LOCK_TIMEOUT_VAR,
                    raw,
                })?;
            config.lock_timeout = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` for a blank student name or a similarity
    /// threshold outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.student_name.trim().is_empty() {
            return Err(ConfigError::EmptyStudentName);
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::InvalidThreshold(self.similarity_threshold));
        }
        Ok(())
    }

    /// Create the data directory and the parents of every data file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::CreateDir` if a directory cannot be created.
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        let dirs = [
            Some(self.data_dir.as_path()),
            self.knowledge_base_file.parent(),
            self.records_file.parent(),
            self.coordinator_file.parent(),
        ];
        for dir in dirs.into_iter().flatten() {
            if dir.as_os_str().is_empty() {
                continue;
            }
            fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}
