use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::documents::{Document, SCHEMA_VERSION};
use crate::error::StorageError;
use crate::lock::FileLock;

/// A JSON document on disk with locked read-modify-write access.
///
/// Each call takes the sidecar lock, reads the current file, runs the
/// closure, writes back atomically (temp file + rename) if the document
/// changed, and releases the lock before returning.
#[derive(Debug, Clone)]
pub struct JsonFile<D> {
    path: PathBuf,
    lock_timeout: Duration,
    _doc: PhantomData<fn() -> D>,
}

impl<D: Document> JsonFile<D> {
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
            _doc: PhantomData,
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Run `f` against the current document.
    ///
    /// A missing file reads as `D::empty(now)` and is not created.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lock times out or the file cannot be read
    /// or parsed.
    pub fn read<R>(&self, now: DateTime<Utc>, f: impl FnOnce(&D) -> R) -> Result<R, StorageError> {
        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let doc = self.load(now)?;
        Ok(f(&doc))
    }

    /// Run `f` against the current document and persist the result.
    ///
    /// Nothing is written when `f` fails or leaves the document unchanged.
    ///
    /// # Errors
    ///
    /// Returns `f`'s error, or `StorageError` (converted into `E`) for lock,
    /// read, parse or write failures.
    pub fn update<R, E>(
        &self,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut D) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StorageError>,
    {
        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let original = self.load(now)?;

        let mut doc = original.clone();
        let out = f(&mut doc)?;

        if doc != original {
            doc.before_write();
            self.write(&doc)?;
        }
        Ok(out)
    }

    fn load(&self, now: DateTime<Utc>) -> Result<D, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(kind = D::KIND, path = %self.path.display(), "no document yet, starting empty");
                return Ok(D::empty(now));
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let doc: D = serde_json::from_str(&raw).map_err(|source| {
            tracing::warn!(kind = D::KIND, path = %self.path.display(), error = %source, "refusing corrupt document");
            StorageError::Corrupt {
                kind: D::KIND,
                path: self.path.clone(),
                source,
            }
        })?;

        if doc.schema_version() > SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                kind: D::KIND,
                path: self.path.clone(),
                found: doc.schema_version(),
                supported: SCHEMA_VERSION,
            });
        }

        Ok(doc)
    }

    fn write(&self, doc: &D) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(doc).map_err(|source| {
            StorageError::Serialization {
                kind: D::KIND,
                source,
            }
        })?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        if let Err(e) = self.replace_from(&tmp_path, json.as_bytes()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        tracing::debug!(kind = D::KIND, path = %self.path.display(), bytes = json.len(), "wrote document");
        Ok(())
    }

    /// Write `bytes` to `tmp_path`, sync, then rename over the target.
    fn replace_from(&self, tmp_path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let mut file = File::create(tmp_path).map_err(|e| StorageError::io(tmp_path, e))?;
        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| StorageError::io(tmp_path, e))?;
        drop(file);

        fs::rename(tmp_path, &self.path).map_err(|e| StorageError::io(&self.path, e))
    }
}
