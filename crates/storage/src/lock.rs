use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::StorageError;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exclusive advisory lock on a sidecar `<file>.lock`.
///
/// The data file itself is replaced by rename on every write, so the lock
/// lives on a separate file that is never moved. Released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Sidecar lock path for `target`.
    #[must_use]
    pub fn path_for(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        target.with_file_name(name)
    }

    /// Acquire the lock guarding `target`, waiting at most `timeout`.
    ///
    /// Creates the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::LockTimeout` if another holder keeps the lock
    /// past `timeout`, or `StorageError::Io` if the lock file cannot be opened.
    pub fn acquire(target: &Path, timeout: Duration) -> Result<Self, StorageError> {
        let path = Self::path_for(target);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;

        let started = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    tracing::debug!(lock = %path.display(), waited = ?started.elapsed(), "acquired file lock");
                    return Ok(Self { file, path });
                }
                Err(e) if is_contended(&e) => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        tracing::warn!(lock = %path.display(), ?waited, "file lock timed out");
                        return Err(StorageError::LockTimeout { path, waited });
                    }
                    thread::sleep(POLL_INTERVAL.min(timeout - waited));
                }
                Err(e) => return Err(StorageError::io(&path, e)),
            }
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to release file lock");
        }
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
