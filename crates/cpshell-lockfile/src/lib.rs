//! Advisory file locking.
//!
//! [`FileLock`] holds an exclusive `flock`-style lock on a dedicated lock
//! file for as long as it is alive. cpshell takes one around every write to
//! the lockfile and to a profile directory, so concurrent `cpshell enter` or
//! `cpshell lock` runs in the same repository queue up instead of
//! interleaving.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from acquiring or creating a lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock file could not be created, opened or locked.
    #[error("failed to lock {}", path.display())]
    Io {
        /// The lock file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// A specialized `Result` type for locking.
pub type Result<T> = std::result::Result<T, LockError>;

/// An exclusive lock, released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until an exclusive lock on `path` is held.
    ///
    /// The file and its parent directories are created if missing.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = open(path)?;
        FileExt::lock_exclusive(&file).map_err(|source| LockError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "lock acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Take the lock only if nobody else holds it.
    ///
    /// Returns `Ok(None)` when the lock is contended.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = open(path)?;
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(source) => Err(LockError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// The lock file this guard holds.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        tracing::debug!(path = %self.path.display(), "lock released");
    }
}

fn open(path: &Path) -> Result<File> {
    let io_err = |source| LockError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(io_err)
}
