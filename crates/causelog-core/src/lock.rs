//! Advisory lock on the data directory.
//!
//! An open ledger holds an exclusive `fs2` file lock on `ledger.lock` inside
//! its data directory so that a second process cannot append to the same
//! event log or rewrite the same index snapshots. The lock is released on
//! drop.

use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// Errors from data-directory lock acquisition.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another process held the lock for the whole timeout window.
    #[error("data directory lock timed out after {waited:?} at {path}")]
    Timeout {
        /// The lock file path.
        path: PathBuf,
        /// How long acquisition was attempted.
        waited: Duration,
    },

    /// Creating or opening the lock file failed.
    #[error("data directory lock I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// RAII guard for the exclusive data-directory lock.
#[derive(Debug)]
pub struct LedgerLock {
    file: File,
    path: PathBuf,
}

impl LedgerLock {
    /// Acquire the exclusive lock, retrying every 10ms until `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] if another holder does not release in
    /// time, or [`LockError::Io`] on file-system failure.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            if file.try_lock_exclusive().is_ok() {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// The lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
