//! The append-only event log: the ledger's system of record.
//!
//! Newline-delimited UTF-8 file, one serialized event per line, appended in
//! ingestion order and never truncated by the core. The file is opened in
//! append mode per write; the ledger's writer lock serializes appends.
//! Rehydration reads the whole file through the tolerant parser.

use super::parser::{parse_lines, ReplayedEvents};
use super::writer::{write_line, WriteError};
use super::EventRecord;
use crate::config::FsyncPolicy;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Errors from event log I/O.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Opening, appending, or reading the log file failed.
    #[error("event log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the event to its line form failed.
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Handle to the append-only log file.
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    fsync: FsyncPolicy,
}

impl EventLog {
    /// Create a handle. The file itself is created on first append.
    pub fn new(path: impl Into<PathBuf>, fsync: FsyncPolicy) -> Self {
        Self {
            path: path.into(),
            fsync,
        }
    }

    /// The log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a single line.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if serialization or the write fails. On failure
    /// nothing is guaranteed to have reached the file; the caller treats the
    /// ingestion as failed.
    pub fn append(&self, record: &EventRecord) -> Result<(), LogError> {
        let line = write_line(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        if self.fsync == FsyncPolicy::EachEvent {
            file.sync_data()?;
        }
        debug!(event_id = %record.event_id, "event appended to log");
        Ok(())
    }

    /// Read and parse the whole log. A missing file is an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] only when the file exists but cannot be
    /// read; corrupt lines inside a readable file are skipped and counted.
    pub fn replay(&self) -> Result<ReplayedEvents, LogError> {
        if !self.path.exists() {
            return Ok(ReplayedEvents::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(parse_lines(&content))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
