//! Durable event-body store on embedded SQLite.
//!
//! A single `event_bodies(event_id, body)` table keyed by event id, living in
//! an engine-owned directory under the data directory. Runtime defaults are
//! intentionally conservative:
//! - `journal_mode = WAL` so readers are not blocked while a writer appends
//! - `busy_timeout = 5s` to ride out transient lock contention
//! - `synchronous = NORMAL`
//!
//! The store is written *after* the log append, so the log stays
//! authoritative if a crash lands between the two. Bodies are the canonical
//! line serialization of the record, making store contents and log lines
//! interchangeable.

use crate::event::parser::parse_line;
use crate::event::writer::to_log_line;
use crate::event::EventRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Name of the engine-owned directory inside the data directory.
pub const STORE_DIR_NAME: &str = "event_store_sqlite";

const STORE_FILE_NAME: &str = "events.db";

/// Busy timeout applied to the store connection.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from event store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Creating the store directory failed.
    #[error("event store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying engine rejected an operation.
    #[error("event store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Serializing a record for storage failed.
    #[error("failed to encode event body: {0}")]
    Encode(String),

    /// A stored body no longer parses as an event record.
    #[error("stored body for event '{id}' is unreadable: {reason}")]
    CorruptBody {
        /// The event id whose body failed to parse.
        id: String,
        /// Parser failure detail.
        reason: String,
    },
}

/// Handle to the embedded key→body store.
#[derive(Debug)]
pub struct EventStore {
    conn: Mutex<Connection>,
}

impl EventStore {
    /// Open (or create) the store inside `dir`, applying pragmas and schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory cannot be created or the
    /// database cannot be opened and configured.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(STORE_FILE_NAME))?;
        Self::from_connection(conn)
    }

    /// Open an in-memory store. Test-only convenience.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the in-memory database cannot be opened.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        configure_connection(&conn)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS event_bodies (
                event_id TEXT PRIMARY KEY,
                body     TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Write a record's body under its event id. Replaces any existing body
    /// for the same id, which makes rebuild re-puts idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on serialization or engine failure.
    pub fn put(&self, record: &EventRecord) -> Result<(), StoreError> {
        let body = to_log_line(record).map_err(|e| StoreError::Encode(e.to_string()))?;
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO event_bodies (event_id, body) VALUES (?1, ?2)",
            params![record.event_id, body],
        )?;
        debug!(event_id = %record.event_id, "event body stored");
        Ok(())
    }

    /// Fetch the record stored under `event_id`, absent if unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptBody`] if a stored body fails to parse,
    /// or [`StoreError::Sqlite`] on engine failure.
    pub fn get(&self, event_id: &str) -> Result<Option<EventRecord>, StoreError> {
        let conn = self.lock();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM event_bodies WHERE event_id = ?1",
                params![event_id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            None => Ok(None),
            Some(body) => parse_line(&body)
                .map(Some)
                .map_err(|e| StoreError::CorruptBody {
                    id: event_id.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// `true` iff a body exists for `event_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on engine failure.
    pub fn contains(&self, event_id: &str) -> Result<bool, StoreError> {
        let conn = self.lock();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM event_bodies WHERE event_id = ?1",
                params![event_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Number of stored bodies.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on engine failure.
    pub fn len(&self) -> Result<usize, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM event_bodies", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// `true` when no body is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on engine failure.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// All stored event ids, unordered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on engine failure.
    pub fn event_ids(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT event_id FROM event_bodies")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Readability check used during warm startup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the store cannot be queried.
    pub fn probe(&self) -> Result<usize, StoreError> {
        self.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
