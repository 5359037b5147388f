//! Public error surface of the ledger.
//!
//! Each failure kind maps to a distinct caller action: `InvalidArgument`,
//! `UnknownParent`, and `CausalLoop` are caller-correctable and leave the
//! ledger unchanged; `Persistence` means a log append, store write, index
//! snapshot, or lock acquisition failed and the ingestion must be treated
//! as failed. Lookups on unknown event ids return `None` or empty
//! collections instead of erroring.

use crate::dag::DagError;
use crate::event::log::LogError;
use crate::index::persistence::SnapshotError;
use crate::lock::LockError;
use crate::store::StoreError;

/// Errors surfaced by [`crate::ledger::CausalLedger`] operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A required string argument was empty or malformed. No state change.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An explicit causal parent id does not refer to a committed event.
    /// No state change.
    #[error("unknown parent event '{0}'")]
    UnknownParent(String),

    /// The proposed parent set would close a cycle in the causal graph.
    /// No state change.
    #[error(
        "ingesting '{event_type}' on trace '{trace_id}' would close a causal loop \
         (parents: {parents:?})"
    )]
    CausalLoop {
        /// Event type of the rejected ingestion.
        event_type: String,
        /// Trace the rejected event belonged to.
        trace_id: String,
        /// The resolved parent ids that would have closed the loop.
        parents: Vec<String>,
    },

    /// A log append, event-store write, index snapshot, or lock acquisition
    /// failed. Never recovered silently.
    #[error("persistence failure: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

impl LedgerError {
    /// Wrap any error as a persistence failure.
    pub fn persistence(err: impl Into<anyhow::Error>) -> Self {
        Self::Persistence(err.into())
    }
}

impl From<LogError> for LedgerError {
    fn from(err: LogError) -> Self {
        Self::persistence(err)
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        Self::persistence(err)
    }
}

impl From<SnapshotError> for LedgerError {
    fn from(err: SnapshotError) -> Self {
        Self::persistence(err)
    }
}

impl From<LockError> for LedgerError {
    fn from(err: LockError) -> Self {
        Self::persistence(err)
    }
}

impl From<DagError> for LedgerError {
    fn from(err: DagError) -> Self {
        Self::persistence(err)
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence(err)
    }
}
