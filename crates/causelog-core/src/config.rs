//! Ledger configuration.
//!
//! The core is initialized with a log file path and an initial graph
//! capacity; everything else defaults. The data directory is the parent of
//! the log path (or the current directory when the log path has no parent).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// When the event log file is flushed to stable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsyncPolicy {
    /// Rely on the OS page cache; appends are not individually synced.
    #[default]
    Never,
    /// `sync_data` after every appended event.
    EachEvent,
}

/// Configuration for opening a [`crate::ledger::CausalLedger`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path of the append-only event log. Its parent directory is the data
    /// directory that also holds the event store and index snapshots.
    pub log_path: PathBuf,

    /// Initial vertex capacity of the causal graph.
    #[serde(default = "default_graph_capacity")]
    pub initial_graph_capacity: usize,

    /// Identifier of the local node in vector clocks.
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Durability policy for event log appends.
    #[serde(default)]
    pub fsync: FsyncPolicy,
}

impl LedgerConfig {
    /// Build a configuration with defaults for everything but the log path.
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            initial_graph_capacity: default_graph_capacity(),
            node_id: default_node_id(),
            fsync: FsyncPolicy::default(),
        }
    }

    /// The directory holding the log, the event store, and index snapshots.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        match self.log_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML does not parse or lacks `log_path`.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("parse ledger config")
    }

    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read ledger config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parse ledger config {}", path.display()))
    }
}

fn default_graph_capacity() -> usize {
    1000
}

fn default_node_id() -> String {
    "default-node".to_string()
}
