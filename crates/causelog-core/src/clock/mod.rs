//! Vector clocks for causal ordering.
//!
//! A [`VectorClock`] maps node ids to monotonically increasing counters.
//! Nodes absent from the mapping are implicitly at zero, so two clocks are
//! compared over the union of their keys. The partial order this induces is
//! the happens-before relation: clock `A` happens before clock `B` when every
//! component of `A` is `<=` the matching component of `B` and at least one is
//! strictly smaller. Clocks where neither direction holds are concurrent.

pub mod manager;

pub use manager::VectorClockManager;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Causality
// ---------------------------------------------------------------------------

/// The causal relationship between two events, derived from their clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Causality {
    /// The first event happens before the second.
    Causes,
    /// The first event happens after the second.
    CausedBy,
    /// Neither event happens before the other.
    Concurrent,
    /// The two events carry equal vector time.
    Identical,
    /// At least one clock is missing; no comparison is possible.
    Undefined,
}

impl Causality {
    /// The relationship seen from the other event's perspective.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Causes => Self::CausedBy,
            Self::CausedBy => Self::Causes,
            other => other,
        }
    }

    /// `true` when one event causally depends on the other.
    #[must_use]
    pub const fn is_dependent(self) -> bool {
        matches!(self, Self::Causes | Self::CausedBy)
    }
}

impl fmt::Display for Causality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Causes => "CAUSES",
            Self::CausedBy => "CAUSED_BY",
            Self::Concurrent => "CONCURRENT",
            Self::Identical => "IDENTICAL",
            Self::Undefined => "UNDEFINED",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// VectorClock
// ---------------------------------------------------------------------------

/// Mapping from node id to logical counter.
///
/// Serialized as a plain JSON object (`{"node-a": 3, "node-b": 1}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    entries: BTreeMap<String, u64>,
}

impl VectorClock {
    /// An empty clock: every node at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The counter for `node`, zero if absent.
    #[must_use]
    pub fn get(&self, node: &str) -> u64 {
        self.entries.get(node).copied().unwrap_or(0)
    }

    /// Increment `node`'s counter, creating the entry at 1 if absent.
    /// Returns the new value.
    pub fn tick(&mut self, node: &str) -> u64 {
        let counter = self.entries.entry(node.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Pointwise maximum with `other`: for every node present in either
    /// clock, keep the larger counter.
    pub fn merge(&mut self, other: &Self) {
        for (node, &counter) in &other.entries {
            let entry = self.entries.entry(node.clone()).or_insert(0);
            if counter > *entry {
                *entry = counter;
            }
        }
    }

    /// [`merge`](Self::merge) followed by [`tick`](Self::tick) on the local
    /// node. Returns the local node's new counter.
    pub fn merge_and_tick(&mut self, other: &Self, local_node: &str) -> u64 {
        self.merge(other);
        self.tick(local_node)
    }

    /// Compare two clocks over the union of their keys.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Causality {
        let mut self_le = true;
        let mut other_le = true;

        for node in self.entries.keys().chain(other.entries.keys()) {
            let a = self.get(node);
            let b = other.get(node);
            if a > b {
                other_le = false;
            }
            if b > a {
                self_le = false;
            }
        }

        match (self_le, other_le) {
            (true, true) => Causality::Identical,
            (true, false) => Causality::Causes,
            (false, true) => Causality::CausedBy,
            (false, false) => Causality::Concurrent,
        }
    }

    /// `true` iff every component of `self` is `<=` the matching component
    /// of `other` and at least one is strictly smaller.
    #[must_use]
    pub fn happens_before(&self, other: &Self) -> bool {
        self.compare(other) == Causality::Causes
    }

    /// `true` iff neither clock happens before the other.
    #[must_use]
    pub fn concurrent_with(&self, other: &Self) -> bool {
        self.compare(other) == Causality::Concurrent
    }

    /// `true` when no node has ever ticked this clock.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of nodes tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate `(node, counter)` pairs in node order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(node, &counter)| (node.as_str(), counter))
    }
}

// Equality over the union of keys with implicit zeros: a clock that tracks a
// node at counter zero equals one that does not track it at all.
impl PartialEq for VectorClock {
    fn eq(&self, other: &Self) -> bool {
        self.entries
            .keys()
            .chain(other.entries.keys())
            .all(|node| self.get(node) == other.get(node))
    }
}

impl Eq for VectorClock {}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (node, counter)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{node}:{counter}")?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
