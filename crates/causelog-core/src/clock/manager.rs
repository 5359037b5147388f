//! Vector clock manager: the local node's view of logical time.
//!
//! The manager owns the local clock and the last-seen clock of every node it
//! has observed (itself included). All event stamping flows through
//! [`VectorClockManager::stamp_event`]:
//!
//! 1. copy the local clock,
//! 2. merge each causal parent's clock into the copy,
//! 3. tick the local node on the copy,
//! 4. merge the copy back into the local clock and refresh the self entry,
//! 5. build the immutable [`EventRecord`] carrying the copy.
//!
//! [`receive_event`](VectorClockManager::receive_event) is the entry point
//! for events produced by another node; no transport is wired to it here.

use super::VectorClock;
use crate::event::{EventRecord, Payload};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Owns the local [`VectorClock`] and the per-node last-seen clock table.
#[derive(Debug, Clone)]
pub struct VectorClockManager {
    local_node_id: String,
    local_clock: VectorClock,
    node_clocks: HashMap<String, VectorClock>,
}

impl VectorClockManager {
    /// Create a manager for `local_node_id`, ticked once so the local node
    /// starts at counter 1.
    pub fn new(local_node_id: impl Into<String>) -> Self {
        let local_node_id = local_node_id.into();
        let mut local_clock = VectorClock::new();
        local_clock.tick(&local_node_id);

        let mut node_clocks = HashMap::new();
        node_clocks.insert(local_node_id.clone(), local_clock.clone());

        Self {
            local_node_id,
            local_clock,
            node_clocks,
        }
    }

    /// The id this manager stamps events with.
    #[must_use]
    pub fn local_node_id(&self) -> &str {
        &self.local_node_id
    }

    /// Stamp a new event: fresh id, current wall time, and a vector clock
    /// that dominates the local clock and every parent clock.
    ///
    /// The caller is responsible for argument validation and for persisting
    /// the returned record; the local clock advances immediately.
    #[allow(clippy::too_many_arguments)]
    pub fn stamp_event(
        &mut self,
        trace_id: &str,
        service_name: &str,
        service_version: &str,
        hostname: &str,
        event_type: &str,
        payload: Payload,
        parents: &[EventRecord],
    ) -> EventRecord {
        let mut clock = self.local_clock.clone();
        let mut parent_ids = Vec::with_capacity(parents.len());
        for parent in parents {
            clock.merge(&parent.vector_clock);
            parent_ids.push(parent.event_id.clone());
        }
        clock.tick(&self.local_node_id);

        self.local_clock.merge(&clock);
        self.node_clocks
            .insert(self.local_node_id.clone(), self.local_clock.clone());

        EventRecord {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            node_id: self.local_node_id.clone(),
            trace_id: trace_id.to_string(),
            service_name: service_name.to_string(),
            service_version: service_version.to_string(),
            hostname: hostname.to_string(),
            event_type: event_type.to_string(),
            payload,
            causal_parent_event_ids: parent_ids,
            vector_clock: clock,
        }
    }

    /// Process an event produced by another node: merge-and-tick the local
    /// clock and record the remote node's last-seen clock.
    pub fn receive_event(&mut self, remote: &EventRecord) {
        self.local_clock
            .merge_and_tick(&remote.vector_clock, &self.local_node_id);
        self.node_clocks
            .insert(self.local_node_id.clone(), self.local_clock.clone());
        self.node_clocks
            .insert(remote.node_id.clone(), remote.vector_clock.clone());
    }

    /// Fold a replayed record's clock into local time without ticking.
    ///
    /// Used during startup so that the first event stamped after a restart
    /// happens-after everything already committed to the log.
    pub fn observe(&mut self, record: &EventRecord) {
        self.local_clock.merge(&record.vector_clock);
        self.node_clocks
            .entry(record.node_id.clone())
            .or_default()
            .merge(&record.vector_clock);
        self.node_clocks
            .insert(self.local_node_id.clone(), self.local_clock.clone());
    }

    /// A copy of the current local clock.
    #[must_use]
    pub fn current_clock(&self) -> VectorClock {
        self.local_clock.clone()
    }

    /// The last-seen clock of `node`, empty if never observed.
    #[must_use]
    pub fn clock_of(&self, node: &str) -> VectorClock {
        self.node_clocks.get(node).cloned().unwrap_or_default()
    }

    /// Ids of every node this manager has observed, self included.
    #[must_use]
    pub fn known_nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.node_clocks.keys().map(String::as_str).collect();
        nodes.sort_unstable();
        nodes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
