//! Secondary indexes maintained in lockstep with the DAG and event store.
//!
//! The DAG stores effect→cause edges over integer vertices; everything else
//! a query needs lives here: the event-id↔vertex bijection, the cause→effect
//! children mirror, the per-service / per-type / per-trace groupings (each in
//! ingestion order), and the per-trace head that drives auto-parenting.
//!
//! The children mirror duplicates the DAG's edge information on purpose:
//! ancestry and topological sorting walk effect→cause, while descendant
//! queries, shortest paths, and edge enumeration for graph DTOs walk
//! cause→effect. Both directions are updated together during ingestion.

pub mod persistence;

use crate::event::EventRecord;
use std::collections::HashMap;

/// The aggregate of all secondary mappings.
#[derive(Debug, Clone, Default)]
pub struct IndexSet {
    event_to_vertex: HashMap<String, usize>,
    vertex_to_event: HashMap<usize, String>,
    children: HashMap<usize, Vec<usize>>,
    by_service: HashMap<String, Vec<String>>,
    by_type: HashMap<String, Vec<String>>,
    by_trace: HashMap<String, Vec<String>>,
    trace_heads: HashMap<String, String>,
}

impl IndexSet {
    /// Empty index set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed events (vertices).
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.event_to_vertex.len()
    }

    /// `true` when no event has been indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_to_vertex.is_empty()
    }

    /// Register a committed event under its vertex: the bijection, the three
    /// groupings, and the trace head all advance together.
    pub fn record_event(&mut self, vertex: usize, record: &EventRecord) {
        let id = record.event_id.clone();
        self.event_to_vertex.insert(id.clone(), vertex);
        self.vertex_to_event.insert(vertex, id.clone());
        self.by_service
            .entry(record.service_name.clone())
            .or_default()
            .push(id.clone());
        self.by_type
            .entry(record.event_type.clone())
            .or_default()
            .push(id.clone());
        self.by_trace
            .entry(record.trace_id.clone())
            .or_default()
            .push(id.clone());
        self.trace_heads.insert(record.trace_id.clone(), id);
    }

    /// Mirror a committed DAG edge into the cause→effect adjacency.
    /// Idempotent, matching the DAG's duplicate-edge behavior.
    pub fn record_edge(&mut self, cause_vertex: usize, effect_vertex: usize) {
        let children = self.children.entry(cause_vertex).or_default();
        if !children.contains(&effect_vertex) {
            children.push(effect_vertex);
        }
    }

    /// The vertex allocated for `event_id`, if committed.
    #[must_use]
    pub fn vertex_of(&self, event_id: &str) -> Option<usize> {
        self.event_to_vertex.get(event_id).copied()
    }

    /// The event id committed at `vertex`, if any.
    #[must_use]
    pub fn event_of(&self, vertex: usize) -> Option<&str> {
        self.vertex_to_event.get(&vertex).map(String::as_str)
    }

    /// `true` iff `event_id` is committed.
    #[must_use]
    pub fn contains_event(&self, event_id: &str) -> bool {
        self.event_to_vertex.contains_key(event_id)
    }

    /// Direct effects of `vertex` in the cause→effect mirror.
    #[must_use]
    pub fn children_of(&self, vertex: usize) -> &[usize] {
        self.children.get(&vertex).map_or(&[], Vec::as_slice)
    }

    /// Event ids emitted by `service`, in ingestion order.
    #[must_use]
    pub fn events_for_service(&self, service: &str) -> &[String] {
        self.by_service.get(service).map_or(&[], Vec::as_slice)
    }

    /// Event ids of `event_type`, in ingestion order.
    #[must_use]
    pub fn events_for_type(&self, event_type: &str) -> &[String] {
        self.by_type.get(event_type).map_or(&[], Vec::as_slice)
    }

    /// Event ids on `trace_id`, in ingestion order.
    #[must_use]
    pub fn events_for_trace(&self, trace_id: &str) -> &[String] {
        self.by_trace.get(trace_id).map_or(&[], Vec::as_slice)
    }

    /// The latest event on `trace_id`; the default parent for the next
    /// event ingested on that trace.
    #[must_use]
    pub fn trace_head(&self, trace_id: &str) -> Option<&str> {
        self.trace_heads.get(trace_id).map(String::as_str)
    }

    /// The full children mirror, keyed by cause vertex.
    #[must_use]
    pub(crate) fn children_map(&self) -> &HashMap<usize, Vec<usize>> {
        &self.children
    }

    /// Drop every mapping.
    pub fn clear(&mut self) {
        self.event_to_vertex.clear();
        self.vertex_to_event.clear();
        self.children.clear();
        self.by_service.clear();
        self.by_type.clear();
        self.by_trace.clear();
        self.trace_heads.clear();
    }

    /// Rebuild an index set from snapshot parts. Trace heads are derived
    /// from the trace groupings (the last id of each trace's sequence).
    pub(crate) fn from_parts(
        event_to_vertex: HashMap<String, usize>,
        vertex_to_event: HashMap<usize, String>,
        children: HashMap<usize, Vec<usize>>,
        by_service: HashMap<String, Vec<String>>,
        by_type: HashMap<String, Vec<String>>,
        by_trace: HashMap<String, Vec<String>>,
    ) -> Self {
        let trace_heads = by_trace
            .iter()
            .filter_map(|(trace, ids)| ids.last().map(|id| (trace.clone(), id.clone())))
            .collect();

        Self {
            event_to_vertex,
            vertex_to_event,
            children,
            by_service,
            by_type,
            by_trace,
            trace_heads,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
