//! The causal ledger: coordinating façade over the DAG, indexes, clocks,
//! event log, event store, and projector.
//!
//! # Ingestion protocol
//!
//! Ingestion runs entirely under the writer lock: resolve the parent set
//! (explicit ids, else the per-trace head), validate every parent exists,
//! probe the DAG with an overlay of the uncommitted edges, stamp the record
//! with logical time, append to the log, write the body to the store, and
//! only then allocate the vertex and update the DAG plus every index. A
//! rejected ingestion (`UnknownParent`, `CausalLoop`) leaves the ledger
//! untouched; a log-append failure surfaces before any in-memory mutation.
//!
//! # Startup
//!
//! `open` takes the warm path when all index snapshots load (the log is then
//! streamed once, for edges only) and otherwise rebuilds everything from the
//! log in two passes. The log is the system of record either way.
//!
//! # Concurrency
//!
//! One reader-writer lock guards all mutable state. Writers are serialized;
//! readers run concurrently and hold their lease for the full computation,
//! so multi-step queries observe a consistent snapshot.

use crate::clock::{Causality, VectorClock, VectorClockManager};
use crate::config::LedgerConfig;
use crate::dag::{shortest_path, CausalDag};
use crate::error::LedgerError;
use crate::event::{EventLog, EventRecord, Payload};
use crate::index::{persistence, IndexSet};
use crate::lock::LedgerLock;
use crate::project::{ProjectedState, Reducer, StateProjector};
use crate::store::{EventStore, STORE_DIR_NAME};
use anyhow::anyhow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

const LOCK_FILE_NAME: &str = "ledger.lock";
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters and gauges describing the ledger at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStats {
    /// Committed events.
    pub events: usize,
    /// Events ingested by this process.
    pub ingested: u64,
    /// Cycle probes run by this process.
    pub cycle_checks: u64,
    /// Ingestions rejected for closing a cycle.
    pub cycles_prevented: u64,
    /// Allocated DAG vertices.
    pub vertices: usize,
    /// Distinct DAG edges.
    pub edges: usize,
    /// Current DAG vertex capacity.
    pub capacity: usize,
    /// DAG edge density.
    pub density: f64,
    /// Log lines skipped during the last replay.
    pub log_lines_skipped: usize,
    /// The local vector clock.
    pub local_clock: VectorClock,
    /// Path of the event log.
    pub log_path: PathBuf,
}

impl fmt::Display for LedgerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "events={} ingested={} cycle_checks={} cycles_prevented={} \
             vertices={} edges={} capacity={} density={:.3} log_skipped={} clock={}",
            self.events,
            self.ingested,
            self.cycle_checks,
            self.cycles_prevented,
            self.vertices,
            self.edges,
            self.capacity,
            self.density,
            self.log_lines_skipped,
            self.local_clock,
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    ingested: u64,
    cycle_checks: u64,
    cycles_prevented: u64,
}

// ---------------------------------------------------------------------------
// CausalLedger
// ---------------------------------------------------------------------------

/// A single-node causal event ledger.
pub struct CausalLedger {
    inner: RwLock<LedgerInner>,
    data_dir: PathBuf,
    _dir_lock: LedgerLock,
}

struct LedgerInner {
    dag: CausalDag,
    indexes: IndexSet,
    vcm: VectorClockManager,
    store: EventStore,
    log: EventLog,
    projector: StateProjector,
    counters: Counters,
    log_lines_skipped: usize,
}

impl CausalLedger {
    /// Open a ledger: create the data directory, take the directory lock,
    /// open the store, and load state warm (from index snapshots) or cold
    /// (from the log).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the directory, lock, store,
    /// or log cannot be brought up.
    pub fn open(config: LedgerConfig) -> Result<Self, LedgerError> {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)?;
        let dir_lock = LedgerLock::acquire(&data_dir.join(LOCK_FILE_NAME), LOCK_TIMEOUT)?;
        let store = EventStore::open(&data_dir.join(STORE_DIR_NAME))?;

        let mut inner = LedgerInner {
            dag: CausalDag::with_capacity(config.initial_graph_capacity),
            indexes: IndexSet::new(),
            vcm: VectorClockManager::new(config.node_id),
            store,
            log: EventLog::new(config.log_path, config.fsync),
            projector: StateProjector::with_defaults(),
            counters: Counters::default(),
            log_lines_skipped: 0,
        };

        match inner.try_warm_load(&data_dir) {
            Ok(true) => {
                info!(
                    events = inner.indexes.event_count(),
                    edges = inner.dag.total_edges(),
                    "warm start: index snapshot restored"
                );
            }
            Ok(false) => {
                inner.cold_rebuild()?;
                info!(
                    events = inner.indexes.event_count(),
                    edges = inner.dag.total_edges(),
                    "cold start: state rebuilt from event log"
                );
            }
            Err(err) => {
                warn!(%err, "warm start failed; rebuilding from event log");
                inner.cold_rebuild()?;
            }
        }

        Ok(Self {
            inner: RwLock::new(inner),
            data_dir,
            _dir_lock: dir_lock,
        })
    }

    /// The directory holding the log, store, and index snapshots.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // -- ingestion ---------------------------------------------------------

    /// Commit a new event and return its id.
    ///
    /// When `explicit_parents` is empty the parent set defaults to the
    /// latest event on `trace_id` (if any), chaining each trace causally by
    /// default. Duplicate parent ids are dropped, preserving first
    /// occurrence order.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidArgument`] if a required string is blank.
    /// - [`LedgerError::UnknownParent`] if a parent id is uncommitted.
    /// - [`LedgerError::CausalLoop`] if the additions would close a cycle.
    /// - [`LedgerError::Persistence`] if the log append or store write
    ///   fails.
    ///
    /// The first three leave the ledger unchanged. After a failed store
    /// write the log already holds the event, so a restart will recover it.
    #[allow(clippy::too_many_arguments)]
    pub fn ingest_event(
        &self,
        trace_id: &str,
        service_name: &str,
        service_version: &str,
        hostname: &str,
        event_type: &str,
        payload: Payload,
        explicit_parents: &[String],
    ) -> Result<String, LedgerError> {
        require_non_empty("traceId", trace_id)?;
        require_non_empty("serviceName", service_name)?;
        require_non_empty("serviceVersion", service_version)?;
        require_non_empty("hostname", hostname)?;
        require_non_empty("eventType", event_type)?;

        let mut guard = self.write_lock();
        let inner = &mut *guard;

        // Resolve the final parent set: explicit ids, else the trace head.
        let mut parent_ids: Vec<String> = Vec::new();
        if explicit_parents.is_empty() {
            if let Some(head) = inner.indexes.trace_head(trace_id) {
                parent_ids.push(head.to_string());
            }
        } else {
            for id in explicit_parents {
                if id.trim().is_empty() {
                    return Err(LedgerError::InvalidArgument(
                        "parent event ids cannot be empty".into(),
                    ));
                }
                if !parent_ids.iter().any(|p| p == id) {
                    parent_ids.push(id.clone());
                }
            }
        }

        // Every parent must already be committed.
        let mut parent_vertices = Vec::with_capacity(parent_ids.len());
        let mut parent_records = Vec::with_capacity(parent_ids.len());
        for id in &parent_ids {
            let Some(vertex) = inner.indexes.vertex_of(id) else {
                return Err(LedgerError::UnknownParent(id.clone()));
            };
            parent_vertices.push(vertex);
            match inner.store.get(id)? {
                Some(record) => parent_records.push(record),
                None => return Err(LedgerError::UnknownParent(id.clone())),
            }
        }

        // Probe the DAG with the edges this event would add, using the
        // vertex id it will get. Nothing is committed yet.
        inner.counters.cycle_checks += 1;
        let proposed = inner.dag.len();
        let overlay: HashMap<usize, Vec<usize>> =
            HashMap::from([(proposed, parent_vertices.clone())]);
        if inner.dag.has_cycle_with_proposed(proposed, &overlay) {
            inner.counters.cycles_prevented += 1;
            return Err(LedgerError::CausalLoop {
                event_type: event_type.to_string(),
                trace_id: trace_id.to_string(),
                parents: parent_ids,
            });
        }

        let record = inner.vcm.stamp_event(
            trace_id,
            service_name,
            service_version,
            hostname,
            event_type,
            payload,
            &parent_records,
        );

        // Log first, store second: the log stays authoritative across a
        // crash between the two.
        inner.log.append(&record)?;
        inner.store.put(&record)?;

        let vertex = inner.dag.add_vertex();
        debug_assert_eq!(vertex, proposed);
        for &cause in &parent_vertices {
            inner.dag.add_edge(vertex, cause)?;
            inner.indexes.record_edge(cause, vertex);
        }
        inner.indexes.record_event(vertex, &record);
        inner.counters.ingested += 1;

        debug!(
            event_id = %record.event_id,
            trace_id,
            parents = parent_ids.len(),
            "event ingested"
        );
        Ok(record.event_id)
    }

    // -- lookups -----------------------------------------------------------

    /// The committed record for `event_id`, absent if unknown.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] on store failure.
    pub fn event(&self, event_id: &str) -> Result<Option<EventRecord>, LedgerError> {
        let inner = self.read_lock();
        Ok(inner.store.get(event_id)?)
    }

    /// `true` iff `event_id` is committed.
    #[must_use]
    pub fn contains_event(&self, event_id: &str) -> bool {
        self.read_lock().indexes.contains_event(event_id)
    }

    /// Records on `trace_id`, in ingestion order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] on store failure.
    pub fn events_by_trace(&self, trace_id: &str) -> Result<Vec<EventRecord>, LedgerError> {
        let inner = self.read_lock();
        let ids: Vec<String> = inner.indexes.events_for_trace(trace_id).to_vec();
        inner.records_for(&ids)
    }

    /// Records of `event_type`, in ingestion order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] on store failure.
    pub fn events_by_type(&self, event_type: &str) -> Result<Vec<EventRecord>, LedgerError> {
        let inner = self.read_lock();
        let ids: Vec<String> = inner.indexes.events_for_type(event_type).to_vec();
        inner.records_for(&ids)
    }

    /// Records emitted by `service_name`, in ingestion order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] on store failure.
    pub fn events_by_service(&self, service_name: &str) -> Result<Vec<EventRecord>, LedgerError> {
        let inner = self.read_lock();
        let ids: Vec<String> = inner.indexes.events_for_service(service_name).to_vec();
        inner.records_for(&ids)
    }

    // -- graph queries -----------------------------------------------------

    /// Every event reachable from `event_id` in the effect→cause direction,
    /// including the event itself. Unknown ids yield an empty sequence.
    #[must_use]
    pub fn ancestry(&self, event_id: &str) -> Vec<String> {
        let inner = self.read_lock();
        let Some(start) = inner.indexes.vertex_of(event_id) else {
            return Vec::new();
        };
        inner.ids_for_vertices(inner.dag.reachable_from(start))
    }

    /// Every event reachable from `event_id` through the cause→effect
    /// mirror, including the event itself. Unknown ids yield an empty
    /// sequence.
    #[must_use]
    pub fn descendants(&self, event_id: &str) -> Vec<String> {
        let inner = self.read_lock();
        let Some(start) = inner.indexes.vertex_of(event_id) else {
            return Vec::new();
        };

        let mut reachable = HashSet::new();
        let mut stack = vec![start];
        reachable.insert(start);
        while let Some(current) = stack.pop() {
            for &child in inner.indexes.children_of(current) {
                if reachable.insert(child) {
                    stack.push(child);
                }
            }
        }

        inner.ids_for_vertices(reachable)
    }

    /// All committed event ids in cause-before-effect order.
    #[must_use]
    pub fn topological_order(&self) -> Vec<String> {
        self.read_lock().topo_event_ids()
    }

    /// The shortest path from `start_id` to `end_id` through the
    /// cause→effect graph, inclusive of both endpoints. Empty when either id
    /// is unknown or no path exists; a single element when the ids match.
    #[must_use]
    pub fn shortest_causal_path(&self, start_id: &str, end_id: &str) -> Vec<String> {
        let inner = self.read_lock();
        let (Some(start), Some(end)) = (
            inner.indexes.vertex_of(start_id),
            inner.indexes.vertex_of(end_id),
        ) else {
            return Vec::new();
        };

        shortest_path(inner.indexes.children_map(), inner.dag.len(), start, end)
            .iter()
            .filter_map(|&v| inner.indexes.event_of(v))
            .map(str::to_string)
            .collect()
    }

    /// The intersection of the two events' ancestor sets (each set includes
    /// the event itself). Empty when either id is unknown.
    #[must_use]
    pub fn common_ancestors(&self, event_id1: &str, event_id2: &str) -> Vec<String> {
        let inner = self.read_lock();
        let Some(common) = inner.common_ancestor_vertices(event_id1, event_id2) else {
            return Vec::new();
        };
        inner.ids_for_vertices(common)
    }

    /// The common ancestors `A` such that no *other* common ancestor has `A`
    /// in its own ancestor set. A sole common ancestor is trivially nearest.
    #[must_use]
    pub fn nearest_common_ancestors(&self, event_id1: &str, event_id2: &str) -> Vec<String> {
        let inner = self.read_lock();
        let Some(common) = inner.common_ancestor_vertices(event_id1, event_id2) else {
            return Vec::new();
        };
        if common.len() <= 1 {
            return inner.ids_for_vertices(common);
        }

        let ancestors_of: HashMap<usize, HashSet<usize>> = common
            .iter()
            .map(|&v| (v, inner.dag.reachable_from(v)))
            .collect();

        let nearest: HashSet<usize> = common
            .iter()
            .copied()
            .filter(|&candidate| {
                common
                    .iter()
                    .filter(|&&other| other != candidate)
                    .all(|other| !ancestors_of[other].contains(&candidate))
            })
            .collect();

        inner.ids_for_vertices(nearest)
    }

    /// The vector-clock relationship between two committed events.
    /// [`Causality::Undefined`] when either record is missing or carries an
    /// empty clock.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] on store failure.
    pub fn compare_causality(
        &self,
        event_id1: &str,
        event_id2: &str,
    ) -> Result<Causality, LedgerError> {
        let inner = self.read_lock();
        let (Some(a), Some(b)) = (inner.store.get(event_id1)?, inner.store.get(event_id2)?)
        else {
            return Ok(Causality::Undefined);
        };
        if a.vector_clock.is_empty() || b.vector_clock.is_empty() {
            return Ok(Causality::Undefined);
        }
        Ok(a.vector_clock.compare(&b.vector_clock))
    }

    // -- state projection --------------------------------------------------

    /// Project `entity`'s current state by folding its events in causal
    /// order. Unknown entities project to the empty state.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] on store failure.
    pub fn current_state(&self, entity: &str) -> Result<ProjectedState, LedgerError> {
        let inner = self.read_lock();
        let order = inner.topo_event_ids();
        inner.project_entity(&order, entity)
    }

    /// Project `entity`'s state as of `up_to_event_id`: the causal stream is
    /// truncated just after that event's first occurrence. An id absent from
    /// the stream projects to the empty state.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] on store failure.
    pub fn state_up_to(
        &self,
        entity: &str,
        up_to_event_id: &str,
    ) -> Result<ProjectedState, LedgerError> {
        let inner = self.read_lock();
        let order = inner.topo_event_ids();
        let Some(stop) = order.iter().position(|id| id == up_to_event_id) else {
            return Ok(ProjectedState::new());
        };
        inner.project_entity(&order[..=stop], entity)
    }

    /// Register (or replace) a projection reducer for `event_type`.
    pub fn register_reducer(&self, event_type: impl Into<String>, reducer: Reducer) {
        self.write_lock().projector.register(event_type, reducer);
    }

    // -- low-level accessors (graph DTO enumeration) -----------------------

    /// The DAG vertex allocated for `event_id`.
    #[must_use]
    pub fn graph_id_for_event(&self, event_id: &str) -> Option<usize> {
        self.read_lock().indexes.vertex_of(event_id)
    }

    /// The event id committed at `vertex`.
    #[must_use]
    pub fn event_for_graph_id(&self, vertex: usize) -> Option<String> {
        self.read_lock()
            .indexes
            .event_of(vertex)
            .map(str::to_string)
    }

    /// Direct effects of `vertex` in the cause→effect mirror.
    #[must_use]
    pub fn children_graph_ids(&self, vertex: usize) -> Vec<usize> {
        self.read_lock().indexes.children_of(vertex).to_vec()
    }

    // -- lifecycle ---------------------------------------------------------

    /// A snapshot of the ledger's counters and gauges.
    #[must_use]
    pub fn stats(&self) -> LedgerStats {
        let inner = self.read_lock();
        LedgerStats {
            events: inner.indexes.event_count(),
            ingested: inner.counters.ingested,
            cycle_checks: inner.counters.cycle_checks,
            cycles_prevented: inner.counters.cycles_prevented,
            vertices: inner.dag.len(),
            edges: inner.dag.total_edges(),
            capacity: inner.dag.capacity(),
            density: inner.dag.density(),
            log_lines_skipped: inner.log_lines_skipped,
            local_clock: inner.vcm.current_clock(),
            log_path: inner.log.path().to_path_buf(),
        }
    }

    /// Write the index snapshot atomically under the writer lock.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if any snapshot file fails.
    pub fn flush(&self) -> Result<(), LedgerError> {
        let inner = self.write_lock();
        persistence::save_all(&inner.indexes, &self.data_dir)?;
        info!(events = inner.indexes.event_count(), "index snapshot flushed");
        Ok(())
    }

    /// Flush indexes and shut the ledger down.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the final snapshot fails; the
    /// next startup will take the cold path in that case.
    pub fn close(self) -> Result<(), LedgerError> {
        self.flush()
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, LedgerInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, LedgerInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CausalLedger {
    fn drop(&mut self) {
        let inner = self.write_lock();
        if let Err(err) = persistence::save_all(&inner.indexes, &self.data_dir) {
            warn!(%err, "failed to flush index snapshot on shutdown");
        }
    }
}

impl fmt::Debug for CausalLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CausalLedger")
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// LedgerInner
// ---------------------------------------------------------------------------

impl LedgerInner {
    /// Attempt the warm path: load all index snapshots, size the DAG, and
    /// stream the log once to reconstruct edges (vertices already exist via
    /// the restored mapping). Returns `Ok(false)` when any snapshot is
    /// missing or corrupt, and an error when the snapshot disagrees with the
    /// log (the caller then rebuilds cold).
    fn try_warm_load(&mut self, data_dir: &Path) -> Result<bool, LedgerError> {
        let Some(indexes) = persistence::load_all(data_dir) else {
            return Ok(false);
        };

        self.indexes = indexes;
        self.dag.ensure_vertices(self.indexes.event_count());
        self.store.probe()?;

        let replay = self.log.replay()?;
        self.log_lines_skipped = replay.skipped;

        for record in &replay.events {
            let Some(effect) = self.indexes.vertex_of(&record.event_id) else {
                return Err(LedgerError::persistence(anyhow!(
                    "event '{}' is in the log but not in the index snapshot",
                    record.event_id
                )));
            };
            for parent_id in &record.causal_parent_event_ids {
                let Some(cause) = self.indexes.vertex_of(parent_id) else {
                    return Err(LedgerError::persistence(anyhow!(
                        "parent '{}' of event '{}' is missing from the index snapshot",
                        parent_id,
                        record.event_id
                    )));
                };
                self.dag.add_edge(effect, cause)?;
            }
            self.vcm.observe(record);
        }

        Ok(true)
    }

    /// The cold path: clear everything and rebuild from the log in two
    /// passes — vertices and per-event indexes first, then edges.
    fn cold_rebuild(&mut self) -> Result<(), LedgerError> {
        self.reset();

        let replay = self.log.replay()?;
        self.log_lines_skipped = replay.skipped;

        for record in &replay.events {
            let vertex = self.dag.add_vertex();
            self.indexes.record_event(vertex, record);
            self.store.put(record)?;
            self.vcm.observe(record);
        }

        for record in &replay.events {
            let Some(effect) = self.indexes.vertex_of(&record.event_id) else {
                continue;
            };
            for parent_id in &record.causal_parent_event_ids {
                match self.indexes.vertex_of(parent_id) {
                    Some(cause) => {
                        self.dag.add_edge(effect, cause)?;
                        self.indexes.record_edge(cause, effect);
                    }
                    None => warn!(
                        event_id = %record.event_id,
                        parent = %parent_id,
                        "parent missing during rebuild; edge dropped"
                    ),
                }
            }
        }

        debug!(
            events = replay.events.len(),
            skipped = replay.skipped,
            "event log replayed"
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.dag.clear();
        self.indexes.clear();
        self.vcm = VectorClockManager::new(self.vcm.local_node_id().to_string());
        self.counters = Counters::default();
        self.log_lines_skipped = 0;
    }

    /// Committed event ids in cause-before-effect order. The DAG sort lists
    /// effects first (edges run effect→cause), so the order is reversed.
    fn topo_event_ids(&self) -> Vec<String> {
        let mut order = match self.dag.topological_sort() {
            Ok(order) => order,
            Err(err) => {
                warn!(%err, "topological sort failed");
                return Vec::new();
            }
        };
        order.reverse();
        order
            .iter()
            .filter_map(|&v| self.indexes.event_of(v))
            .map(str::to_string)
            .collect()
    }

    /// Map a vertex set to event ids, ordered by vertex id for determinism.
    fn ids_for_vertices(&self, vertices: impl IntoIterator<Item = usize>) -> Vec<String> {
        let mut sorted: Vec<usize> = vertices.into_iter().collect();
        sorted.sort_unstable();
        sorted
            .iter()
            .filter_map(|&v| self.indexes.event_of(v))
            .map(str::to_string)
            .collect()
    }

    /// Ancestor-set intersection as vertices; `None` when either id is
    /// unknown.
    fn common_ancestor_vertices(
        &self,
        event_id1: &str,
        event_id2: &str,
    ) -> Option<HashSet<usize>> {
        let v1 = self.indexes.vertex_of(event_id1)?;
        let v2 = self.indexes.vertex_of(event_id2)?;
        let ancestors1 = self.dag.reachable_from(v1);
        let ancestors2 = self.dag.reachable_from(v2);
        Some(ancestors1.intersection(&ancestors2).copied().collect())
    }

    fn records_for(&self, ids: &[String]) -> Result<Vec<EventRecord>, LedgerError> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.get(id)? {
                Some(record) => records.push(record),
                None => warn!(event_id = %id, "event listed in index but missing from store"),
            }
        }
        Ok(records)
    }

    fn project_entity(
        &self,
        order: &[String],
        entity: &str,
    ) -> Result<ProjectedState, LedgerError> {
        let mut state = ProjectedState::new();
        for id in order {
            let Some(record) = self.store.get(id)? else {
                warn!(event_id = %id, "event in causal order missing from store");
                continue;
            };
            if record.service_name != entity {
                continue;
            }
            state = self.projector.apply(state, &record);
        }
        Ok(state)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        return Err(LedgerError::InvalidArgument(format!(
            "'{field}' cannot be empty"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
