//! Integer-vertex adjacency store with cycle detection and topological sort.
//!
//! A vertex is an integer in `[0, len)`. Vertex `v`'s adjacency row holds its
//! out-neighbors in the effect→cause direction, in insertion order. Capacity
//! doubles on demand; growing past the initial capacity preserves all
//! existing edges.
//!
//! The graph is expected to be acyclic in steady state — ingestion probes
//! every proposed parent set with [`CausalDag::has_cycle_with_proposed`]
//! before committing, using an overlay of uncommitted edges instead of
//! copying the graph.

use std::collections::{HashMap, HashSet};

/// Errors from DAG mutation and sorting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DagError {
    /// An edge endpoint does not name an allocated vertex.
    #[error("vertex {vertex} out of bounds [0, {len})")]
    VertexOutOfBounds {
        /// The offending vertex id.
        vertex: usize,
        /// Number of allocated vertices.
        len: usize,
    },

    /// The graph contains a cycle, so no topological order exists.
    #[error("graph contains a cycle; topological sort is undefined")]
    CycleDetected,
}

/// DFS traversal frame: visit a vertex, or finish it after its neighbors.
enum Frame {
    Enter(usize),
    Exit(usize),
}

/// Append-only DAG over integer vertices; edges are effect→cause.
#[derive(Debug, Clone)]
pub struct CausalDag {
    adj: Vec<Vec<usize>>,
    total_edges: usize,
}

impl CausalDag {
    /// Create an empty DAG with room for `initial` vertices (minimum 16).
    #[must_use]
    pub fn with_capacity(initial: usize) -> Self {
        Self {
            adj: Vec::with_capacity(initial.max(16)),
            total_edges: 0,
        }
    }

    /// Number of allocated vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adj.len()
    }

    /// `true` when no vertex has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    /// Current vertex capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.adj.capacity()
    }

    /// Total number of distinct edges.
    #[must_use]
    pub fn total_edges(&self) -> usize {
        self.total_edges
    }

    /// Edge density: `edges / (v * (v - 1))` for `v > 1`.
    #[must_use]
    pub fn density(&self) -> f64 {
        let v = self.adj.len();
        if v > 1 {
            self.total_edges as f64 / (v as f64 * (v as f64 - 1.0))
        } else if v == 1 && self.total_edges > 0 {
            self.total_edges as f64
        } else {
            0.0
        }
    }

    /// Allocate the next vertex, doubling capacity when full.
    pub fn add_vertex(&mut self) -> usize {
        if self.adj.len() == self.adj.capacity() {
            self.adj.reserve(self.adj.capacity().max(16));
        }
        self.adj.push(Vec::new());
        self.adj.len() - 1
    }

    /// Allocate vertices until `count` exist. Used by the warm-start path,
    /// where the vertex↔event mapping is restored before any edges.
    pub fn ensure_vertices(&mut self, count: usize) {
        while self.adj.len() < count {
            self.add_vertex();
        }
    }

    /// Add the edge `effect → cause`. Idempotent: a duplicate edge is a
    /// no-op and does not bump the edge counter.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::VertexOutOfBounds`] if either endpoint is not an
    /// allocated vertex.
    pub fn add_edge(&mut self, effect: usize, cause: usize) -> Result<(), DagError> {
        self.check_vertex(effect)?;
        self.check_vertex(cause)?;

        if !self.adj[effect].contains(&cause) {
            self.adj[effect].push(cause);
            self.total_edges += 1;
        }
        Ok(())
    }

    /// Out-neighbors of `v` (its causes), in insertion order.
    #[must_use]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        self.adj.get(v).map_or(&[], Vec::as_slice)
    }

    /// `true` if any back edge exists in the committed graph.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        let n = self.adj.len();
        let mut visited = vec![false; n];
        let mut on_stack = vec![false; n];

        (0..n).any(|start| {
            !visited[start] && self.cycle_from(start, &mut visited, &mut on_stack, None)
        })
    }

    /// Cycle check over the committed adjacency plus an overlay of
    /// uncommitted edges keyed by origin vertex.
    ///
    /// `proposed_vertex` is the id the next vertex *would* get; it may (and
    /// usually does) lie one past the allocated range. Marker arrays are
    /// sized to the maximum vertex id spanned by the graph and the overlay.
    /// Detects both cycles that close through the proposed vertex and cycles
    /// arising purely from the overlay elsewhere in the graph. Allocates no
    /// second graph.
    #[must_use]
    pub fn has_cycle_with_proposed(
        &self,
        proposed_vertex: usize,
        overlay: &HashMap<usize, Vec<usize>>,
    ) -> bool {
        if overlay.is_empty() {
            return self.has_cycle();
        }

        let mut max_id = proposed_vertex.max(self.adj.len().saturating_sub(1));
        for (&origin, targets) in overlay {
            max_id = max_id.max(origin);
            for &target in targets {
                max_id = max_id.max(target);
            }
        }

        let n = max_id + 1;
        let mut visited = vec![false; n];
        let mut on_stack = vec![false; n];

        if self.cycle_from(proposed_vertex, &mut visited, &mut on_stack, Some(overlay)) {
            return true;
        }

        (0..self.adj.len()).any(|start| {
            !visited[start] && self.cycle_from(start, &mut visited, &mut on_stack, Some(overlay))
        })
    }

    /// Iterative DFS from `start` looking for a back edge. Neighbors come
    /// from the committed adjacency (when `v` is allocated) and the overlay.
    fn cycle_from(
        &self,
        start: usize,
        visited: &mut [bool],
        on_stack: &mut [bool],
        overlay: Option<&HashMap<usize, Vec<usize>>>,
    ) -> bool {
        let mut stack = vec![Frame::Enter(start)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(v) => {
                    if on_stack[v] {
                        return true;
                    }
                    if visited[v] {
                        continue;
                    }
                    visited[v] = true;
                    on_stack[v] = true;
                    stack.push(Frame::Exit(v));

                    if let Some(row) = self.adj.get(v) {
                        for &n in row.iter().rev() {
                            stack.push(Frame::Enter(n));
                        }
                    }
                    if let Some(targets) = overlay.and_then(|o| o.get(&v)) {
                        for &n in targets.iter().rev() {
                            stack.push(Frame::Enter(n));
                        }
                    }
                }
                Frame::Exit(v) => on_stack[v] = false,
            }
        }

        false
    }

    /// DFS-postorder-reversed linearization: every effect appears before its
    /// causes. The ledger reverses this to obtain cause-before-effect order.
    /// Stable for a given edge-insertion history.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::CycleDetected`] if the graph has a cycle.
    pub fn topological_sort(&self) -> Result<Vec<usize>, DagError> {
        if self.has_cycle() {
            return Err(DagError::CycleDetected);
        }

        let n = self.adj.len();
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);

        for start in 0..n {
            if visited[start] {
                continue;
            }
            let mut stack = vec![Frame::Enter(start)];
            while let Some(frame) = stack.pop() {
                match frame {
                    Frame::Enter(v) => {
                        if visited[v] {
                            continue;
                        }
                        visited[v] = true;
                        stack.push(Frame::Exit(v));
                        for &neighbor in self.adj[v].iter().rev() {
                            if !visited[neighbor] {
                                stack.push(Frame::Enter(neighbor));
                            }
                        }
                    }
                    Frame::Exit(v) => order.push(v),
                }
            }
        }

        order.reverse();
        Ok(order)
    }

    /// Every vertex reachable from `start` along effect→cause edges,
    /// including `start` itself. An out-of-range start yields the empty set.
    #[must_use]
    pub fn reachable_from(&self, start: usize) -> HashSet<usize> {
        let mut reachable = HashSet::new();
        if start >= self.adj.len() {
            return reachable;
        }

        let mut stack = vec![start];
        reachable.insert(start);

        while let Some(current) = stack.pop() {
            for &neighbor in &self.adj[current] {
                if reachable.insert(neighbor) {
                    stack.push(neighbor);
                }
            }
        }

        reachable
    }

    /// Drop all vertices and edges, keeping the allocation.
    pub fn clear(&mut self) {
        self.adj.clear();
        self.total_edges = 0;
    }

    fn check_vertex(&self, v: usize) -> Result<(), DagError> {
        if v >= self.adj.len() {
            return Err(DagError::VertexOutOfBounds {
                vertex: v,
                len: self.adj.len(),
            });
        }
        Ok(())
    }
}

impl Default for CausalDag {
    fn default() -> Self {
        Self::with_capacity(16)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
