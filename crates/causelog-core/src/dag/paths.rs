//! Shortest causal path over the cause→effect mirror adjacency.
//!
//! The DAG's native edges run effect→cause, so path queries from a cause to
//! one of its effects walk the children mirror maintained by the index set.
//! Standard BFS with a predecessor map; the reconstructed path is inclusive
//! of both endpoints.

use std::collections::{HashMap, VecDeque};

/// Shortest path from `start` to `end` through `children`, as a vertex
/// sequence inclusive of both endpoints.
///
/// Returns `[start]` when `start == end`, and an empty vector when either
/// endpoint is out of `[0, vertex_count)` or no path exists.
#[must_use]
pub fn shortest_path(
    children: &HashMap<usize, Vec<usize>>,
    vertex_count: usize,
    start: usize,
    end: usize,
) -> Vec<usize> {
    if start >= vertex_count || end >= vertex_count {
        return Vec::new();
    }
    if start == end {
        return vec![start];
    }

    let mut visited = vec![false; vertex_count];
    let mut prev: HashMap<usize, usize> = HashMap::new();
    let mut queue = VecDeque::new();

    visited[start] = true;
    queue.push_back(start);

    while let Some(u) = queue.pop_front() {
        let Some(neighbors) = children.get(&u) else {
            continue;
        };
        for &v in neighbors {
            if v >= vertex_count || visited[v] {
                continue;
            }
            visited[v] = true;
            prev.insert(v, u);

            if v == end {
                return reconstruct(&prev, start, end);
            }
            queue.push_back(v);
        }
    }

    Vec::new()
}

/// Walk the predecessor map back from `end` to `start`.
fn reconstruct(prev: &HashMap<usize, usize>, start: usize, end: usize) -> Vec<usize> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        match prev.get(&current) {
            Some(&p) => {
                path.push(p);
                current = p;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
