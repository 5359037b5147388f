//! The causal DAG and its graph algorithms.
//!
//! Vertices are dense integers allocated in ingestion order; edges point
//! effect→cause (from a new event to each of its parents). Ancestry and
//! topological sorting walk this native direction; descendant queries and
//! shortest paths use the cause→effect mirror maintained by the index set.

pub mod graph;
pub mod paths;

pub use graph::{CausalDag, DagError};
pub use paths::shortest_path;
