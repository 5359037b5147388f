//! Index snapshot persistence: the warm-start path.
//!
//! Each index mapping is serialized to its own JSON file inside the data
//! directory, written atomically (write to `<name>.tmp`, then rename). The
//! snapshots are derived state — the event log remains the system of record —
//! so loading is strictly all-or-nothing: if any file is missing, unreadable,
//! or inconsistent, the caller falls back to a cold rebuild from the log.

use super::IndexSet;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// `service_name → event ids` snapshot file.
pub const ENTITY_INDEX_FILE: &str = "entity_to_event_ids.idx";
/// `cause vertex → effect vertices` mirror snapshot file.
pub const CHILDREN_INDEX_FILE: &str = "children_adjacency.idx";
/// `event id → vertex` snapshot file.
pub const EVENT_TO_GRAPH_FILE: &str = "event_to_graph_id.idx";
/// `vertex → event id` snapshot file.
pub const GRAPH_TO_EVENT_FILE: &str = "graph_to_event_id.idx";
/// `event type → event ids` snapshot file.
pub const EVENT_TYPE_INDEX_FILE: &str = "event_type_to_event_ids.idx";
/// `trace id → event ids` snapshot file.
pub const TRACE_INDEX_FILE: &str = "trace_id_to_event_ids.idx";

/// Every snapshot file, in write order.
pub const INDEX_FILES: [&str; 6] = [
    ENTITY_INDEX_FILE,
    CHILDREN_INDEX_FILE,
    EVENT_TO_GRAPH_FILE,
    GRAPH_TO_EVENT_FILE,
    EVENT_TYPE_INDEX_FILE,
    TRACE_INDEX_FILE,
];

/// Errors from writing index snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Writing or renaming a snapshot file failed.
    #[error("index snapshot I/O failed for {file}: {source}")]
    Io {
        /// Snapshot file name.
        file: &'static str,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Encoding a mapping to JSON failed.
    #[error("failed to encode index {file}: {source}")]
    Encode {
        /// Snapshot file name.
        file: &'static str,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },
}

/// Write all six index files atomically into `data_dir`.
///
/// # Errors
///
/// Returns [`SnapshotError`] on the first file that fails; files already
/// renamed stay in place (a partial set is rejected wholesale on load).
pub fn save_all(indexes: &IndexSet, data_dir: &Path) -> Result<(), SnapshotError> {
    write_index(data_dir, ENTITY_INDEX_FILE, &indexes.by_service)?;
    write_index(data_dir, CHILDREN_INDEX_FILE, &indexes.children)?;
    write_index(data_dir, EVENT_TO_GRAPH_FILE, &indexes.event_to_vertex)?;
    write_index(data_dir, GRAPH_TO_EVENT_FILE, &indexes.vertex_to_event)?;
    write_index(data_dir, EVENT_TYPE_INDEX_FILE, &indexes.by_type)?;
    write_index(data_dir, TRACE_INDEX_FILE, &indexes.by_trace)?;
    debug!(dir = %data_dir.display(), "index snapshot written");
    Ok(())
}

/// Load all six index files from `data_dir`.
///
/// Returns `None` when no snapshot exists at all, or — after a warning —
/// when any single file is missing, fails to parse, or the event↔vertex
/// mappings are not a bijection. The caller then rebuilds from the log.
#[must_use]
pub fn load_all(data_dir: &Path) -> Option<IndexSet> {
    if INDEX_FILES.iter().all(|file| !data_dir.join(file).exists()) {
        debug!(dir = %data_dir.display(), "no index snapshot present");
        return None;
    }

    let by_service = read_index(data_dir, ENTITY_INDEX_FILE)?;
    let children = read_index(data_dir, CHILDREN_INDEX_FILE)?;
    let event_to_vertex: std::collections::HashMap<String, usize> =
        read_index(data_dir, EVENT_TO_GRAPH_FILE)?;
    let vertex_to_event: std::collections::HashMap<usize, String> =
        read_index(data_dir, GRAPH_TO_EVENT_FILE)?;
    let by_type = read_index(data_dir, EVENT_TYPE_INDEX_FILE)?;
    let by_trace = read_index(data_dir, TRACE_INDEX_FILE)?;

    if event_to_vertex.len() != vertex_to_event.len() {
        warn!(
            events = event_to_vertex.len(),
            vertices = vertex_to_event.len(),
            "event/vertex snapshots disagree; falling back to cold rebuild"
        );
        return None;
    }
    for (event_id, vertex) in &event_to_vertex {
        if vertex_to_event.get(vertex).map(String::as_str) != Some(event_id.as_str()) {
            warn!(
                event_id,
                vertex, "event/vertex snapshots are not a bijection; falling back to cold rebuild"
            );
            return None;
        }
    }

    Some(IndexSet::from_parts(
        event_to_vertex,
        vertex_to_event,
        children,
        by_service,
        by_type,
        by_trace,
    ))
}

/// Remove every index snapshot file. Missing files are ignored.
pub fn delete_all(data_dir: &Path) {
    for file in INDEX_FILES {
        let _ = fs::remove_file(data_dir.join(file));
    }
}

fn write_index<T: Serialize>(
    dir: &Path,
    file: &'static str,
    value: &T,
) -> Result<(), SnapshotError> {
    let body = serde_json::to_vec(value).map_err(|source| SnapshotError::Encode { file, source })?;

    let target = dir.join(file);
    let tmp = dir.join(format!("{file}.tmp"));
    fs::write(&tmp, &body).map_err(|source| SnapshotError::Io { file, source })?;
    fs::rename(&tmp, &target).map_err(|source| SnapshotError::Io { file, source })?;
    Ok(())
}

fn read_index<T: DeserializeOwned>(dir: &Path, file: &'static str) -> Option<T> {
    let path = dir.join(file);
    let body = match fs::read(&path) {
        Ok(body) => body,
        Err(err) => {
            warn!(file, %err, "index snapshot unreadable; falling back to cold rebuild");
            return None;
        }
    };
    match serde_json::from_slice(&body) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(file, %err, "index snapshot corrupt; falling back to cold rebuild");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::sample_record;
    use crate::event::EventRecord;
    use tempfile::TempDir;

    fn record(id: &str, trace: &str, service: &str, event_type: &str) -> EventRecord {
        let mut r = sample_record();
        r.event_id = id.into();
        r.trace_id = trace.into();
        r.service_name = service.into();
        r.event_type = event_type.into();
        r
    }

    fn populated() -> IndexSet {
        let mut idx = IndexSet::new();
        idx.record_event(0, &record("e0", "t1", "USERS", "USER_CREATED"));
        idx.record_event(1, &record("e1", "t1", "USERS", "USER_RENAMED"));
        idx.record_event(2, &record("e2", "t2", "ORDERS", "ORDER_CREATED"));
        idx.record_edge(0, 1);
        idx
    }

    #[test]
    fn save_writes_all_six_files() {
        let dir = TempDir::new().expect("tempdir");
        save_all(&populated(), dir.path()).expect("save");

        for file in INDEX_FILES {
            assert!(dir.path().join(file).exists(), "missing {file}");
            assert!(
                !dir.path().join(format!("{file}.tmp")).exists(),
                "leftover temp for {file}"
            );
        }
    }

    #[test]
    fn save_then_load_round_trips_every_mapping() {
        let dir = TempDir::new().expect("tempdir");
        let idx = populated();
        save_all(&idx, dir.path()).expect("save");

        let loaded = load_all(dir.path()).expect("warm load");
        assert_eq!(loaded.event_count(), 3);
        assert_eq!(loaded.vertex_of("e0"), Some(0));
        assert_eq!(loaded.vertex_of("e2"), Some(2));
        assert_eq!(loaded.event_of(1), Some("e1"));
        assert_eq!(loaded.children_of(0), &[1]);
        assert_eq!(loaded.events_for_service("USERS"), &["e0", "e1"]);
        assert_eq!(loaded.events_for_type("ORDER_CREATED"), &["e2"]);
        assert_eq!(loaded.events_for_trace("t1"), &["e0", "e1"]);
        assert_eq!(loaded.trace_head("t1"), Some("e1"));
        assert_eq!(loaded.trace_head("t2"), Some("e2"));
    }

    #[test]
    fn any_missing_file_forces_cold_path() {
        let dir = TempDir::new().expect("tempdir");
        save_all(&populated(), dir.path()).expect("save");

        std::fs::remove_file(dir.path().join(TRACE_INDEX_FILE)).expect("delete one");
        assert!(load_all(dir.path()).is_none());
    }

    #[test]
    fn any_corrupt_file_forces_cold_path() {
        let dir = TempDir::new().expect("tempdir");
        save_all(&populated(), dir.path()).expect("save");

        std::fs::write(dir.path().join(CHILDREN_INDEX_FILE), b"{broken").expect("corrupt");
        assert!(load_all(dir.path()).is_none());
    }

    #[test]
    fn broken_bijection_forces_cold_path() {
        let dir = TempDir::new().expect("tempdir");
        save_all(&populated(), dir.path()).expect("save");

        // Point vertex 0 at the wrong event id.
        std::fs::write(
            dir.path().join(GRAPH_TO_EVENT_FILE),
            br#"{"0":"wrong","1":"e1","2":"e2"}"#,
        )
        .expect("rewrite");
        assert!(load_all(dir.path()).is_none());
    }

    #[test]
    fn delete_all_removes_snapshots() {
        let dir = TempDir::new().expect("tempdir");
        save_all(&populated(), dir.path()).expect("save");
        delete_all(dir.path());
        for file in INDEX_FILES {
            assert!(!dir.path().join(file).exists());
        }
        // Deleting again is harmless.
        delete_all(dir.path());
    }

    #[test]
    fn empty_indexes_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        save_all(&IndexSet::new(), dir.path()).expect("save");
        let loaded = load_all(dir.path()).expect("load");
        assert!(loaded.is_empty());
    }
}
