//! Event data model for the causal ledger.
//!
//! An [`EventRecord`] is one immutable commit in the ledger: identity,
//! wall-clock timestamp, emitting node, trace, service metadata, type,
//! dynamic payload, causal parent ids, and vector clock. Records are born
//! inside ingestion and never mutated or deleted afterwards.
//!
//! # Wire form
//!
//! One self-describing JSON object per log line, camelCase field names:
//!
//! ```text
//! {"eventId":"…","timestamp":"…","nodeId":"…","serviceName":"…","traceId":"…",
//!  "serviceVersion":"…","hostname":"…","eventType":"…","payload":{…},
//!  "causalParentEventIds":[…],"vectorClock":{…}}
//! ```
//!
//! Unknown fields are ignored on read; missing optional fields default
//! (`nodeId` to `default-node`, `traceId` to `unknown-trace`). Serialization
//! lives in [`writer`], parsing in [`parser`], and the append-only log file
//! in [`log`].

pub mod log;
pub mod parser;
pub mod writer;

pub use log::EventLog;
pub use parser::{parse_line, parse_lines, ParseError, ReplayedEvents};
pub use writer::{to_log_line, write_line, WriteError};

use crate::clock::VectorClock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dynamic event payload: string keys to JSON values (numbers, booleans,
/// strings, nested objects, arrays).
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A single immutable event in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Opaque unique id, generated at creation and never reused.
    pub event_id: String,

    /// Wall-clock instant of creation. Informational only; causal order
    /// comes from parents and vector clocks.
    #[serde(default = "default_timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Identifier of the emitting node.
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Logical flow this event belongs to; drives auto-parenting.
    #[serde(default = "default_trace_id")]
    pub trace_id: String,

    /// Emitting service. Doubles as the entity key for state projection.
    pub service_name: String,

    /// Version of the emitting service.
    #[serde(default)]
    pub service_version: String,

    /// Host the event was emitted from.
    #[serde(default)]
    pub hostname: String,

    /// Domain event type, e.g. `USER_CREATED`.
    pub event_type: String,

    /// Dynamic payload folded by state projection.
    #[serde(default)]
    pub payload: Payload,

    /// Ids of the events that causally precede this one. Each referred to a
    /// committed event at the moment of ingestion.
    #[serde(default)]
    pub causal_parent_event_ids: Vec<String>,

    /// Logical time stamped by the vector clock manager at ingestion.
    #[serde(default)]
    pub vector_clock: VectorClock,
}

impl EventRecord {
    /// `true` for events with no causal parents.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.causal_parent_event_ids.is_empty()
    }

    /// The entity key used for state projection.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.service_name
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} on {} (parents: {})",
            self.event_id,
            self.trace_id,
            self.event_type,
            self.service_name,
            self.causal_parent_event_ids.len()
        )
    }
}

fn default_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn default_node_id() -> String {
    "default-node".to_string()
}

fn default_trace_id() -> String {
    "unknown-trace".to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// A fully populated record shared by test modules across the crate.
    pub(crate) fn sample_record() -> EventRecord {
        let mut payload = Payload::new();
        payload.insert("userId".into(), json!("u-1"));
        payload.insert("username".into(), json!("ada"));

        let mut clock = VectorClock::new();
        clock.tick("default-node");

        EventRecord {
            event_id: "11111111-2222-3333-4444-555555555555".into(),
            timestamp: Utc::now(),
            node_id: "default-node".into(),
            trace_id: "trace-1".into(),
            service_name: "USER_ACCOUNT".into(),
            service_version: "1.0.0".into(),
            hostname: "host-a".into(),
            event_type: "USER_CREATED".into(),
            payload,
            causal_parent_event_ids: vec![],
            vector_clock: clock,
        }
    }

    #[test]
    fn serde_roundtrip_preserves_record() {
        let record = sample_record();
        let json = serde_json::to_string(&record).expect("serialize");
        let back: EventRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(record, back);
    }

    #[test]
    fn wire_form_uses_camel_case_keys() {
        let record = sample_record();
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).expect("serialize"))
                .expect("parse");
        let obj = value.as_object().expect("object");
        for key in [
            "eventId",
            "timestamp",
            "nodeId",
            "traceId",
            "serviceName",
            "serviceVersion",
            "hostname",
            "eventType",
            "payload",
            "causalParentEventIds",
            "vectorClock",
        ] {
            assert!(obj.contains_key(key), "missing wire field {key}");
        }
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{
            "eventId": "e-1",
            "serviceName": "SVC",
            "eventType": "PING"
        }"#;
        let record: EventRecord = serde_json::from_str(json).expect("parse with defaults");
        assert_eq!(record.node_id, "default-node");
        assert_eq!(record.trace_id, "unknown-trace");
        assert!(record.service_version.is_empty());
        assert!(record.payload.is_empty());
        assert!(record.causal_parent_event_ids.is_empty());
        assert!(record.vector_clock.is_empty());
        assert_eq!(record.timestamp, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{
            "eventId": "e-1",
            "serviceName": "SVC",
            "eventType": "PING",
            "futureField": {"nested": true}
        }"#;
        let record: EventRecord = serde_json::from_str(json).expect("tolerant parse");
        assert_eq!(record.event_id, "e-1");
    }

    #[test]
    fn display_names_the_essentials() {
        let record = sample_record();
        let s = record.to_string();
        assert!(s.contains("trace-1"));
        assert!(s.contains("USER_CREATED"));
        assert!(s.contains("USER_ACCOUNT"));
    }

    #[test]
    fn root_detection() {
        let mut record = sample_record();
        assert!(record.is_root());
        record.causal_parent_event_ids.push("parent".into());
        assert!(!record.is_root());
    }
}
