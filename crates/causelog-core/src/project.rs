//! Deterministic state projection.
//!
//! A projector folds an entity's events, taken in causal (topological)
//! order, through per-event-type reducers to produce the entity's current or
//! historical state. Reducers are pure: `(current state, payload, type) →
//! new state` over `serde_json` maps. Payload contents are untrusted: a
//! missing or wrong-typed `amount` counts as zero, never a panic.
//!
//! Events whose type has no registered reducer are skipped with a warning
//! and contribute nothing to the projected state.

use crate::event::{EventRecord, Payload};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::warn;

/// Projected entity state: string keys to JSON values.
pub type ProjectedState = serde_json::Map<String, Value>;

/// A pure state transition for one event type.
pub type Reducer = Box<dyn Fn(&ProjectedState, &Payload, &str) -> ProjectedState + Send + Sync>;

/// Registry of reducers keyed by event type.
pub struct StateProjector {
    reducers: HashMap<String, Reducer>,
}

impl StateProjector {
    /// A projector with no reducers registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reducers: HashMap::new(),
        }
    }

    /// A projector preloaded with the default domain catalogue: user,
    /// product, and order lifecycle events.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut projector = Self::new();
        register_defaults(&mut projector);
        projector
    }

    /// Register (or replace) the reducer for `event_type`.
    pub fn register(&mut self, event_type: impl Into<String>, reducer: Reducer) {
        self.reducers.insert(event_type.into(), reducer);
    }

    /// `true` iff a reducer is registered for `event_type`.
    #[must_use]
    pub fn has_reducer(&self, event_type: &str) -> bool {
        self.reducers.contains_key(event_type)
    }

    /// Apply one event to `state`. Unregistered types are a warned no-op.
    #[must_use]
    pub fn apply(&self, state: ProjectedState, record: &EventRecord) -> ProjectedState {
        match self.reducers.get(&record.event_type) {
            Some(reducer) => reducer(&state, &record.payload, &record.event_type),
            None => {
                warn!(
                    event_type = %record.event_type,
                    event_id = %record.event_id,
                    "no reducer registered; event skipped in projection"
                );
                state
            }
        }
    }

    /// Fold a causally ordered event sequence from the empty state.
    #[must_use]
    pub fn project<'a>(&self, events: impl IntoIterator<Item = &'a EventRecord>) -> ProjectedState {
        events
            .into_iter()
            .fold(ProjectedState::new(), |state, record| {
                self.apply(state, record)
            })
    }
}

impl Default for StateProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.reducers.keys().map(String::as_str).collect();
        types.sort_unstable();
        f.debug_struct("StateProjector")
            .field("event_types", &types)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Default catalogue
// ---------------------------------------------------------------------------

fn register_defaults(p: &mut StateProjector) {
    p.register(
        "USER_CREATED",
        Box::new(|_state, payload, _| {
            let mut next = ProjectedState::new();
            copy(&mut next, payload, "userId");
            copy(&mut next, payload, "username");
            next.insert("isActive".into(), Value::Bool(true));
            next.insert("version".into(), json!(1));
            copy_as(&mut next, payload, "timestamp", "createdAt");
            next
        }),
    );

    p.register(
        "USER_RENAMED",
        Box::new(|state, payload, _| {
            let mut next = state.clone();
            if let Some(name) = payload.get("newUsername") {
                next.insert("username".into(), name.clone());
            }
            bump_version(state, &mut next);
            copy_as(&mut next, payload, "timestamp", "lastModified");
            next
        }),
    );

    p.register(
        "USER_DEACTIVATED",
        Box::new(|state, payload, _| {
            let mut next = state.clone();
            next.insert("isActive".into(), Value::Bool(false));
            copy_as(&mut next, payload, "reason", "deactivationReason");
            bump_version(state, &mut next);
            copy_as(&mut next, payload, "timestamp", "deactivatedAt");
            next
        }),
    );

    p.register(
        "USER_REACTIVATED",
        Box::new(|state, payload, _| {
            let mut next = state.clone();
            next.insert("isActive".into(), Value::Bool(true));
            next.remove("deactivationReason");
            next.remove("deactivatedAt");
            bump_version(state, &mut next);
            copy_as(&mut next, payload, "timestamp", "reactivatedAt");
            next
        }),
    );

    p.register(
        "PRODUCT_ADDED",
        Box::new(|_state, payload, _| {
            let mut next = ProjectedState::new();
            copy(&mut next, payload, "productId");
            copy(&mut next, payload, "productName");
            copy(&mut next, payload, "price");
            next.insert("stock".into(), json!(int_of(payload, "stock")));
            next.insert("version".into(), json!(1));
            copy_as(&mut next, payload, "timestamp", "createdAt");
            next
        }),
    );

    p.register(
        "PRODUCT_UPDATED",
        Box::new(|state, payload, _| {
            let mut next = state.clone();
            copy(&mut next, payload, "productName");
            copy(&mut next, payload, "price");
            bump_version(state, &mut next);
            copy_as(&mut next, payload, "timestamp", "lastModified");
            next
        }),
    );

    p.register(
        "STOCK_INCREMENTED",
        Box::new(|state, payload, _| {
            let mut next = state.clone();
            let stock = int_of(state, "stock") + int_of(payload, "amount");
            next.insert("stock".into(), json!(stock));
            bump_version(state, &mut next);
            copy_as(&mut next, payload, "timestamp", "lastStockUpdate");
            next
        }),
    );

    p.register(
        "STOCK_DECREMENTED",
        Box::new(|state, payload, _| {
            let mut next = state.clone();
            // Stock never goes negative.
            let stock = (int_of(state, "stock") - int_of(payload, "amount")).max(0);
            next.insert("stock".into(), json!(stock));
            bump_version(state, &mut next);
            copy_as(&mut next, payload, "timestamp", "lastStockUpdate");
            next
        }),
    );

    p.register(
        "ORDER_CREATED",
        Box::new(|_state, payload, _| {
            let mut next = ProjectedState::new();
            copy(&mut next, payload, "orderId");
            copy(&mut next, payload, "userId");
            next.insert("status".into(), json!("CREATED"));
            copy(&mut next, payload, "items");
            copy(&mut next, payload, "totalAmount");
            next.insert("version".into(), json!(1));
            copy_as(&mut next, payload, "timestamp", "createdAt");
            next
        }),
    );

    p.register(
        "ORDER_CONFIRMED",
        Box::new(|state, payload, _| {
            let mut next = state.clone();
            next.insert("status".into(), json!("CONFIRMED"));
            bump_version(state, &mut next);
            copy_as(&mut next, payload, "timestamp", "confirmedAt");
            next
        }),
    );

    p.register(
        "ORDER_SHIPPED",
        Box::new(|state, payload, _| {
            let mut next = state.clone();
            next.insert("status".into(), json!("SHIPPED"));
            copy(&mut next, payload, "trackingNumber");
            bump_version(state, &mut next);
            copy_as(&mut next, payload, "timestamp", "shippedAt");
            next
        }),
    );

    p.register(
        "ORDER_CANCELLED",
        Box::new(|state, payload, _| {
            let mut next = state.clone();
            next.insert("status".into(), json!("CANCELLED"));
            copy_as(&mut next, payload, "reason", "cancellationReason");
            bump_version(state, &mut next);
            copy_as(&mut next, payload, "timestamp", "cancelledAt");
            next
        }),
    );
}

/// Copy `key` from `payload` into `state` when present.
fn copy(state: &mut ProjectedState, payload: &Payload, key: &str) {
    if let Some(value) = payload.get(key) {
        state.insert(key.to_string(), value.clone());
    }
}

/// Copy `from` in `payload` into `state` under `to` when present.
fn copy_as(state: &mut ProjectedState, payload: &Payload, from: &str, to: &str) {
    if let Some(value) = payload.get(from) {
        state.insert(to.to_string(), value.clone());
    }
}

/// `key` as an integer; absent or wrong-typed values count as zero.
fn int_of(map: &ProjectedState, key: &str) -> i64 {
    map.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// Write `version = old version + 1` into `next`.
fn bump_version(prev: &ProjectedState, next: &mut ProjectedState) {
    next.insert("version".into(), json!(int_of(prev, "version") + 1));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VectorClock;
    use chrono::Utc;
    use serde_json::json;

    fn event(event_type: &str, payload: Payload) -> EventRecord {
        EventRecord {
            event_id: format!("id-{event_type}"),
            timestamp: Utc::now(),
            node_id: "default-node".into(),
            trace_id: "t".into(),
            service_name: "ENTITY".into(),
            service_version: "1".into(),
            hostname: "h".into(),
            event_type: event_type.into(),
            payload,
            causal_parent_event_ids: vec![],
            vector_clock: VectorClock::new(),
        }
    }

    fn payload(pairs: &[(&str, Value)]) -> Payload {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn user_lifecycle() {
        let p = StateProjector::with_defaults();
        let events = vec![
            event(
                "USER_CREATED",
                payload(&[
                    ("userId", json!("u-1")),
                    ("username", json!("ada")),
                    ("timestamp", json!("2026-01-01T00:00:00Z")),
                ]),
            ),
            event("USER_RENAMED", payload(&[("newUsername", json!("lovelace"))])),
            event("USER_DEACTIVATED", payload(&[("reason", json!("left"))])),
        ];

        let state = p.project(&events);
        assert_eq!(state["userId"], json!("u-1"));
        assert_eq!(state["username"], json!("lovelace"));
        assert_eq!(state["isActive"], json!(false));
        assert_eq!(state["deactivationReason"], json!("left"));
        assert_eq!(state["version"], json!(3));
        assert_eq!(state["createdAt"], json!("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn reactivation_clears_deactivation_fields() {
        let p = StateProjector::with_defaults();
        let events = vec![
            event("USER_CREATED", payload(&[("userId", json!("u"))])),
            event("USER_DEACTIVATED", payload(&[("reason", json!("x"))])),
            event("USER_REACTIVATED", Payload::new()),
        ];

        let state = p.project(&events);
        assert_eq!(state["isActive"], json!(true));
        assert!(!state.contains_key("deactivationReason"));
        assert!(!state.contains_key("deactivatedAt"));
        assert_eq!(state["version"], json!(3));
    }

    #[test]
    fn stock_arithmetic_tolerates_wrong_types() {
        let p = StateProjector::with_defaults();
        let events = vec![
            event(
                "PRODUCT_ADDED",
                payload(&[("productId", json!("p-1")), ("stock", json!(10))]),
            ),
            event("STOCK_INCREMENTED", payload(&[("amount", json!(5))])),
            // Wrong-typed amount counts as zero.
            event("STOCK_INCREMENTED", payload(&[("amount", json!("oops"))])),
            event("STOCK_DECREMENTED", payload(&[("amount", json!(100))])),
        ];

        let state = p.project(&events);
        // 10 + 5 + 0, then clamped at zero by the oversized decrement.
        assert_eq!(state["stock"], json!(0));
        assert_eq!(state["version"], json!(4));
    }

    #[test]
    fn product_added_defaults_stock_to_zero() {
        let p = StateProjector::with_defaults();
        let state = p.project(&[event("PRODUCT_ADDED", payload(&[("productId", json!("p"))]))]);
        assert_eq!(state["stock"], json!(0));
        assert_eq!(state["version"], json!(1));
    }

    #[test]
    fn product_updated_only_touches_present_fields() {
        let p = StateProjector::with_defaults();
        let events = vec![
            event(
                "PRODUCT_ADDED",
                payload(&[
                    ("productId", json!("p")),
                    ("productName", json!("Widget")),
                    ("price", json!(9.99)),
                ]),
            ),
            event("PRODUCT_UPDATED", payload(&[("price", json!(12.5))])),
        ];

        let state = p.project(&events);
        assert_eq!(state["productName"], json!("Widget"));
        assert_eq!(state["price"], json!(12.5));
        assert_eq!(state["version"], json!(2));
    }

    #[test]
    fn order_lifecycle() {
        let p = StateProjector::with_defaults();
        let events = vec![
            event(
                "ORDER_CREATED",
                payload(&[
                    ("orderId", json!("o-1")),
                    ("userId", json!("u-1")),
                    ("items", json!(["a", "b"])),
                    ("totalAmount", json!(42)),
                ]),
            ),
            event("ORDER_CONFIRMED", Payload::new()),
            event(
                "ORDER_SHIPPED",
                payload(&[("trackingNumber", json!("TRK-9"))]),
            ),
        ];

        let state = p.project(&events);
        assert_eq!(state["status"], json!("SHIPPED"));
        assert_eq!(state["trackingNumber"], json!("TRK-9"));
        assert_eq!(state["items"], json!(["a", "b"]));
        assert_eq!(state["version"], json!(3));
    }

    #[test]
    fn order_cancellation_records_reason() {
        let p = StateProjector::with_defaults();
        let events = vec![
            event("ORDER_CREATED", payload(&[("orderId", json!("o"))])),
            event("ORDER_CANCELLED", payload(&[("reason", json!("oos"))])),
        ];
        let state = p.project(&events);
        assert_eq!(state["status"], json!("CANCELLED"));
        assert_eq!(state["cancellationReason"], json!("oos"));
    }

    #[test]
    fn unregistered_type_is_a_noop() {
        let p = StateProjector::with_defaults();
        let events = vec![
            event("USER_CREATED", payload(&[("userId", json!("u"))])),
            event("SOMETHING_ELSE", payload(&[("x", json!(1))])),
        ];
        let state = p.project(&events);
        assert_eq!(state["version"], json!(1));
        assert!(!state.contains_key("x"));
    }

    #[test]
    fn custom_reducer_can_be_registered() {
        let mut p = StateProjector::new();
        assert!(!p.has_reducer("PING"));
        p.register(
            "PING",
            Box::new(|state, _payload, event_type| {
                let mut next = state.clone();
                let count = int_of(state, "pings") + 1;
                next.insert("pings".into(), json!(count));
                next.insert("lastType".into(), json!(event_type));
                next
            }),
        );
        assert!(p.has_reducer("PING"));

        let state = p.project(&[event("PING", Payload::new()), event("PING", Payload::new())]);
        assert_eq!(state["pings"], json!(2));
        assert_eq!(state["lastType"], json!("PING"));
    }

    #[test]
    fn empty_event_stream_projects_empty_state() {
        let p = StateProjector::with_defaults();
        let no_events: Vec<EventRecord> = Vec::new();
        assert!(p.project(&no_events).is_empty());
    }

    #[test]
    fn all_twelve_default_types_are_registered() {
        let p = StateProjector::with_defaults();
        for event_type in [
            "USER_CREATED",
            "USER_RENAMED",
            "USER_DEACTIVATED",
            "USER_REACTIVATED",
            "PRODUCT_ADDED",
            "PRODUCT_UPDATED",
            "STOCK_INCREMENTED",
            "STOCK_DECREMENTED",
            "ORDER_CREATED",
            "ORDER_CONFIRMED",
            "ORDER_SHIPPED",
            "ORDER_CANCELLED",
        ] {
            assert!(p.has_reducer(event_type), "missing reducer for {event_type}");
        }
    }
}
