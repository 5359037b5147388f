//! State projection and time travel over the causal order.

use causelog_core::{CausalLedger, LedgerConfig, Payload};
use serde_json::{json, Value};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_ledger() -> (TempDir, CausalLedger) {
    let dir = TempDir::new().expect("tempdir");
    let ledger = CausalLedger::open(LedgerConfig::new(dir.path().join("events.log")))
        .expect("open ledger");
    (dir, ledger)
}

fn payload(pairs: &[(&str, Value)]) -> Payload {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn ingest_on(
    ledger: &CausalLedger,
    service: &str,
    event_type: &str,
    body: Payload,
    parents: &[String],
) -> String {
    ledger
        .ingest_event(
            "projection-trace",
            service,
            "1.0.0",
            "host-a",
            event_type,
            body,
            parents,
        )
        .expect("ingest")
}

// ---------------------------------------------------------------------------
// Scenario: user rename with time travel
// ---------------------------------------------------------------------------

#[test]
fn current_state_and_state_up_to() {
    let (_dir, ledger) = open_ledger();

    let creation = ingest_on(
        &ledger,
        "USER_ACCOUNT",
        "USER_CREATED",
        payload(&[("userId", json!("u")), ("username", json!("a"))]),
        &[],
    );
    let _rename = ingest_on(
        &ledger,
        "USER_ACCOUNT",
        "USER_RENAMED",
        payload(&[("userId", json!("u")), ("newUsername", json!("b"))]),
        &[creation.clone()],
    );

    let now = ledger.current_state("USER_ACCOUNT").expect("project");
    assert_eq!(now["userId"], json!("u"));
    assert_eq!(now["username"], json!("b"));
    assert_eq!(now["isActive"], json!(true));
    assert_eq!(now["version"], json!(2));

    let then = ledger
        .state_up_to("USER_ACCOUNT", &creation)
        .expect("time travel");
    assert_eq!(then["username"], json!("a"));
    assert_eq!(then["version"], json!(1));
}

#[test]
fn state_up_to_unknown_event_is_empty() {
    let (_dir, ledger) = open_ledger();
    ingest_on(
        &ledger,
        "USER_ACCOUNT",
        "USER_CREATED",
        payload(&[("userId", json!("u"))]),
        &[],
    );

    let state = ledger
        .state_up_to("USER_ACCOUNT", "never-committed")
        .expect("project");
    assert!(state.is_empty());
}

#[test]
fn unknown_entity_projects_to_empty_state() {
    let (_dir, ledger) = open_ledger();
    ingest_on(
        &ledger,
        "USER_ACCOUNT",
        "USER_CREATED",
        payload(&[("userId", json!("u"))]),
        &[],
    );
    let state = ledger.current_state("NO_SUCH_SERVICE").expect("project");
    assert!(state.is_empty());
}

// ---------------------------------------------------------------------------
// Projection follows causal order, not ingestion interleaving
// ---------------------------------------------------------------------------

#[test]
fn projection_filters_to_the_requested_entity() {
    let (_dir, ledger) = open_ledger();

    ingest_on(
        &ledger,
        "PRODUCT_CATALOG",
        "PRODUCT_ADDED",
        payload(&[("productId", json!("p-1")), ("stock", json!(3))]),
        &[],
    );
    ingest_on(
        &ledger,
        "USER_ACCOUNT",
        "USER_CREATED",
        payload(&[("userId", json!("u")), ("username", json!("a"))]),
        &[],
    );
    ingest_on(
        &ledger,
        "PRODUCT_CATALOG",
        "STOCK_INCREMENTED",
        payload(&[("amount", json!(4))]),
        &[],
    );

    let product = ledger.current_state("PRODUCT_CATALOG").expect("project");
    assert_eq!(product["stock"], json!(7));
    assert_eq!(product["version"], json!(2));
    assert!(!product.contains_key("username"));

    let user = ledger.current_state("USER_ACCOUNT").expect("project");
    assert_eq!(user["username"], json!("a"));
    assert!(!user.contains_key("stock"));
}

#[test]
fn unregistered_event_types_are_skipped() {
    let (_dir, ledger) = open_ledger();
    ingest_on(
        &ledger,
        "USER_ACCOUNT",
        "USER_CREATED",
        payload(&[("userId", json!("u"))]),
        &[],
    );
    ingest_on(
        &ledger,
        "USER_ACCOUNT",
        "TOTALLY_CUSTOM",
        payload(&[("x", json!(1))]),
        &[],
    );

    let state = ledger.current_state("USER_ACCOUNT").expect("project");
    assert_eq!(state["version"], json!(1));
    assert!(!state.contains_key("x"));
}

#[test]
fn custom_reducer_registered_through_the_ledger() {
    let (_dir, ledger) = open_ledger();
    ledger.register_reducer(
        "TOTALLY_CUSTOM",
        Box::new(|state, payload, _| {
            let mut next = state.clone();
            if let Some(x) = payload.get("x") {
                next.insert("x".into(), x.clone());
            }
            next
        }),
    );

    ingest_on(
        &ledger,
        "USER_ACCOUNT",
        "TOTALLY_CUSTOM",
        payload(&[("x", json!(41))]),
        &[],
    );

    let state = ledger.current_state("USER_ACCOUNT").expect("project");
    assert_eq!(state["x"], json!(41));
}

#[test]
fn projection_survives_restart() {
    let dir = TempDir::new().expect("tempdir");
    let config = LedgerConfig::new(dir.path().join("events.log"));

    {
        let ledger = CausalLedger::open(config.clone()).expect("open");
        let creation = ingest_on(
            &ledger,
            "USER_ACCOUNT",
            "USER_CREATED",
            payload(&[("userId", json!("u")), ("username", json!("a"))]),
            &[],
        );
        ingest_on(
            &ledger,
            "USER_ACCOUNT",
            "USER_RENAMED",
            payload(&[("newUsername", json!("b"))]),
            &[creation],
        );
        ledger.close().expect("close");
    }

    let ledger = CausalLedger::open(config).expect("reopen");
    let state = ledger.current_state("USER_ACCOUNT").expect("project");
    assert_eq!(state["username"], json!("b"));
    assert_eq!(state["version"], json!(2));
}

// ---------------------------------------------------------------------------
// Order lifecycle across a trace
// ---------------------------------------------------------------------------

#[test]
fn order_lifecycle_folds_in_causal_order() {
    let (_dir, ledger) = open_ledger();

    // Auto-parenting on one trace: created → confirmed → shipped.
    ingest_on(
        &ledger,
        "ORDER_SERVICE",
        "ORDER_CREATED",
        payload(&[
            ("orderId", json!("o-1")),
            ("userId", json!("u-1")),
            ("totalAmount", json!(42)),
        ]),
        &[],
    );
    ingest_on(&ledger, "ORDER_SERVICE", "ORDER_CONFIRMED", Payload::new(), &[]);
    let shipped = ingest_on(
        &ledger,
        "ORDER_SERVICE",
        "ORDER_SHIPPED",
        payload(&[("trackingNumber", json!("TRK-7"))]),
        &[],
    );

    let state = ledger.current_state("ORDER_SERVICE").expect("project");
    assert_eq!(state["status"], json!("SHIPPED"));
    assert_eq!(state["trackingNumber"], json!("TRK-7"));
    assert_eq!(state["version"], json!(3));

    // As of the shipped event itself the state is identical.
    let as_of = ledger
        .state_up_to("ORDER_SERVICE", &shipped)
        .expect("time travel");
    assert_eq!(as_of, state);
}
