#![forbid(unsafe_code)]
//! causelog-core: a single-node causal event ledger.
//!
//! An append-only store of immutable event records where each record
//! declares zero or more causal parents, forming a DAG of happens-before
//! relationships. Clients ingest events tagged with a trace id and query the
//! graph for ancestry, descendants, shortest causal paths, common ancestors,
//! topological order, and projected entity state.
//!
//! The entry point is [`ledger::CausalLedger`], opened from a
//! [`config::LedgerConfig`]:
//!
//! ```no_run
//! use causelog_core::{CausalLedger, LedgerConfig, Payload};
//!
//! # fn main() -> Result<(), causelog_core::LedgerError> {
//! let ledger = CausalLedger::open(LedgerConfig::new("data/events.log"))?;
//! let id = ledger.ingest_event(
//!     "checkout-42",
//!     "ORDER_SERVICE",
//!     "1.4.0",
//!     "host-a",
//!     "ORDER_CREATED",
//!     Payload::new(),
//!     &[],
//! )?;
//! let ancestry = ledger.ancestry(&id);
//! # let _ = ancestry;
//! # Ok(())
//! # }
//! ```
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per module, unified into
//!   [`error::LedgerError`] at the public surface; `anyhow` carries context
//!   through persistence internals.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod clock;
pub mod config;
pub mod dag;
pub mod error;
pub mod event;
pub mod index;
pub mod ledger;
pub mod lock;
pub mod project;
pub mod store;

pub use clock::{Causality, VectorClock, VectorClockManager};
pub use config::{FsyncPolicy, LedgerConfig};
pub use error::LedgerError;
pub use event::{EventRecord, Payload};
pub use ledger::{CausalLedger, LedgerStats};
pub use project::{ProjectedState, Reducer, StateProjector};
