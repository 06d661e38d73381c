//! Repository layer for persisted state.
//!
//! # Responsibility
//! - Define the snapshot storage contract consumed by `AppState`.
//! - Isolate SQLite details from coordinator and facade logic.
//!
//! # Invariants
//! - Repository APIs return semantic errors in addition to DB transport
//!   errors.

pub mod snapshot_repo;
