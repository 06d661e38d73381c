//! Core domain logic for Circle.
//! This crate is the single source of truth for category/contact invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{
    CategoryDraft, CategoryId, CategoryNode, CategoryPatch, ColorKey, Dimension,
};
pub use model::contact::{
    CategoryTag, ContactDraft, ContactId, ContactPatch, ContactRecord, Presence,
    DEFAULT_RELATIONSHIP,
};
pub use model::snapshot::{CategoryDimension, CategoryDimensions, Snapshot, SnapshotError};
pub use model::validation::ValidationError;
pub use repo::snapshot_repo::{
    MemorySnapshotRepository, SnapshotRepoError, SnapshotRepoResult, SnapshotRepository,
    SqliteSnapshotRepository,
};
pub use service::app_state::{now_epoch_ms, AppError, AppResult, AppState};
pub use service::association::{AssociationCoordinator, CategoryDeletion};
pub use store::category_store::{CategoryEntry, CategoryStore};
pub use store::contact_store::{ContactStore, RecentContacts};
pub use store::{StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
