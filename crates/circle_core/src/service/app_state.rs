//! Process-facing application state facade.
//!
//! # Responsibility
//! - Surface coordinator operations and read queries to UI/FFI callers.
//! - Persist exactly one snapshot after each successful mutation.
//!
//! # Invariants
//! - Reads never write.
//! - A rejected mutation or a failed snapshot write leaves in-memory state
//!   equal to the last persisted snapshot.
//! - Log events carry ids and counts, never contact names or phones.

use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::model::category::{CategoryDraft, CategoryId, CategoryNode, CategoryPatch, Dimension};
use crate::model::contact::{
    CategoryTag, ContactDraft, ContactId, ContactPatch, ContactRecord, Presence,
};
use crate::model::snapshot::{Snapshot, SnapshotError};
use crate::model::validation::ValidationError;
use crate::repo::snapshot_repo::{SnapshotRepoError, SnapshotRepository};
use crate::service::association::{AssociationCoordinator, CategoryDeletion};
use crate::store::category_store::CategoryStore;
use crate::store::contact_store::{ContactStore, RecentContacts};
use crate::store::{StoreError, StoreResult};

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced to facade callers.
#[derive(Debug)]
pub enum AppError {
    /// Category id does not resolve in the given dimension.
    CategoryNotFound {
        dimension: Dimension,
        id: CategoryId,
    },
    /// Contact id does not resolve.
    ContactNotFound(ContactId),
    /// Input rejected by field validation.
    Validation(ValidationError),
    /// Snapshot storage failed; the mutation was rolled back.
    Persistence(SnapshotRepoError),
    /// Stored snapshot breaks a model invariant.
    InvalidSnapshot(SnapshotError),
}

impl AppError {
    /// Stable machine-readable code for logs and host envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CategoryNotFound { .. } => "category_not_found",
            Self::ContactNotFound(_) => "contact_not_found",
            Self::Validation(_) => "validation",
            Self::Persistence(_) => "persistence",
            Self::InvalidSnapshot(_) => "invalid_snapshot",
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CategoryNotFound { dimension, id } => {
                write!(f, "category not found in {}: {id}", dimension.as_str())
            }
            Self::ContactNotFound(id) => write!(f, "contact not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "persistence failed: {err}"),
            Self::InvalidSnapshot(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::InvalidSnapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::CategoryNotFound { dimension, id } => {
                Self::CategoryNotFound { dimension, id }
            }
            StoreError::ContactNotFound(id) => Self::ContactNotFound(id),
            StoreError::Validation(err) => Self::Validation(err),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Single state object backing the UI.
pub struct AppState<R: SnapshotRepository> {
    state: AssociationCoordinator,
    repo: R,
}

impl<R: SnapshotRepository> AppState<R> {
    /// Loads the stored snapshot (or starts empty) on top of `repo`.
    ///
    /// Repeated and dangling tags found in the stored document are dropped
    /// and the repaired snapshot is written back once.
    pub fn open(repo: R) -> AppResult<Self> {
        let started_at = Instant::now();
        let stored = repo.load().map_err(AppError::Persistence)?;
        let loaded = stored.is_some();
        let (state, repaired) = match stored {
            Some(snapshot) => {
                AssociationCoordinator::from_snapshot(snapshot).map_err(|err| {
                    error!(
                        "event=state_open module=app_state status=error error_code=invalid_snapshot error={err}"
                    );
                    AppError::InvalidSnapshot(err)
                })?
            }
            None => (AssociationCoordinator::new(), 0),
        };

        let mut app = Self { state, repo };
        if repaired > 0 {
            warn!("event=state_repair module=app_state status=ok tags_dropped={repaired}");
            app.persist()?;
        }

        info!(
            "event=state_open module=app_state status=ok loaded={} work_nodes={} personal_nodes={} contacts={} duration_ms={}",
            loaded,
            app.state.categories().len(Dimension::Work),
            app.state.categories().len(Dimension::Personal),
            app.state.contacts().len(),
            started_at.elapsed().as_millis()
        );
        Ok(app)
    }

    /// Read-only coordinator view.
    pub fn state(&self) -> &AssociationCoordinator {
        &self.state
    }

    pub fn categories(&self) -> &CategoryStore {
        self.state.categories()
    }

    pub fn contacts(&self) -> &ContactStore {
        self.state.contacts()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Current state in snapshot form.
    pub fn snapshot(&self) -> Snapshot {
        self.state.to_snapshot()
    }

    /// Root nodes of one dimension.
    pub fn get_dimension(&self, dimension: Dimension) -> &[CategoryNode] {
        self.state.categories().dimension(dimension)
    }

    pub fn list_by_category(&self, dimension: Dimension, node_id: CategoryId) -> Vec<&ContactRecord> {
        self.state.contacts().list_by_category(dimension, node_id)
    }

    pub fn list_favorites(&self) -> Vec<&ContactRecord> {
        self.state.contacts().list_favorites()
    }

    pub fn count_by_dimension(&self, dimension: Dimension) -> usize {
        self.state.contacts().count_by_dimension(dimension)
    }

    pub fn list_recent(&self, limit: Option<u32>) -> RecentContacts<'_> {
        self.state.contacts().list_recent(limit)
    }

    pub fn add_category(
        &mut self,
        dimension: Dimension,
        parent_id: Option<CategoryId>,
        draft: &CategoryDraft,
    ) -> AppResult<CategoryId> {
        let id = self.commit("category_add", |state| {
            state.add_category(dimension, parent_id, draft)
        })?;
        debug!(
            "event=category_add module=app_state dimension={} node_id={id} nested={}",
            dimension.as_str(),
            parent_id.is_some()
        );
        Ok(id)
    }

    pub fn update_category(
        &mut self,
        dimension: Dimension,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> AppResult<()> {
        self.commit("category_update", |state| {
            state.update_category(dimension, id, patch)
        })
    }

    /// Deletes a node with its subtree and strips tags that pointed into it.
    pub fn delete_category(
        &mut self,
        dimension: Dimension,
        id: CategoryId,
    ) -> AppResult<CategoryDeletion> {
        let deletion = self.commit("category_delete", |state| {
            state.delete_category(dimension, id)
        })?;
        info!(
            "event=category_delete module=app_state dimension={} node_id={id} removed={} stripped_tags={} affected_contacts={}",
            dimension.as_str(),
            deletion.removed_ids.len(),
            deletion.stripped_tags,
            deletion.affected_contacts
        );
        Ok(deletion)
    }

    pub fn add_contact(&mut self, draft: ContactDraft) -> AppResult<ContactId> {
        self.commit("contact_add", |state| state.add_contact(draft))
    }

    /// Stamps the contact's last interaction with the current time.
    pub fn update_contact_last_contact(&mut self, id: ContactId) -> AppResult<()> {
        self.update_contact_last_contact_at(id, now_epoch_ms())
    }

    /// Stamps the contact's last interaction with an explicit time.
    pub fn update_contact_last_contact_at(&mut self, id: ContactId, at_epoch_ms: i64) -> AppResult<()> {
        self.commit("contact_touch", |state| state.touch_contact(id, at_epoch_ms))
    }

    pub fn toggle_favorite(&mut self, id: ContactId) -> AppResult<bool> {
        self.commit("contact_toggle_favorite", |state| state.toggle_favorite(id))
    }

    pub fn update_contact_profile(&mut self, id: ContactId, patch: &ContactPatch) -> AppResult<()> {
        self.commit("contact_update", |state| {
            state.update_contact_profile(id, patch)
        })
    }

    pub fn set_presence(&mut self, id: ContactId, presence: Presence) -> AppResult<()> {
        self.commit("contact_presence", |state| state.set_presence(id, presence))
    }

    pub fn set_contact_categories(&mut self, id: ContactId, tags: Vec<CategoryTag>) -> AppResult<()> {
        self.commit("contact_set_categories", |state| {
            state.set_contact_categories(id, tags)
        })
    }

    pub fn delete_contact(&mut self, id: ContactId) -> AppResult<()> {
        self.commit("contact_delete", |state| state.delete_contact(id).map(drop))
    }

    /// Runs one mutation and persists the result.
    ///
    /// Restores the pre-mutation state when the mutation is rejected or the
    /// snapshot write fails.
    fn commit<T>(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut AssociationCoordinator) -> StoreResult<T>,
    ) -> AppResult<T> {
        let backup = self.state.clone();
        let value = match apply(&mut self.state) {
            Ok(value) => value,
            Err(err) => {
                self.state = backup;
                let err = AppError::from(err);
                warn!(
                    "event={operation} module=app_state status=rejected error_code={} error={err}",
                    err.code()
                );
                return Err(err);
            }
        };

        if let Err(err) = self.persist() {
            self.state = backup;
            error!(
                "event={operation} module=app_state status=error error_code={} error={err}",
                err.code()
            );
            return Err(err);
        }

        info!("event={operation} module=app_state status=ok");
        Ok(value)
    }

    fn persist(&mut self) -> AppResult<()> {
        self.repo
            .save(&self.state.to_snapshot())
            .map_err(AppError::Persistence)
    }
}

/// Current wall-clock time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
