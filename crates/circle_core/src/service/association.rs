//! Category/contact association coordinator.
//!
//! # Responsibility
//! - Own both stores and serve as their only mutation path.
//! - Reconcile contact tags with category mutations.
//!
//! # Invariants
//! - After any operation returns, every contact tag resolves to a node in
//!   its dimension.
//! - A failed operation leaves both stores unchanged.
//! - Category deletion strips tags of the node and all its descendants, and
//!   never removes or otherwise edits a contact.

use log::debug;
use std::collections::{HashMap, HashSet};

use crate::model::category::{CategoryDraft, CategoryId, CategoryPatch, Dimension};
use crate::model::contact::{
    dedup_tags, CategoryTag, ContactDraft, ContactId, ContactPatch, ContactRecord, Presence,
};
use crate::model::snapshot::{Snapshot, SnapshotError};
use crate::store::category_store::CategoryStore;
use crate::store::contact_store::ContactStore;
use crate::store::{StoreError, StoreResult};

/// Outcome of a cascading category deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDeletion {
    /// Removed node and every descendant, pre-order.
    pub removed_ids: Vec<CategoryId>,
    /// Tags stripped from contacts.
    pub stripped_tags: usize,
    /// Contacts that lost at least one tag.
    pub affected_contacts: usize,
}

/// Single owner of the category and contact stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationCoordinator {
    categories: CategoryStore,
    contacts: ContactStore,
}

impl AssociationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads state from a snapshot document.
    ///
    /// Repeated tags are collapsed and tags that do not resolve are
    /// stripped, so the loaded state starts without duplicate or dangling
    /// references. Returns the state and the number of tags dropped.
    ///
    /// # Errors
    /// - `SnapshotError::InvalidData` when a forest or contact breaks a model
    ///   invariant.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<(Self, usize), SnapshotError> {
        let categories = CategoryStore::from_dimensions(snapshot.category_dimensions)
            .map_err(SnapshotError::InvalidData)?;
        let (contacts, collapsed) =
            ContactStore::from_records(snapshot.contacts).map_err(SnapshotError::InvalidData)?;
        let mut state = Self {
            categories,
            contacts,
        };
        let stripped = state.reconcile_dangling();
        Ok((state, collapsed + stripped))
    }

    /// Copies current state into the snapshot document shape.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            category_dimensions: self.categories.to_dimensions(),
            contacts: self.contacts.list().to_vec(),
        }
    }

    /// Read-only view of the category forests.
    pub fn categories(&self) -> &CategoryStore {
        &self.categories
    }

    /// Read-only view of the contacts.
    pub fn contacts(&self) -> &ContactStore {
        &self.contacts
    }

    pub fn add_category(
        &mut self,
        dimension: Dimension,
        parent_id: Option<CategoryId>,
        draft: &CategoryDraft,
    ) -> StoreResult<CategoryId> {
        self.categories.add_category(dimension, parent_id, draft)
    }

    /// Renames/recolors a node and refreshes display paths of tags that
    /// point at it or at any descendant.
    pub fn update_category(
        &mut self,
        dimension: Dimension,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> StoreResult<()> {
        self.categories.update_category(dimension, id, patch)?;
        if patch.name.is_none() {
            return Ok(());
        }

        let paths: HashMap<CategoryId, Vec<String>> = self
            .categories
            .subtree_ids(dimension, id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|node_id| {
                self.categories
                    .path_of(dimension, node_id)
                    .map(|path| (node_id, path))
            })
            .collect();
        let refreshed = self.contacts.refresh_paths(dimension, &paths);
        debug!(
            "event=tag_paths_refresh module=association status=ok dimension={} nodes={} tags={}",
            dimension.as_str(),
            paths.len(),
            refreshed
        );
        Ok(())
    }

    /// Deletes a node with its subtree and strips every tag pointing into it.
    pub fn delete_category(
        &mut self,
        dimension: Dimension,
        id: CategoryId,
    ) -> StoreResult<CategoryDeletion> {
        let removed_ids = self.categories.delete_category(dimension, id)?;
        let removed: HashSet<CategoryId> = removed_ids.iter().copied().collect();
        let (stripped_tags, affected_contacts) = self
            .contacts
            .retain_tags(|tag| !(tag.dim == dimension && removed.contains(&tag.node_id)));
        Ok(CategoryDeletion {
            removed_ids,
            stripped_tags,
            affected_contacts,
        })
    }

    /// Creates a contact whose tags are resolved against the category tree.
    ///
    /// # Errors
    /// - `StoreError::Validation` for blank name/phone or bad relationship.
    /// - `StoreError::CategoryNotFound` for a tag naming an unknown node.
    pub fn add_contact(&mut self, mut draft: ContactDraft) -> StoreResult<ContactId> {
        let tags = self.resolve_tags(std::mem::take(&mut draft.categories))?;
        self.contacts.insert(draft, tags)
    }

    /// Replaces the contact's whole tag set.
    pub fn set_contact_categories(
        &mut self,
        id: ContactId,
        tags: Vec<CategoryTag>,
    ) -> StoreResult<()> {
        if self.contacts.get(id).is_none() {
            return Err(StoreError::ContactNotFound(id));
        }
        let tags = self.resolve_tags(tags)?;
        self.contacts.replace_tags(id, tags)
    }

    /// Records an interaction at `at_epoch_ms`.
    pub fn touch_contact(&mut self, id: ContactId, at_epoch_ms: i64) -> StoreResult<()> {
        self.contacts.touch(id, at_epoch_ms)
    }

    pub fn toggle_favorite(&mut self, id: ContactId) -> StoreResult<bool> {
        self.contacts.toggle_favorite(id)
    }

    pub fn update_contact_profile(&mut self, id: ContactId, patch: &ContactPatch) -> StoreResult<()> {
        self.contacts.update_profile(id, patch)
    }

    pub fn set_presence(&mut self, id: ContactId, presence: Presence) -> StoreResult<()> {
        self.contacts.set_presence(id, presence)
    }

    pub fn delete_contact(&mut self, id: ContactId) -> StoreResult<ContactRecord> {
        self.contacts.remove(id)
    }

    /// Strips tags that do not resolve in their dimension.
    ///
    /// Returns the number of tags removed.
    pub fn reconcile_dangling(&mut self) -> usize {
        let categories = &self.categories;
        let (removed, _) = self
            .contacts
            .retain_tags(|tag| categories.contains(tag.dim, tag.node_id));
        removed
    }

    /// Validates requested tags and fills display paths from the tree.
    fn resolve_tags(&self, tags: Vec<CategoryTag>) -> StoreResult<Vec<CategoryTag>> {
        dedup_tags(tags)
            .into_iter()
            .map(|tag| {
                let path = self.categories.path_of(tag.dim, tag.node_id).ok_or(
                    StoreError::CategoryNotFound {
                        dimension: tag.dim,
                        id: tag.node_id,
                    },
                )?;
                Ok(CategoryTag::new(tag.dim, tag.node_id, path))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::AssociationCoordinator;
    use crate::model::category::{CategoryDraft, CategoryPatch, ColorKey, Dimension};
    use crate::model::contact::{CategoryTag, ContactDraft};
    use crate::store::StoreError;
    use uuid::Uuid;

    #[test]
    fn rename_refreshes_descendant_tag_paths() {
        let mut state = AssociationCoordinator::new();
        let eng = state
            .add_category(Dimension::Work, None, &CategoryDraft::new("Engineering", ColorKey::Blue))
            .unwrap();
        let backend = state
            .add_category(Dimension::Work, Some(eng), &CategoryDraft::new("Backend", ColorKey::Green))
            .unwrap();
        let contact = state
            .add_contact(ContactDraft::new("Ann", "123").with_tag(Dimension::Work, backend))
            .unwrap();

        state
            .update_category(Dimension::Work, eng, &CategoryPatch::rename("Eng"))
            .unwrap();

        let tag = &state.contacts().get(contact).unwrap().categories[0];
        assert_eq!(tag.path, vec!["Eng".to_string(), "Backend".to_string()]);
    }

    #[test]
    fn add_contact_rejects_tag_for_missing_node_without_inserting() {
        let mut state = AssociationCoordinator::new();
        let missing = Uuid::new_v4();

        let err = state
            .add_contact(ContactDraft::new("Ann", "123").with_tag(Dimension::Personal, missing))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::CategoryNotFound {
                dimension: Dimension::Personal,
                id: missing
            }
        );
        assert!(state.contacts().is_empty());
    }

    #[test]
    fn caller_supplied_paths_are_replaced_by_tree_names() {
        let mut state = AssociationCoordinator::new();
        let family = state
            .add_category(Dimension::Personal, None, &CategoryDraft::new("Family", ColorKey::Pink))
            .unwrap();
        let mut draft = ContactDraft::new("Bo", "9");
        draft.categories.push(CategoryTag::new(
            Dimension::Personal,
            family,
            vec!["stale label".to_string()],
        ));

        let id = state.add_contact(draft).unwrap();
        assert_eq!(
            state.contacts().get(id).unwrap().categories[0].path,
            vec!["Family".to_string()]
        );
    }
}
