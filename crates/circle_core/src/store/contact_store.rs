//! Contact collection and derived queries.
//!
//! # Responsibility
//! - Own contact records in insertion order.
//! - Provide favorite, category, dimension and recency queries.
//!
//! # Invariants
//! - Stored records always pass `ContactRecord::validate()`.
//! - Category queries match tags exactly on `(dim, node_id)`; descendants
//!   are not included.
//! - `last_contact` is only changed by interaction updates.

use std::collections::{HashMap, HashSet};

use crate::model::category::{CategoryId, Dimension};
use crate::model::contact::{
    dedup_tags, CategoryTag, ContactDraft, ContactId, ContactPatch, ContactRecord, Presence,
};
use crate::store::{StoreError, StoreResult};

const RECENT_DEFAULT_LIMIT: u32 = 10;
const RECENT_LIMIT_MAX: u32 = 50;

/// Recency listing envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentContacts<'a> {
    /// Contacts sorted by `last_contact DESC, id ASC`.
    pub items: Vec<&'a ContactRecord>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Normalizes a recency listing limit: defaults to 10, clamps to 50.
pub fn normalize_recent_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => RECENT_DEFAULT_LIMIT,
        Some(value) => value.min(RECENT_LIMIT_MAX),
    }
}

/// Owner of all contact records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactStore {
    contacts: Vec<ContactRecord>,
}

impl ContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted records.
    ///
    /// Rejects invalid records and duplicate contact ids. Repeated tags are
    /// collapsed; returns the store and the number of tags dropped.
    pub(crate) fn from_records(
        mut contacts: Vec<ContactRecord>,
    ) -> Result<(Self, usize), String> {
        let mut ids = HashSet::new();
        let mut collapsed = 0;
        for contact in &mut contacts {
            contact
                .validate()
                .map_err(|err| format!("contact {}: {err}", contact.id))?;
            if !ids.insert(contact.id) {
                return Err(format!("duplicate contact id {}", contact.id));
            }
            let before = contact.categories.len();
            contact.categories = dedup_tags(std::mem::take(&mut contact.categories));
            collapsed += before - contact.categories.len();
        }
        Ok((Self { contacts }, collapsed))
    }

    pub fn get(&self, id: ContactId) -> Option<&ContactRecord> {
        self.contacts.iter().find(|contact| contact.id == id)
    }

    /// All contacts in insertion order.
    pub fn list(&self) -> &[ContactRecord] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Contacts tagged with exactly `(dim, node_id)`, insertion order.
    pub fn list_by_category(&self, dim: Dimension, node_id: CategoryId) -> Vec<&ContactRecord> {
        self.contacts
            .iter()
            .filter(|contact| contact.has_tag(dim, node_id))
            .collect()
    }

    pub fn list_favorites(&self) -> Vec<&ContactRecord> {
        self.contacts
            .iter()
            .filter(|contact| contact.is_favorite)
            .collect()
    }

    /// Number of contacts holding at least one tag in `dim`.
    pub fn count_by_dimension(&self, dim: Dimension) -> usize {
        self.contacts
            .iter()
            .filter(|contact| contact.has_dimension(dim))
            .count()
    }

    /// Contacts with an interaction timestamp, newest first.
    pub fn list_recent(&self, limit: Option<u32>) -> RecentContacts<'_> {
        let applied_limit = normalize_recent_limit(limit);
        let mut items: Vec<&ContactRecord> = self
            .contacts
            .iter()
            .filter(|contact| contact.last_contact.is_some())
            .collect();
        items.sort_by(|left, right| {
            right
                .last_contact
                .cmp(&left.last_contact)
                .then_with(|| left.id.cmp(&right.id))
        });
        items.truncate(applied_limit as usize);
        RecentContacts {
            items,
            applied_limit,
        }
    }

    /// Stores a new record built from `draft` with pre-resolved `tags`.
    pub(crate) fn insert(
        &mut self,
        draft: ContactDraft,
        tags: Vec<CategoryTag>,
    ) -> StoreResult<ContactId> {
        let mut record = ContactRecord::from_draft(ContactDraft {
            categories: tags,
            ..draft
        })?;
        while self.get(record.id).is_some() {
            record.id = uuid::Uuid::new_v4();
        }
        let id = record.id;
        self.contacts.push(record);
        Ok(id)
    }

    pub(crate) fn touch(&mut self, id: ContactId, at_epoch_ms: i64) -> StoreResult<()> {
        self.get_mut(id)?.last_contact = Some(at_epoch_ms);
        Ok(())
    }

    /// Flips the favorite flag and returns the new value.
    pub(crate) fn toggle_favorite(&mut self, id: ContactId) -> StoreResult<bool> {
        let contact = self.get_mut(id)?;
        contact.is_favorite = !contact.is_favorite;
        Ok(contact.is_favorite)
    }

    pub(crate) fn update_profile(&mut self, id: ContactId, patch: &ContactPatch) -> StoreResult<()> {
        self.get_mut(id)?.apply_patch(patch).map_err(Into::into)
    }

    pub(crate) fn set_presence(&mut self, id: ContactId, presence: Presence) -> StoreResult<()> {
        self.get_mut(id)?.presence = presence;
        Ok(())
    }

    pub(crate) fn replace_tags(&mut self, id: ContactId, tags: Vec<CategoryTag>) -> StoreResult<()> {
        self.get_mut(id)?.categories = tags;
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: ContactId) -> StoreResult<ContactRecord> {
        let position = self
            .contacts
            .iter()
            .position(|contact| contact.id == id)
            .ok_or(StoreError::ContactNotFound(id))?;
        Ok(self.contacts.remove(position))
    }

    /// Drops every tag for which `keep` returns false.
    ///
    /// Returns `(tags_removed, contacts_touched)`.
    pub(crate) fn retain_tags(
        &mut self,
        mut keep: impl FnMut(&CategoryTag) -> bool,
    ) -> (usize, usize) {
        let mut removed = 0;
        let mut touched = 0;
        for contact in &mut self.contacts {
            let before = contact.categories.len();
            contact.categories.retain(|tag| keep(tag));
            let dropped = before - contact.categories.len();
            if dropped > 0 {
                removed += dropped;
                touched += 1;
            }
        }
        (removed, touched)
    }

    /// Rewrites display paths of tags in `dim` whose node id is in `paths`.
    ///
    /// Returns the number of tags rewritten.
    pub(crate) fn refresh_paths(
        &mut self,
        dim: Dimension,
        paths: &HashMap<CategoryId, Vec<String>>,
    ) -> usize {
        let mut refreshed = 0;
        for tag in self
            .contacts
            .iter_mut()
            .flat_map(|contact| contact.categories.iter_mut())
            .filter(|tag| tag.dim == dim)
        {
            if let Some(path) = paths.get(&tag.node_id) {
                if tag.path != *path {
                    tag.path = path.clone();
                    refreshed += 1;
                }
            }
        }
        refreshed
    }

    fn get_mut(&mut self, id: ContactId) -> StoreResult<&mut ContactRecord> {
        self.contacts
            .iter_mut()
            .find(|contact| contact.id == id)
            .ok_or(StoreError::ContactNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_recent_limit, ContactStore};
    use crate::model::category::Dimension;
    use crate::model::contact::{CategoryTag, ContactDraft, ContactRecord};
    use crate::store::StoreError;
    use uuid::Uuid;

    #[test]
    fn recent_limit_defaults_to_10_and_caps_at_50() {
        assert_eq!(normalize_recent_limit(None), 10);
        assert_eq!(normalize_recent_limit(Some(0)), 10);
        assert_eq!(normalize_recent_limit(Some(7)), 7);
        assert_eq!(normalize_recent_limit(Some(500)), 50);
    }

    #[test]
    fn list_recent_orders_newest_first_and_skips_untouched() {
        let mut store = ContactStore::new();
        let old = store.insert(ContactDraft::new("Old", "1"), Vec::new()).unwrap();
        let new = store.insert(ContactDraft::new("New", "2"), Vec::new()).unwrap();
        store.insert(ContactDraft::new("Never", "3"), Vec::new()).unwrap();
        store.touch(old, 1_000).unwrap();
        store.touch(new, 2_000).unwrap();

        let recent = store.list_recent(None);
        let ids: Vec<_> = recent.items.iter().map(|contact| contact.id).collect();
        assert_eq!(ids, vec![new, old]);
        assert_eq!(recent.applied_limit, 10);
    }

    #[test]
    fn retain_tags_reports_removed_and_touched_counts() {
        let node = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut store = ContactStore::new();
        store
            .insert(
                ContactDraft::new("A", "1"),
                vec![
                    CategoryTag::bare(Dimension::Work, node),
                    CategoryTag::bare(Dimension::Work, other),
                ],
            )
            .unwrap();
        store
            .insert(
                ContactDraft::new("B", "2"),
                vec![CategoryTag::bare(Dimension::Personal, node)],
            )
            .unwrap();

        let (removed, touched) = store.retain_tags(|tag| !tag.points_at(Dimension::Work, node));
        assert_eq!((removed, touched), (1, 1));
        assert_eq!(store.count_by_dimension(Dimension::Personal), 1);
        assert_eq!(store.list_by_category(Dimension::Work, other).len(), 1);
    }

    #[test]
    fn unknown_contact_is_not_found() {
        let mut store = ContactStore::new();
        let unknown = Uuid::new_v4();
        assert_eq!(
            store.toggle_favorite(unknown).unwrap_err(),
            StoreError::ContactNotFound(unknown)
        );
        assert_eq!(
            store.remove(unknown).unwrap_err(),
            StoreError::ContactNotFound(unknown)
        );
    }

    #[test]
    fn from_records_collapses_repeated_tags() {
        let node = Uuid::new_v4();
        let mut record = ContactRecord::from_draft(ContactDraft::new("Ann", "1")).unwrap();
        record.categories = vec![
            CategoryTag::new(Dimension::Work, node, vec!["first".to_string()]),
            CategoryTag::new(Dimension::Work, node, vec!["second".to_string()]),
            CategoryTag::bare(Dimension::Personal, node),
        ];

        let (store, collapsed) = ContactStore::from_records(vec![record.clone()]).unwrap();
        assert_eq!(collapsed, 1);
        let loaded = store.get(record.id).unwrap();
        assert_eq!(loaded.categories.len(), 2);
        assert_eq!(loaded.categories[0].path, vec!["first".to_string()]);
    }

    #[test]
    fn from_records_rejects_duplicate_contact_ids() {
        let record = ContactRecord::from_draft(ContactDraft::new("Ann", "1")).unwrap();
        let err = ContactStore::from_records(vec![record.clone(), record]).unwrap_err();
        assert!(err.starts_with("duplicate contact id"));
    }
}
