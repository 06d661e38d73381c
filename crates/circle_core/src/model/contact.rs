//! Contact record model and category tags.
//!
//! # Responsibility
//! - Define `ContactRecord` and the `CategoryTag` references it holds.
//! - Provide validation and tag de-duplication helpers.
//!
//! # Invariants
//! - `name` and `phone` are non-empty after normalization.
//! - `relationship` is within `1..=5`.
//! - A `(dim, node_id)` pair appears at most once in `categories`.
//! - `CategoryTag::path` is display data and may be stale.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::model::category::{CategoryId, Dimension};
use crate::model::validation::{
    normalize_contact_name, normalize_phone, validate_relationship, ValidationError,
};

/// Stable contact identifier.
pub type ContactId = Uuid;

/// Relationship rating assigned when the caller does not choose one.
pub const DEFAULT_RELATIONSHIP: u8 = 3;

/// Externally driven availability shown next to a contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Online,
    Busy,
    #[default]
    Offline,
}

impl Presence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }

    /// Parses a presence key; unknown values fall back to `Offline`.
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "online" => Self::Online,
            "busy" => Self::Busy,
            _ => Self::Offline,
        }
    }
}

/// Contact-held reference to one category node.
///
/// Identity is `(dim, node_id)`. `path` is the root-to-node name chain as it
/// was when the tag was last refreshed; it never keeps the node alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTag {
    pub dim: Dimension,
    pub node_id: CategoryId,
    #[serde(default)]
    pub path: Vec<String>,
}

impl CategoryTag {
    pub fn new(dim: Dimension, node_id: CategoryId, path: Vec<String>) -> Self {
        Self { dim, node_id, path }
    }

    /// Tag without a display path; the coordinator fills it from the tree.
    pub fn bare(dim: Dimension, node_id: CategoryId) -> Self {
        Self::new(dim, node_id, Vec::new())
    }

    /// Identity key used for de-duplication and matching.
    pub fn key(&self) -> (Dimension, CategoryId) {
        (self.dim, self.node_id)
    }

    /// Returns whether this tag denotes exactly `(dim, node_id)`.
    pub fn points_at(&self, dim: Dimension, node_id: CategoryId) -> bool {
        self.dim == dim && self.node_id == node_id
    }

    /// Path joined for single-line display, e.g. `Engineering / Backend`.
    pub fn display_path(&self) -> String {
        self.path.join(" / ")
    }
}

/// Canonical contact entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    /// Free-form location label; geolocation lives outside core.
    #[serde(default)]
    pub location: String,
    /// Free-form status line.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub presence: Presence,
    pub relationship: u8,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub categories: Vec<CategoryTag>,
    /// Unix epoch milliseconds of the last interaction.
    #[serde(default)]
    pub last_contact: Option<i64>,
}

impl ContactRecord {
    /// Builds a validated record with a fresh id from draft input.
    ///
    /// Tags are de-duplicated but not resolved; resolution against the
    /// category tree is the coordinator's job.
    pub fn from_draft(draft: ContactDraft) -> Result<Self, ValidationError> {
        let record = Self {
            id: Uuid::new_v4(),
            name: normalize_contact_name(&draft.name)?,
            phone: normalize_phone(&draft.phone)?,
            location: draft.location.trim().to_string(),
            status: draft.status.trim().to_string(),
            presence: Presence::Offline,
            relationship: validate_relationship(draft.relationship)?,
            is_favorite: draft.is_favorite,
            categories: dedup_tags(draft.categories),
            last_contact: None,
        };
        Ok(record)
    }

    /// Checks field invariants of an existing record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankContactName);
        }
        if self.phone.trim().is_empty() {
            return Err(ValidationError::BlankPhone);
        }
        validate_relationship(self.relationship)?;
        Ok(())
    }

    /// Returns whether the contact carries the exact `(dim, node_id)` tag.
    pub fn has_tag(&self, dim: Dimension, node_id: CategoryId) -> bool {
        self.categories.iter().any(|tag| tag.points_at(dim, node_id))
    }

    /// Returns whether the contact carries any tag in `dim`.
    pub fn has_dimension(&self, dim: Dimension) -> bool {
        self.categories.iter().any(|tag| tag.dim == dim)
    }

    /// Applies a profile patch, validating every supplied field.
    ///
    /// On error the record is left unchanged.
    pub fn apply_patch(&mut self, patch: &ContactPatch) -> Result<(), ValidationError> {
        let name = patch
            .name
            .as_deref()
            .map(normalize_contact_name)
            .transpose()?;
        let phone = patch.phone.as_deref().map(normalize_phone).transpose()?;
        let relationship = patch.relationship.map(validate_relationship).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(phone) = phone {
            self.phone = phone;
        }
        if let Some(location) = patch.location.as_deref() {
            self.location = location.trim().to_string();
        }
        if let Some(status) = patch.status.as_deref() {
            self.status = status.trim().to_string();
        }
        if let Some(relationship) = relationship {
            self.relationship = relationship;
        }
        Ok(())
    }
}

/// Input for creating a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub phone: String,
    pub location: String,
    pub status: String,
    pub relationship: u8,
    pub is_favorite: bool,
    /// Requested tags. Paths supplied here are replaced by the tree's names.
    pub categories: Vec<CategoryTag>,
}

impl ContactDraft {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            location: String::new(),
            status: String::new(),
            relationship: DEFAULT_RELATIONSHIP,
            is_favorite: false,
            categories: Vec::new(),
        }
    }

    /// Adds one requested tag.
    pub fn with_tag(mut self, dim: Dimension, node_id: CategoryId) -> Self {
        self.categories.push(CategoryTag::bare(dim, node_id));
        self
    }
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub relationship: Option<u8>,
}

/// Removes duplicate `(dim, node_id)` tags, keeping the first occurrence.
pub fn dedup_tags(tags: Vec<CategoryTag>) -> Vec<CategoryTag> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.key()))
        .collect()
}
