//! Persisted snapshot document.
//!
//! # Responsibility
//! - Define the flat structural document exchanged with storage.
//! - Encode/decode it as JSON.
//!
//! # Invariants
//! - Field names are camelCase and stable across releases.
//! - Decoding only checks shape; semantic checks run when the document is
//!   loaded into the coordinator.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::category::{CategoryNode, Dimension};
use crate::model::contact::ContactRecord;

/// Errors from snapshot encoding, decoding and semantic validation.
#[derive(Debug)]
pub enum SnapshotError {
    /// Document is not valid JSON for the snapshot shape.
    Json(serde_json::Error),
    /// Document decodes but breaks a model invariant.
    InvalidData(String),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "snapshot json error: {err}"),
            Self::InvalidData(message) => write!(f, "invalid snapshot data: {message}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Root-level forest of one dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDimension {
    pub tree: Vec<CategoryNode>,
}

/// Both dimension forests, keyed by dimension name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDimensions {
    #[serde(default)]
    pub work: CategoryDimension,
    #[serde(default)]
    pub personal: CategoryDimension,
}

impl CategoryDimensions {
    pub fn get(&self, dimension: Dimension) -> &CategoryDimension {
        match dimension {
            Dimension::Work => &self.work,
            Dimension::Personal => &self.personal,
        }
    }
}

/// Full persisted state of the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub category_dimensions: CategoryDimensions,
    #[serde(default)]
    pub contacts: Vec<ContactRecord>,
}

impl Snapshot {
    /// Encodes the document as compact JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Decodes a document from JSON.
    ///
    /// Category trees nest two JSON levels per tree level, so the decoder's
    /// default recursion limit is lifted.
    pub fn from_json(document: &str) -> Result<Self, SnapshotError> {
        let mut deserializer = serde_json::Deserializer::from_str(document);
        deserializer.disable_recursion_limit();
        let snapshot = Self::deserialize(&mut deserializer)?;
        deserializer.end()?;
        Ok(snapshot)
    }
}
