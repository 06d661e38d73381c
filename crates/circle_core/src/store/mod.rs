//! In-memory stores for categories and contacts.
//!
//! # Responsibility
//! - Own the per-dimension category forests and the contact collection.
//! - Expose read queries publicly; keep mutators crate-private so every
//!   write goes through `AssociationCoordinator`.
//!
//! # Invariants
//! - A failed operation leaves the store unchanged.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::category::{CategoryId, Dimension};
use crate::model::contact::ContactId;
use crate::model::validation::ValidationError;

pub mod category_store;
pub mod contact_store;

/// Result type used by store and coordinator operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Category id does not resolve in the given dimension.
    CategoryNotFound {
        dimension: Dimension,
        id: CategoryId,
    },
    /// Contact id does not resolve.
    ContactNotFound(ContactId),
    /// Input rejected by field validation.
    Validation(ValidationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CategoryNotFound { dimension, id } => {
                write!(f, "category not found in {}: {id}", dimension.as_str())
            }
            Self::ContactNotFound(id) => write!(f, "contact not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
