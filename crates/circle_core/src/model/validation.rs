//! Field validation and normalization shared by categories and contacts.
//!
//! # Invariants
//! - Normalized names are trimmed and have single-space separators.
//! - Relationship ratings are within `RELATIONSHIP_MIN..=RELATIONSHIP_MAX`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Lowest accepted relationship-strength rating.
pub const RELATIONSHIP_MIN: u8 = 1;
/// Highest accepted relationship-strength rating.
pub const RELATIONSHIP_MAX: u8 = 5;

/// Rejection reasons for user-supplied fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Category name is blank after trim.
    BlankCategoryName,
    /// Contact name is blank after trim.
    BlankContactName,
    /// Contact phone is blank after trim.
    BlankPhone,
    /// Relationship rating outside `1..=5`.
    RelationshipOutOfRange(u8),
    /// Dimension key is not `work` or `personal`.
    UnknownDimension(String),
    /// Color key is not part of the palette.
    UnknownColor(String),
    /// Id text is not a UUID.
    InvalidId(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankCategoryName => write!(f, "category name must not be blank"),
            Self::BlankContactName => write!(f, "contact name must not be blank"),
            Self::BlankPhone => write!(f, "contact phone must not be blank"),
            Self::RelationshipOutOfRange(value) => write!(
                f,
                "relationship must be within {RELATIONSHIP_MIN}..={RELATIONSHIP_MAX}, got {value}"
            ),
            Self::UnknownDimension(value) => {
                write!(f, "unknown dimension `{value}`; expected work|personal")
            }
            Self::UnknownColor(value) => write!(f, "unknown color key `{value}`"),
            Self::InvalidId(value) => write!(f, "invalid id `{value}`"),
        }
    }
}

impl Error for ValidationError {}

/// Trims and collapses internal whitespace runs to one space.
pub fn collapse_whitespace(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}

/// Normalizes a category display name, rejecting blank input.
pub fn normalize_category_name(value: &str) -> Result<String, ValidationError> {
    let normalized = collapse_whitespace(value);
    if normalized.is_empty() {
        return Err(ValidationError::BlankCategoryName);
    }
    Ok(normalized)
}

/// Normalizes a contact display name, rejecting blank input.
pub fn normalize_contact_name(value: &str) -> Result<String, ValidationError> {
    let normalized = collapse_whitespace(value);
    if normalized.is_empty() {
        return Err(ValidationError::BlankContactName);
    }
    Ok(normalized)
}

/// Trims a phone number, rejecting blank input.
///
/// Formatting is kept as entered; dialing rules belong to the host.
pub fn normalize_phone(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankPhone);
    }
    Ok(trimmed.to_string())
}

/// Checks a relationship-strength rating.
pub fn validate_relationship(value: u8) -> Result<u8, ValidationError> {
    if (RELATIONSHIP_MIN..=RELATIONSHIP_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::RelationshipOutOfRange(value))
    }
}
