//! Category tree node model.
//!
//! # Responsibility
//! - Define the two category dimensions and the color palette.
//! - Define `CategoryNode`, the owned tree node used by both forests.
//!
//! # Invariants
//! - `id` and `dimension` never change after creation.
//! - `children` are owned by value; a node never refers to an ancestor, so
//!   trees cannot contain cycles.
//! - Display order of children is insertion order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::validation::ValidationError;

/// Stable category node identifier.
pub type CategoryId = Uuid;

/// Independent category namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Professional relationships.
    Work,
    /// Private relationships.
    Personal,
}

impl Dimension {
    /// Both dimensions, in display order.
    pub const ALL: [Dimension; 2] = [Dimension::Work, Dimension::Personal];

    /// Stable string key used in snapshots and at the FFI boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
        }
    }

    /// Parses a dimension key, case-insensitive.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(Self::Work),
            "personal" => Ok(Self::Personal),
            _ => Err(ValidationError::UnknownDimension(value.trim().to_string())),
        }
    }
}

/// Fixed color palette for category chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorKey {
    Blue,
    Green,
    Red,
    Orange,
    Purple,
    Pink,
    Teal,
    Yellow,
    Gray,
}

impl ColorKey {
    /// Every palette entry, in picker order.
    pub const ALL: [ColorKey; 9] = [
        ColorKey::Blue,
        ColorKey::Green,
        ColorKey::Red,
        ColorKey::Orange,
        ColorKey::Purple,
        ColorKey::Pink,
        ColorKey::Teal,
        ColorKey::Yellow,
        ColorKey::Gray,
    ];

    /// Stable string key used in snapshots and at the FFI boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Teal => "teal",
            Self::Yellow => "yellow",
            Self::Gray => "gray",
        }
    }

    /// Parses a palette key, case-insensitive.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownColor(value.trim().to_string()))
    }
}

/// One entry in a dimension's category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    /// Stable id, unique across both dimensions when generated by the store.
    pub id: CategoryId,
    /// User-facing label, normalized and non-empty.
    pub name: String,
    /// Palette key for display.
    pub color: ColorKey,
    /// Owning dimension; fixed at creation.
    pub dimension: Dimension,
    /// Ordered owned children. Empty for leaves.
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub(crate) fn new(
        id: CategoryId,
        dimension: Dimension,
        name: String,
        color: ColorKey,
    ) -> Self {
        Self {
            id,
            name,
            color,
            dimension,
            children: Vec::new(),
        }
    }

    /// Returns whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes below this one, at any depth.
    pub fn descendant_count(&self) -> usize {
        self.pre_order().count() - 1
    }

    /// Ids of this node and all descendants, depth-first pre-order.
    pub fn subtree_ids(&self) -> Vec<CategoryId> {
        self.pre_order().map(|node| node.id).collect()
    }

    /// Walks this node and its descendants depth-first, pre-order.
    ///
    /// Uses an explicit stack so arbitrarily deep chains stay off the call
    /// stack.
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }
}

/// Pre-order iterator returned by [`CategoryNode::pre_order`].
#[derive(Debug, Clone)]
pub struct PreOrder<'a> {
    stack: Vec<&'a CategoryNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a CategoryNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub color: ColorKey,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>, color: ColorKey) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Partial update for a category. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<ColorKey>,
}

impl CategoryPatch {
    /// Patch that only renames.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            color: None,
        }
    }

    /// Patch that only recolors.
    pub fn recolor(color: ColorKey) -> Self {
        Self {
            name: None,
            color: Some(color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CategoryNode, ColorKey, Dimension};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    fn node(name: &str) -> CategoryNode {
        CategoryNode::new(Uuid::new_v4(), Dimension::Work, name.to_string(), ColorKey::Blue)
    }

    #[test]
    fn dimension_parse_accepts_mixed_case() {
        assert_eq!(Dimension::parse(" Work ").unwrap(), Dimension::Work);
        assert_eq!(Dimension::parse("PERSONAL").unwrap(), Dimension::Personal);
        assert_eq!(
            Dimension::parse("family").unwrap_err(),
            ValidationError::UnknownDimension("family".to_string())
        );
    }

    #[test]
    fn color_keys_round_trip_through_strings() {
        for color in ColorKey::ALL {
            assert_eq!(ColorKey::parse(color.as_str()).unwrap(), color);
        }
        assert!(ColorKey::parse("magenta").is_err());
    }

    #[test]
    fn subtree_ids_are_pre_order() {
        let mut root = node("root");
        let mut left = node("left");
        let left_leaf = node("left-leaf");
        let right = node("right");
        let expected = vec![root.id, left.id, left_leaf.id, right.id];
        left.children.push(left_leaf);
        root.children.push(left);
        root.children.push(right);

        assert_eq!(root.subtree_ids(), expected);
        assert_eq!(root.descendant_count(), 3);
        assert!(!root.is_leaf());
    }
}
