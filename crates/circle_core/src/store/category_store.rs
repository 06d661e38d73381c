//! Per-dimension category forests.
//!
//! # Responsibility
//! - Own the `work` and `personal` category trees.
//! - Provide insert/update/cascading-delete and depth-first lookups.
//!
//! # Invariants
//! - The forest is the authoritative structure for ordering; the id index
//!   is derived from it and always mirrors it.
//! - Ids are unique within a dimension; generated ids are unique across both.
//! - Traversals are depth-first pre-order.
//! - Deleting a node deletes its whole subtree; children are never re-parented.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::model::category::{CategoryDraft, CategoryId, CategoryNode, CategoryPatch, Dimension};
use crate::model::snapshot::{CategoryDimension, CategoryDimensions};
use crate::model::validation::normalize_category_name;
use crate::store::{StoreError, StoreResult};

/// Child-index chain from a root to a node, e.g. `[2, 0]` is the first child
/// of the third root.
type NodePath = Vec<usize>;

/// Flattened pre-order view of one node with its position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryEntry<'a> {
    pub node: &'a CategoryNode,
    /// Zero for roots.
    pub depth: usize,
    pub parent_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Forest {
    roots: Vec<CategoryNode>,
    index: HashMap<CategoryId, NodePath>,
}

impl Forest {
    fn from_roots(roots: Vec<CategoryNode>) -> Self {
        let mut forest = Self {
            roots,
            index: HashMap::new(),
        };
        forest.rebuild_index();
        forest
    }

    fn node(&self, id: CategoryId) -> Option<&CategoryNode> {
        let path = self.index.get(&id)?;
        resolve_path(&self.roots, path)
    }

    fn node_mut(&mut self, id: CategoryId) -> Option<&mut CategoryNode> {
        let path = self.index.get(&id)?;
        resolve_path_mut(&mut self.roots, path)
    }

    fn push_root(&mut self, node: CategoryNode) {
        let id = node.id;
        self.roots.push(node);
        self.index.insert(id, vec![self.roots.len() - 1]);
    }

    /// Appends `node` under `parent_id`. Returns `None` without mutating when
    /// the parent is unknown.
    fn push_child(&mut self, parent_id: CategoryId, node: CategoryNode) -> Option<()> {
        let id = node.id;
        let mut path = self.index.get(&parent_id)?.clone();
        let parent = resolve_path_mut(&mut self.roots, &path)?;
        parent.children.push(node);
        path.push(parent.children.len() - 1);
        self.index.insert(id, path);
        Some(())
    }

    /// Detaches the subtree rooted at `id`.
    fn remove(&mut self, id: CategoryId) -> Option<CategoryNode> {
        let path = self.index.get(&id)?.clone();
        let (position, parent_path) = path.split_last()?;
        let siblings = if parent_path.is_empty() {
            &mut self.roots
        } else {
            &mut resolve_path_mut(&mut self.roots, parent_path)?.children
        };
        if *position >= siblings.len() {
            return None;
        }
        let removed = siblings.remove(*position);
        // Later siblings shifted left, so their paths are stale.
        self.rebuild_index();
        Some(removed)
    }

    fn rebuild_index(&mut self) {
        let mut index = HashMap::with_capacity(self.index.len());
        let mut stack: Vec<(&CategoryNode, NodePath)> = self
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(position, root)| (root, vec![position]))
            .collect();
        while let Some((node, path)) = stack.pop() {
            for (position, child) in node.children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(position);
                stack.push((child, child_path));
            }
            index.insert(node.id, path);
        }
        self.index = index;
    }
}

fn resolve_path<'a>(roots: &'a [CategoryNode], path: &[usize]) -> Option<&'a CategoryNode> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get(*first)?;
    for position in rest {
        node = node.children.get(*position)?;
    }
    Some(node)
}

fn resolve_path_mut<'a>(
    roots: &'a mut [CategoryNode],
    path: &[usize],
) -> Option<&'a mut CategoryNode> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get_mut(*first)?;
    for position in rest {
        node = node.children.get_mut(*position)?;
    }
    Some(node)
}

/// Owner of both category forests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryStore {
    work: Forest,
    personal: Forest,
}

impl CategoryStore {
    /// Creates a store with two empty forests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted forests.
    ///
    /// # Errors
    /// - A node is filed under the wrong dimension.
    /// - An id repeats within one dimension.
    /// - A node name is blank.
    pub(crate) fn from_dimensions(dimensions: CategoryDimensions) -> Result<Self, String> {
        for dimension in Dimension::ALL {
            validate_forest(dimension, &dimensions.get(dimension).tree)?;
        }
        Ok(Self {
            work: Forest::from_roots(dimensions.work.tree),
            personal: Forest::from_roots(dimensions.personal.tree),
        })
    }

    /// Copies both forests into the snapshot shape.
    pub fn to_dimensions(&self) -> CategoryDimensions {
        CategoryDimensions {
            work: CategoryDimension {
                tree: self.work.roots.clone(),
            },
            personal: CategoryDimension {
                tree: self.personal.roots.clone(),
            },
        }
    }

    /// Root nodes of one dimension, in display order.
    pub fn dimension(&self, dimension: Dimension) -> &[CategoryNode] {
        &self.forest(dimension).roots
    }

    /// Looks up a node anywhere in the dimension's forest.
    pub fn find(&self, dimension: Dimension, id: CategoryId) -> Option<&CategoryNode> {
        self.forest(dimension).node(id)
    }

    pub fn contains(&self, dimension: Dimension, id: CategoryId) -> bool {
        self.forest(dimension).index.contains_key(&id)
    }

    /// Names from the root down to the node, inclusive.
    pub fn path_of(&self, dimension: Dimension, id: CategoryId) -> Option<Vec<String>> {
        let forest = self.forest(dimension);
        let path = forest.index.get(&id)?;
        let (first, rest) = path.split_first()?;
        let mut node = forest.roots.get(*first)?;
        let mut names = Vec::with_capacity(path.len());
        names.push(node.name.clone());
        for position in rest {
            node = node.children.get(*position)?;
            names.push(node.name.clone());
        }
        Some(names)
    }

    /// Ids of the node and its descendants, pre-order.
    pub fn subtree_ids(&self, dimension: Dimension, id: CategoryId) -> Option<Vec<CategoryId>> {
        self.find(dimension, id).map(CategoryNode::subtree_ids)
    }

    /// Every id in the dimension, pre-order.
    pub fn all_ids(&self, dimension: Dimension) -> Vec<CategoryId> {
        self.dimension(dimension)
            .iter()
            .flat_map(CategoryNode::subtree_ids)
            .collect()
    }

    /// Pre-order flattened view with depth and parent id.
    pub fn entries(&self, dimension: Dimension) -> Vec<CategoryEntry<'_>> {
        let mut entries = Vec::with_capacity(self.len(dimension));
        let mut stack: Vec<CategoryEntry<'_>> = self
            .dimension(dimension)
            .iter()
            .rev()
            .map(|node| CategoryEntry {
                node,
                depth: 0,
                parent_id: None,
            })
            .collect();
        while let Some(entry) = stack.pop() {
            stack.extend(entry.node.children.iter().rev().map(|child| CategoryEntry {
                node: child,
                depth: entry.depth + 1,
                parent_id: Some(entry.node.id),
            }));
            entries.push(entry);
        }
        entries
    }

    /// Number of nodes in the dimension.
    pub fn len(&self, dimension: Dimension) -> usize {
        self.forest(dimension).index.len()
    }

    pub fn is_empty(&self, dimension: Dimension) -> bool {
        self.len(dimension) == 0
    }

    /// Appends a new node as a root or as the last child of `parent_id`.
    pub(crate) fn add_category(
        &mut self,
        dimension: Dimension,
        parent_id: Option<CategoryId>,
        draft: &CategoryDraft,
    ) -> StoreResult<CategoryId> {
        let name = normalize_category_name(&draft.name)?;
        let id = self.fresh_id();
        let node = CategoryNode::new(id, dimension, name, draft.color);
        let forest = self.forest_mut(dimension);
        match parent_id {
            None => forest.push_root(node),
            Some(parent_id) => forest.push_child(parent_id, node).ok_or(
                StoreError::CategoryNotFound {
                    dimension,
                    id: parent_id,
                },
            )?,
        }
        Ok(id)
    }

    /// Mutates name and/or color in place. Identity and children are kept.
    pub(crate) fn update_category(
        &mut self,
        dimension: Dimension,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> StoreResult<()> {
        let name = patch
            .name
            .as_deref()
            .map(normalize_category_name)
            .transpose()?;
        let node = self
            .forest_mut(dimension)
            .node_mut(id)
            .ok_or(StoreError::CategoryNotFound { dimension, id })?;
        if let Some(name) = name {
            node.name = name;
        }
        if let Some(color) = patch.color {
            node.color = color;
        }
        Ok(())
    }

    /// Removes the node and its subtree; returns every removed id, pre-order.
    pub(crate) fn delete_category(
        &mut self,
        dimension: Dimension,
        id: CategoryId,
    ) -> StoreResult<Vec<CategoryId>> {
        let removed = self
            .forest_mut(dimension)
            .remove(id)
            .ok_or(StoreError::CategoryNotFound { dimension, id })?;
        Ok(removed.subtree_ids())
    }

    fn fresh_id(&self) -> CategoryId {
        loop {
            let candidate = Uuid::new_v4();
            if !self.work.index.contains_key(&candidate)
                && !self.personal.index.contains_key(&candidate)
            {
                return candidate;
            }
        }
    }

    fn forest(&self, dimension: Dimension) -> &Forest {
        match dimension {
            Dimension::Work => &self.work,
            Dimension::Personal => &self.personal,
        }
    }

    fn forest_mut(&mut self, dimension: Dimension) -> &mut Forest {
        match dimension {
            Dimension::Work => &mut self.work,
            Dimension::Personal => &mut self.personal,
        }
    }
}

fn validate_forest(dimension: Dimension, roots: &[CategoryNode]) -> Result<(), String> {
    let mut seen = HashSet::new();
    let mut stack: Vec<&CategoryNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if node.dimension != dimension {
            return Err(format!(
                "category {} is filed under {} but declares {}",
                node.id,
                dimension.as_str(),
                node.dimension.as_str()
            ));
        }
        if !seen.insert(node.id) {
            return Err(format!(
                "duplicate category id {} in {}",
                node.id,
                dimension.as_str()
            ));
        }
        if node.name.trim().is_empty() {
            return Err(format!("category {} has a blank name", node.id));
        }
        stack.extend(node.children.iter().rev());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::CategoryStore;
    use crate::model::category::{CategoryDraft, CategoryPatch, ColorKey, Dimension};
    use crate::model::validation::ValidationError;
    use crate::store::StoreError;
    use uuid::Uuid;

    fn draft(name: &str) -> CategoryDraft {
        CategoryDraft::new(name, ColorKey::Blue)
    }

    #[test]
    fn index_survives_deleting_an_earlier_sibling() {
        let mut store = CategoryStore::new();
        let first = store.add_category(Dimension::Work, None, &draft("First")).unwrap();
        let second = store.add_category(Dimension::Work, None, &draft("Second")).unwrap();
        let nested = store
            .add_category(Dimension::Work, Some(second), &draft("Nested"))
            .unwrap();

        store.delete_category(Dimension::Work, first).unwrap();

        assert_eq!(store.find(Dimension::Work, second).unwrap().name, "Second");
        assert_eq!(
            store.path_of(Dimension::Work, nested).unwrap(),
            vec!["Second".to_string(), "Nested".to_string()]
        );
        store
            .update_category(Dimension::Work, nested, &CategoryPatch::rename("Deep"))
            .unwrap();
        assert_eq!(store.find(Dimension::Work, nested).unwrap().name, "Deep");
    }

    #[test]
    fn dimensions_are_separate_namespaces() {
        let mut store = CategoryStore::new();
        let work = store.add_category(Dimension::Work, None, &draft("Eng")).unwrap();

        assert!(store.contains(Dimension::Work, work));
        assert!(!store.contains(Dimension::Personal, work));
        let err = store
            .add_category(Dimension::Personal, Some(work), &draft("Child"))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::CategoryNotFound {
                dimension: Dimension::Personal,
                id: work
            }
        );
        assert!(store.is_empty(Dimension::Personal));
    }

    #[test]
    fn entries_report_depth_and_parent() {
        let mut store = CategoryStore::new();
        let root = store.add_category(Dimension::Personal, None, &draft("Family")).unwrap();
        let child = store
            .add_category(Dimension::Personal, Some(root), &draft("Cousins"))
            .unwrap();

        let entries = store.entries(Dimension::Personal);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].node.id, root);
        assert_eq!(entries[0].depth, 0);
        assert_eq!(entries[1].node.id, child);
        assert_eq!(entries[1].depth, 1);
        assert_eq!(entries[1].parent_id, Some(root));
    }

    #[test]
    fn blank_rename_is_rejected_without_mutation() {
        let mut store = CategoryStore::new();
        let id = store.add_category(Dimension::Work, None, &draft("Eng")).unwrap();
        let before = store.clone();

        let err = store
            .update_category(Dimension::Work, id, &CategoryPatch::rename("   "))
            .unwrap_err();
        assert_eq!(err, StoreError::Validation(ValidationError::BlankCategoryName));
        assert_eq!(store, before);
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let mut store = CategoryStore::new();
        store.add_category(Dimension::Work, None, &draft("Eng")).unwrap();
        let before = store.clone();
        let unknown = Uuid::new_v4();

        let err = store.delete_category(Dimension::Work, unknown).unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound { id, .. } if id == unknown));
        assert_eq!(store, before);
    }

    #[test]
    fn deep_chain_is_indexed_listed_and_removed() {
        let depth = 1_000;
        let mut store = CategoryStore::new();
        let mut ids = Vec::with_capacity(depth);
        let mut parent = None;
        for level in 0..depth {
            let id = store
                .add_category(Dimension::Personal, parent, &draft(&format!("n{level}")))
                .unwrap();
            ids.push(id);
            parent = Some(id);
        }

        let deepest = ids[depth - 1];
        assert_eq!(store.path_of(Dimension::Personal, deepest).unwrap().len(), depth);
        let entries = store.entries(Dimension::Personal);
        assert_eq!(entries.len(), depth);
        assert_eq!(entries[depth - 1].depth, depth - 1);
        assert_eq!(entries[depth - 1].parent_id, Some(ids[depth - 2]));

        let removed = store.delete_category(Dimension::Personal, ids[1]).unwrap();
        assert_eq!(removed, ids[1..].to_vec());
        assert_eq!(store.len(Dimension::Personal), 1);
    }
}
