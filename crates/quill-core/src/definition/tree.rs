/*
 * definition/tree.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Arena-backed hierarchy of variable definitions.
 */

//! The definition tree.
//!
//! Definitions are edited as a hierarchy: interior nodes name key segments
//! and a leaf holds the value. The YAML document
//!
//! ```yaml
//! a:
//!   b: "1"
//! ```
//!
//! becomes `root -> a -> b -> "1"`, and the leaf `"1"` is reachable by the
//! path `a.b`. The root's own name never appears in a path.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Removing a node
//! detaches it (and its subtree) from the root; ids stay valid but the
//! detached nodes no longer take part in traversals.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::DefinitionMap;
use super::error::TreeError;
use crate::sigils::KEY_SEPARATOR;

/// Name given to the root node of a new tree.
pub const ROOT_NAME: &str = "definitions";

/// Index of a node within a [`DefinitionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(value: String, parent: Option<NodeId>) -> Self {
        Self {
            value,
            parent,
            children: Vec::new(),
        }
    }
}

/// How a search compares leaf values against the search text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// Raw value equals the text.
    Exact,
    /// Value contains the text, ignoring diacritics.
    Contains,
    /// Value contains the text, ignoring diacritics and case.
    ContainsNoCase,
    /// Value starts with the text, ignoring diacritics.
    StartsWith,
}

/// Hierarchy of definitions with a single designated root.
#[derive(Debug, Clone)]
pub struct DefinitionTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for DefinitionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionTree {
    pub fn new() -> Self {
        Self::with_root_name(ROOT_NAME)
    }

    pub fn with_root_name(name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::new(name.into(), None)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    /// The node's value.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    pub fn value(&self, id: NodeId) -> &str {
        &self.nodes[id.0].value
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].children.is_empty()
    }

    /// True when `id` was issued by this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// True when `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.is_root(id) || self.ancestors(id).any(|ancestor| ancestor == self.root)
    }

    /// Number of nodes reachable from the root, the root included.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[self.root.0].children.is_empty()
    }

    /// Nodes reachable from the root in document (pre-)order.
    pub fn iter(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![self.root],
        }
    }

    /// Leaves reachable from the root in document order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter(|&id| self.is_leaf(id))
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&node| self.parent(node))
    }

    fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(TreeError::InvalidNode(id))
        }
    }

    /// Append a new child under `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        value: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.check(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(value.into(), Some(parent)));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Create (or reuse) the key nodes along `path` and set its value leaf.
    ///
    /// Returns the value leaf.
    pub fn add_definition(
        &mut self,
        path: &str,
        value: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        let mut node = self.root;
        for segment in path.split(KEY_SEPARATOR) {
            let existing = self
                .children(node)
                .iter()
                .copied()
                .find(|&child| !self.is_leaf(child) && self.value(child) == segment);
            node = match existing {
                Some(child) => child,
                None => self.add_child(node, segment)?,
            };
        }

        let value = value.into();
        match self.children(node) {
            [leaf] if self.is_leaf(*leaf) => {
                let leaf = *leaf;
                self.set_value(leaf, value)?;
                Ok(leaf)
            }
            _ => self.add_child(node, value),
        }
    }

    /// Rename a key node or change a value leaf.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), TreeError> {
        self.check(id)?;
        self.nodes[id.0].value = value.into();
        Ok(())
    }

    /// Detach `id` and its subtree from its parent.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        if self.is_root(id) {
            return Err(TreeError::RootMutation("removed"));
        }
        let parent = self.nodes[id.0].parent.ok_or(TreeError::Detached(id))?;
        self.nodes[parent.0].children.retain(|&child| child != id);
        self.nodes[id.0].parent = None;
        Ok(())
    }

    /// Re-parent `id` as the last child of `target`.
    pub fn move_node(&mut self, id: NodeId, target: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        self.check(target)?;
        if self.is_root(id) {
            return Err(TreeError::RootMutation("moved"));
        }
        if target == id || self.ancestors(target).any(|ancestor| ancestor == id) {
            return Err(TreeError::CyclicMove { node: id, target });
        }

        if let Some(parent) = self.nodes[id.0].parent {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
        self.nodes[target.0].children.push(id);
        self.nodes[id.0].parent = Some(target);
        Ok(())
    }

    /// Dot-joined values from the top-level ancestor down to `id`.
    ///
    /// The root contributes nothing, so the root's own path is empty.
    pub fn to_path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_root(node) {
                break;
            }
            segments.push(self.value(node));
            current = self.parent(node);
        }
        segments.reverse();
        segments.join(&KEY_SEPARATOR.to_string())
    }

    /// The path a value leaf is known by: the path of its parent.
    ///
    /// Returns `None` for leaves directly beneath the root or detached.
    pub fn leaf_path(&self, leaf: NodeId) -> Option<String> {
        let parent = self.parent(leaf)?;
        if self.is_root(parent) {
            None
        } else {
            Some(self.to_path(parent))
        }
    }

    /// Key node at `path`, if any.
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        let mut node = self.root;
        for segment in path.split(KEY_SEPARATOR) {
            node = self
                .children(node)
                .iter()
                .copied()
                .filter(|&child| self.value(child) == segment)
                .find(|&child| !self.is_leaf(child))?;
        }
        Some(node)
    }

    /// Value stored under `path`, if the key node has exactly one leaf.
    pub fn get(&self, path: &str) -> Option<&str> {
        let node = self.find_path(path)?;
        match self.children(node) {
            [leaf] if self.is_leaf(*leaf) => Some(self.value(*leaf)),
            _ => None,
        }
    }

    /// Flatten to `path -> value`.
    ///
    /// Leaves are visited in document order, so when two leaves share a path
    /// the later one wins. Leaves hanging directly off the root have no path
    /// and are skipped.
    pub fn to_flat_map(&self) -> DefinitionMap {
        let mut map = DefinitionMap::new();
        let mut stack = vec![self.root];

        while let Some(node) = stack.pop() {
            if self.is_leaf(node) {
                if let Some(path) = self.leaf_path(node) {
                    map.insert(path, self.value(node).to_string());
                }
                continue;
            }
            stack.extend(self.children(node).iter().rev().copied());
        }

        map
    }

    /// First node, in pre-order, whose children mix leaves with branches or
    /// that holds more than one leaf.
    ///
    /// The root is exempt; leaves under the root are not examined. Returns
    /// `None` when the tree is well formed.
    pub fn is_well_formed(&self) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self
            .children(self.root)
            .iter()
            .rev()
            .copied()
            .filter(|&child| !self.is_leaf(child))
            .collect();

        while let Some(node) = stack.pop() {
            let children = self.children(node);
            let leaves = children.iter().filter(|&&child| self.is_leaf(child)).count();
            let branches = children.len() - leaves;

            let passes = (branches > 0 && leaves == 0) || (branches == 0 && leaves <= 1);
            if !passes {
                return Some(node);
            }

            stack.extend(
                children
                    .iter()
                    .rev()
                    .copied()
                    .filter(|&child| !self.is_leaf(child)),
            );
        }

        None
    }

    /// First leaf matching `text` under `mode`.
    ///
    /// Blank search text matches nothing.
    pub fn find_leaf(&self, text: &str, mode: SearchMode) -> Option<NodeId> {
        if text.trim().is_empty() {
            return None;
        }

        let needle = match mode {
            SearchMode::Exact => text.to_string(),
            SearchMode::Contains | SearchMode::StartsWith => strip_diacritics(text),
            SearchMode::ContainsNoCase => strip_diacritics(text).to_lowercase(),
        };

        let matches = |value: &str| match mode {
            SearchMode::Exact => value == needle,
            SearchMode::Contains => strip_diacritics(value).contains(&needle),
            SearchMode::ContainsNoCase => strip_diacritics(value).to_lowercase().contains(&needle),
            SearchMode::StartsWith => strip_diacritics(value).starts_with(&needle),
        };

        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            let children = self.children(node);
            for &child in children {
                if self.is_leaf(child) && matches(self.value(child)) {
                    return Some(child);
                }
            }
            stack.extend(
                children
                    .iter()
                    .rev()
                    .copied()
                    .filter(|&child| !self.is_leaf(child)),
            );
        }

        None
    }

    pub fn find_leaf_exact(&self, text: &str) -> Option<NodeId> {
        self.find_leaf(text, SearchMode::Exact)
    }

    pub fn find_leaf_contains(&self, text: &str) -> Option<NodeId> {
        self.find_leaf(text, SearchMode::Contains)
    }

    pub fn find_leaf_contains_no_case(&self, text: &str) -> Option<NodeId> {
        self.find_leaf(text, SearchMode::ContainsNoCase)
    }

    pub fn find_leaf_starts_with(&self, text: &str) -> Option<NodeId> {
        self.find_leaf(text, SearchMode::StartsWith)
    }
}

/// Pre-order traversal over the nodes reachable from the root.
pub struct Preorder<'a> {
    tree: &'a DefinitionTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(node).iter().rev().copied());
        Some(node)
    }
}

/// Canonical decomposition with combining marks removed.
fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|&c| !is_combining_mark(c)).collect()
}
