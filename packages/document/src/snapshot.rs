//! # Tree Snapshots
//!
//! A snapshot is the immutable state of the whole document at one point in
//! history. Node records are reference counted, so consecutive snapshots share
//! every node a transaction did not touch.
//!
//! ```text
//! root
//!  ├─ paragraph ─ text "Hello"
//!  └─ details
//!       └─ heading(h2) ─ text "World"
//! ```

use crate::error::{TreeError, TreeResult};
use crate::key::{KeyGenerator, NodeKey};
use crate::node::{Node, NodeKind, NodeTemplate};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub type NodeMap = HashMap<NodeKey, Arc<Node>>;

/// Immutable document tree
#[derive(Debug, Clone)]
pub struct Snapshot {
    version: u64,
    root: NodeKey,
    nodes: Arc<NodeMap>,
}

impl Snapshot {
    /// Build a snapshot from key-less templates (version 0)
    pub fn create(root_children: Vec<NodeTemplate>, keys: &mut KeyGenerator) -> TreeResult<Self> {
        let root_key = NodeKey::root();
        let mut nodes = NodeMap::new();
        let mut root = Node::new(root_key.clone(), None, NodeKind::Root);

        for template in root_children {
            let child = insert_template(&mut nodes, &root_key, template, keys)?;
            root.children.push(child);
        }
        nodes.insert(root_key, Arc::new(root));

        Self::from_parts(0, nodes)
    }

    /// A document holding one empty paragraph
    pub fn empty(keys: &mut KeyGenerator) -> Self {
        let root_key = NodeKey::root();
        let paragraph_key = keys.next_key();

        let mut root = Node::new(root_key.clone(), None, NodeKind::Root);
        root.children.push(paragraph_key.clone());
        let paragraph = Node::new(paragraph_key.clone(), Some(root_key.clone()), NodeKind::Paragraph);

        let mut nodes = NodeMap::new();
        nodes.insert(root_key.clone(), Arc::new(root));
        nodes.insert(paragraph_key, Arc::new(paragraph));

        Self {
            version: 0,
            root: root_key,
            nodes: Arc::new(nodes),
        }
    }

    /// Assemble a snapshot from a node map, checking every tree invariant
    pub fn from_parts(version: u64, nodes: NodeMap) -> TreeResult<Self> {
        let snapshot = Self {
            version,
            root: NodeKey::root(),
            nodes: Arc::new(nodes),
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn root_key(&self) -> &NodeKey {
        &self.root
    }

    pub fn root(&self) -> &Node {
        // from_parts/create/empty guarantee the root record exists
        &self.nodes[&self.root]
    }

    /// Raw node records, for building the next snapshot
    pub fn node_map(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root().children.is_empty()
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn get_node(&self, key: &NodeKey) -> Option<&Node> {
        self.nodes.get(key).map(Arc::as_ref)
    }

    pub fn get_parent(&self, key: &NodeKey) -> Option<&Node> {
        let node = self.get_node(key)?;
        node.parent.as_ref().and_then(|parent| self.get_node(parent))
    }

    pub fn get_children(&self, key: &NodeKey) -> Vec<&Node> {
        self.get_node(key)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|child| self.get_node(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Nearest ancestor-or-self whose parent is the root
    pub fn top_level_ancestor(&self, key: &NodeKey) -> Option<&Node> {
        let mut current = self.get_node(key)?;
        loop {
            match &current.parent {
                None => return None,
                Some(parent) if *parent == self.root => return Some(current),
                Some(parent) => current = self.get_node(parent)?,
            }
        }
    }

    /// Parents of `key`, nearest first, ending with the root
    pub fn ancestors<'a>(&'a self, key: &NodeKey) -> Ancestors<'a> {
        Ancestors {
            snapshot: self,
            next: self.get_parent(key),
        }
    }

    pub fn is_ancestor(&self, ancestor: &NodeKey, of: &NodeKey) -> bool {
        self.ancestors(of).any(|node| &node.key == ancestor)
    }

    pub fn index_in_parent(&self, key: &NodeKey) -> Option<usize> {
        let parent = self.get_parent(key)?;
        parent.children.iter().position(|child| child == key)
    }

    /// Child-index path from the root; ordering paths gives document order
    pub fn path(&self, key: &NodeKey) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = self.get_node(key)?;
        while let Some(parent_key) = &current.parent {
            let parent = self.get_node(parent_key)?;
            path.push(parent.children.iter().position(|c| c == &current.key)?);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    pub fn node_at_path(&self, path: &[usize]) -> Option<&Node> {
        let mut current = self.root();
        for index in path {
            current = self.get_node(current.children.get(*index)?)?;
        }
        Some(current)
    }

    /// Compare two nodes by document (pre-order) position
    pub fn compare_order(&self, a: &NodeKey, b: &NodeKey) -> Option<Ordering> {
        Some(self.path(a)?.cmp(&self.path(b)?))
    }

    /// Pre-order successor of `key`
    pub fn next_in_order(&self, key: &NodeKey) -> Option<&Node> {
        let node = self.get_node(key)?;
        if let Some(first) = node.children.first() {
            return self.get_node(first);
        }
        self.next_after_subtree(key)
    }

    /// First node after the whole subtree of `key`
    pub fn next_after_subtree(&self, key: &NodeKey) -> Option<&Node> {
        let mut current = self.get_node(key)?;
        loop {
            let parent = self.get_node(current.parent.as_ref()?)?;
            let index = parent.children.iter().position(|c| c == &current.key)?;
            if let Some(sibling) = parent.children.get(index + 1) {
                return self.get_node(sibling);
            }
            current = parent;
        }
    }

    /// Every node except the root, in document order
    pub fn document_order(&self) -> DocumentOrder<'_> {
        DocumentOrder {
            snapshot: self,
            next: self.next_in_order(&self.root),
        }
    }

    pub fn first_leaf(&self, key: &NodeKey) -> Option<&Node> {
        let mut current = self.get_node(key)?;
        while let Some(first) = current.children.first() {
            current = self.get_node(first)?;
        }
        Some(current)
    }

    pub fn last_leaf(&self, key: &NodeKey) -> Option<&Node> {
        let mut current = self.get_node(key)?;
        while let Some(last) = current.children.last() {
            current = self.get_node(last)?;
        }
        Some(current)
    }

    /// Concatenated text of every text node under `key`
    pub fn text_content(&self, key: &NodeKey) -> String {
        let mut out = String::new();
        self.collect_text(key, &mut out);
        out
    }

    fn collect_text(&self, key: &NodeKey, out: &mut String) {
        if let Some(node) = self.get_node(key) {
            out.push_str(node.text());
            for child in &node.children {
                self.collect_text(child, out);
            }
        }
    }

    /// Check every tree invariant
    pub fn validate(&self) -> TreeResult<()> {
        let root = self
            .nodes
            .get(&self.root)
            .ok_or_else(|| TreeError::NodeNotFound(self.root.clone()))?;
        if !root.is_root() {
            return Err(TreeError::KindMismatch {
                from: root.kind.name(),
                to: "root",
            });
        }
        if root.parent.is_some() {
            return Err(TreeError::RootImmutable("parented"));
        }

        let mut visited: HashSet<&NodeKey> = HashSet::with_capacity(self.nodes.len());
        visited.insert(&self.root);
        let mut stack = vec![root.as_ref()];

        while let Some(node) = stack.pop() {
            if node.kind.is_leaf() && !node.children.is_empty() {
                return Err(TreeError::NotAContainer(node.key.clone()));
            }
            if let NodeKind::Text { format, .. } = &node.kind {
                if !format.is_consistent() {
                    return Err(TreeError::InconsistentFormat(node.key.clone()));
                }
            }

            let mut seen = HashSet::with_capacity(node.children.len());
            for child_key in &node.children {
                if !seen.insert(child_key) {
                    return Err(TreeError::DuplicateChild {
                        parent: node.key.clone(),
                        child: child_key.clone(),
                    });
                }
                let child = self
                    .nodes
                    .get(child_key)
                    .ok_or_else(|| TreeError::NodeNotFound(child_key.clone()))?;
                if child.is_root() {
                    return Err(TreeError::RootImmutable("nested"));
                }
                if child.parent.as_ref() != Some(&node.key) {
                    return Err(TreeError::ParentMismatch {
                        child: child_key.clone(),
                        claimed: child.parent.clone(),
                        actual: node.key.clone(),
                    });
                }
                if !visited.insert(child_key) {
                    return Err(TreeError::CycleDetected {
                        node: child_key.clone(),
                        parent: node.key.clone(),
                    });
                }
                stack.push(child.as_ref());
            }
        }

        if visited.len() != self.nodes.len() {
            let orphan = self
                .nodes
                .keys()
                .filter(|key| !visited.contains(key))
                .min()
                .cloned();
            if let Some(orphan) = orphan {
                return Err(TreeError::Unreachable(orphan));
            }
        }

        Ok(())
    }

    /// Rebuild the key-less template of a subtree
    pub fn to_template(&self, key: &NodeKey) -> Option<NodeTemplate> {
        let node = self.get_node(key)?;
        let children = node
            .children
            .iter()
            .filter_map(|child| self.to_template(child))
            .collect();
        Some(NodeTemplate::new(node.kind.clone(), children))
    }

    /// Templates of every top-level block
    pub fn to_templates(&self) -> Vec<NodeTemplate> {
        self.root()
            .children
            .iter()
            .filter_map(|child| self.to_template(child))
            .collect()
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.root == other.root
            && (Arc::ptr_eq(&self.nodes, &other.nodes) || self.nodes == other.nodes)
    }
}

/// Insert a template subtree below `parent`, returning the new subtree key
pub fn insert_template(
    nodes: &mut NodeMap,
    parent: &NodeKey,
    template: NodeTemplate,
    keys: &mut KeyGenerator,
) -> TreeResult<NodeKey> {
    let key = keys.next_key();
    if template.kind.is_leaf() && !template.children.is_empty() {
        return Err(TreeError::NotAContainer(key));
    }
    if matches!(template.kind, NodeKind::Root) {
        return Err(TreeError::RootImmutable("nested"));
    }

    let mut node = Node::new(key.clone(), Some(parent.clone()), template.kind);
    for child in template.children {
        let child_key = insert_template(nodes, &key, child, keys)?;
        node.children.push(child_key);
    }
    nodes.insert(key.clone(), Arc::new(node));
    Ok(key)
}

/// Parent chain iterator
pub struct Ancestors<'a> {
    snapshot: &'a Snapshot,
    next: Option<&'a Node>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current
            .parent
            .as_ref()
            .and_then(|parent| self.snapshot.get_node(parent));
        Some(current)
    }
}

/// Pre-order iterator over the document
#[derive(Clone)]
pub struct DocumentOrder<'a> {
    snapshot: &'a Snapshot,
    next: Option<&'a Node>,
}

impl<'a> Iterator for DocumentOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.snapshot.next_in_order(&current.key);
        Some(current)
    }
}

#[derive(Serialize)]
struct TreeView<'a> {
    key: &'a NodeKey,
    #[serde(flatten)]
    kind: &'a NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeView<'a>>,
}

fn tree_view<'a>(snapshot: &'a Snapshot, node: &'a Node) -> TreeView<'a> {
    TreeView {
        key: &node.key,
        kind: &node.kind,
        children: node
            .children
            .iter()
            .filter_map(|child| snapshot.get_node(child))
            .map(|child| tree_view(snapshot, child))
            .collect(),
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Snapshot", 2)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("root", &tree_view(self, self.root()))?;
        state.end()
    }
}
