//! # Update Transaction Engine
//!
//! A [`Transaction`] edits a private working copy of one base snapshot. Node
//! records are shared with the base until first touched (`Arc::make_mut`), so
//! a commit only allocates what actually changed.
//!
//! ## Atomicity
//!
//! ```text
//! base ──▶ working copy ──f(tx)──▶ validate ──▶ new snapshot (version + 1)
//!            │                        │
//!            └── Err ─────────────────┴──▶ base untouched, error returned
//! ```
//!
//! Nothing a transaction does is observable until [`run_update`] returns
//! `Ok`.

use crate::errors::MutationError;
use crate::selection::{reconcile, sanitize, Selection};
use folio_document::{
    insert_template, KeyGenerator, Node, NodeKey, NodeKind, NodeMap, NodeTemplate, Snapshot,
    TextFormat, TreeError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Result of a successful [`run_update`]
#[derive(Debug, Clone)]
pub struct UpdateResult {
    pub snapshot: Snapshot,
    pub selection: Selection,
    /// False when the mutation function touched nothing; `snapshot` is then the base
    pub changed: bool,
}

/// Run `f` against a working copy of `base` and commit the result atomically
pub fn run_update<F>(
    base: &Snapshot,
    selection: &Selection,
    keys: &mut KeyGenerator,
    f: F,
) -> Result<UpdateResult, MutationError>
where
    F: FnOnce(&mut Transaction<'_>) -> Result<(), MutationError>,
{
    let mut tx = Transaction::new(base, keys);
    f(&mut tx)?;

    let Transaction {
        nodes,
        replaced,
        selection: explicit,
        changed,
        ..
    } = tx;

    if !changed {
        let selection = match explicit {
            Some(explicit) => sanitize(explicit, base),
            None => selection.clone(),
        };
        return Ok(UpdateResult {
            snapshot: base.clone(),
            selection,
            changed: false,
        });
    }

    let snapshot = Snapshot::from_parts(base.version() + 1, nodes)?;
    let selection = match explicit {
        Some(explicit) => sanitize(explicit, &snapshot),
        None => reconcile(selection, base, &snapshot, &replaced),
    };

    debug!(
        version = snapshot.version(),
        nodes = snapshot.len(),
        replaced = replaced.len(),
        "transaction committed"
    );

    Ok(UpdateResult {
        snapshot,
        selection,
        changed: true,
    })
}

/// Mutable builder scoped to one transaction
pub struct Transaction<'a> {
    base: &'a Snapshot,
    nodes: NodeMap,
    keys: &'a mut KeyGenerator,
    /// Old key → new key for every `replace_node`
    replaced: HashMap<NodeKey, NodeKey>,
    selection: Option<Selection>,
    changed: bool,
}

impl<'a> Transaction<'a> {
    fn new(base: &'a Snapshot, keys: &'a mut KeyGenerator) -> Self {
        Self {
            base,
            nodes: base.node_map().clone(),
            keys,
            replaced: HashMap::new(),
            selection: None,
            changed: false,
        }
    }

    /// The snapshot this transaction started from
    pub fn base(&self) -> &'a Snapshot {
        self.base
    }

    // Reads see the working copy

    pub fn get(&self, key: &NodeKey) -> Option<&Node> {
        self.nodes.get(key).map(Arc::as_ref)
    }

    pub fn node(&self, key: &NodeKey) -> Result<&Node, MutationError> {
        self.get(key)
            .ok_or_else(|| TreeError::NodeNotFound(key.clone()).into())
    }

    pub fn children(&self, key: &NodeKey) -> Result<Vec<NodeKey>, MutationError> {
        Ok(self.node(key)?.children.clone())
    }

    pub fn parent_of(&self, key: &NodeKey) -> Result<NodeKey, MutationError> {
        self.node(key)?
            .parent
            .clone()
            .ok_or_else(|| TreeError::RootImmutable("has no parent").into())
    }

    pub fn index_in_parent(&self, key: &NodeKey) -> Result<usize, MutationError> {
        let parent = self.parent_of(key)?;
        self.node(&parent)?
            .children
            .iter()
            .position(|child| child == key)
            .ok_or_else(|| {
                TreeError::ParentMismatch {
                    child: key.clone(),
                    claimed: Some(parent.clone()),
                    actual: parent,
                }
                .into()
            })
    }

    /// Current replacement of `key`, following every `replace_node` so far
    pub fn current_key(&self, key: &NodeKey) -> NodeKey {
        let mut current = key.clone();
        while let Some(next) = self.replaced.get(&current) {
            current = next.clone();
        }
        current
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    fn node_mut(&mut self, key: &NodeKey) -> Result<&mut Node, MutationError> {
        self.changed = true;
        self.nodes
            .get_mut(key)
            .map(Arc::make_mut)
            .ok_or_else(|| TreeError::NodeNotFound(key.clone()).into())
    }

    fn container(&self, key: &NodeKey) -> Result<&Node, MutationError> {
        let node = self
            .get(key)
            .ok_or_else(|| TreeError::ParentNotFound(key.clone()))?;
        if node.kind.is_leaf() {
            return Err(TreeError::NotAContainer(key.clone()).into());
        }
        Ok(node)
    }

    fn non_root(&self, key: &NodeKey, action: &'static str) -> Result<&Node, MutationError> {
        let node = self.node(key)?;
        if node.is_root() {
            return Err(TreeError::RootImmutable(action).into());
        }
        Ok(node)
    }

    fn attach(&mut self, parent: &NodeKey, index: usize, child: NodeKey) -> Result<(), MutationError> {
        let parent_node = self.node_mut(parent)?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child.clone());
        self.node_mut(&child)?.parent = Some(parent.clone());
        Ok(())
    }

    fn detach(&mut self, key: &NodeKey) -> Result<(NodeKey, usize), MutationError> {
        let parent = self.parent_of(key)?;
        let index = self.index_in_parent(key)?;
        self.node_mut(&parent)?.children.remove(index);
        self.node_mut(key)?.parent = None;
        Ok((parent, index))
    }

    // Primitive mutations

    /// Insert a fresh childless node at `index` (clamped) under `parent`
    pub fn insert_node(
        &mut self,
        parent: &NodeKey,
        index: usize,
        kind: NodeKind,
    ) -> Result<NodeKey, MutationError> {
        self.insert_tree(parent, index, NodeTemplate::leaf(kind))
    }

    /// Insert a whole template subtree at `index` (clamped) under `parent`
    pub fn insert_tree(
        &mut self,
        parent: &NodeKey,
        index: usize,
        template: NodeTemplate,
    ) -> Result<NodeKey, MutationError> {
        self.container(parent)?;
        let key = insert_template(&mut self.nodes, parent, template, self.keys)?;
        self.attach(parent, index, key.clone())?;
        Ok(key)
    }

    /// Remove a node and its whole subtree
    pub fn remove_node(&mut self, key: &NodeKey) -> Result<(), MutationError> {
        self.non_root(key, "removed")?;
        self.detach(key)?;

        let mut stack = vec![key.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children.iter().cloned());
            }
        }
        Ok(())
    }

    /// Replace a node with a new one of `kind` under a new key, carrying the
    /// former children over
    pub fn replace_node(&mut self, key: &NodeKey, kind: NodeKind) -> Result<NodeKey, MutationError> {
        let old = self.non_root(key, "replaced")?.clone();
        if matches!(kind, NodeKind::Root) {
            return Err(TreeError::RootImmutable("nested").into());
        }
        if kind.is_leaf() && !old.children.is_empty() {
            return Err(TreeError::NotAContainer(key.clone()).into());
        }

        let new_key = self.keys.next_key();
        let parent = self.parent_of(key)?;
        let index = self.index_in_parent(key)?;

        let mut node = Node::new(new_key.clone(), Some(parent.clone()), kind);
        node.children = old.children.clone();
        self.nodes.insert(new_key.clone(), Arc::new(node));

        for child in &old.children {
            self.node_mut(child)?.parent = Some(new_key.clone());
        }
        self.node_mut(&parent)?.children[index] = new_key.clone();
        self.nodes.remove(key);
        self.replaced.insert(key.clone(), new_key.clone());
        self.changed = true;

        Ok(new_key)
    }

    /// Change a node's kind or attributes in place, keeping its key
    pub fn update_node(&mut self, key: &NodeKey, kind: NodeKind) -> Result<(), MutationError> {
        let node = self.non_root(key, "updated")?;
        if node.kind.is_leaf() != kind.is_leaf() || matches!(kind, NodeKind::Root) {
            return Err(TreeError::KindMismatch {
                from: node.kind.name(),
                to: kind.name(),
            }
            .into());
        }
        if node.kind == kind {
            return Ok(());
        }
        self.node_mut(key)?.kind = kind;
        Ok(())
    }

    pub fn set_format(&mut self, key: &NodeKey, format: TextFormat) -> Result<(), MutationError> {
        if !format.is_consistent() {
            return Err(TreeError::InconsistentFormat(key.clone()).into());
        }
        let node = self.node(key)?;
        if !matches!(node.kind, NodeKind::Text { .. }) {
            return Err(TreeError::NotText(key.clone()).into());
        }
        if node.format() == format {
            return Ok(());
        }
        if let NodeKind::Text { format: current, .. } = &mut self.node_mut(key)?.kind {
            *current = format;
        }
        Ok(())
    }

    pub fn set_text(&mut self, key: &NodeKey, content: impl Into<String>) -> Result<(), MutationError> {
        let content = content.into();
        let node = self.node(key)?;
        if !matches!(node.kind, NodeKind::Text { .. }) {
            return Err(TreeError::NotText(key.clone()).into());
        }
        if node.text() == content {
            return Ok(());
        }
        if let NodeKind::Text { text, .. } = &mut self.node_mut(key)?.kind {
            *text = content;
        }
        Ok(())
    }

    /// Split a text node at a char offset. The node keeps the left part; the
    /// right part becomes a new sibling with the same format, whose key is returned.
    pub fn split_text(&mut self, key: &NodeKey, offset: usize) -> Result<NodeKey, MutationError> {
        let node = self.node(key)?;
        let NodeKind::Text { text, format } = &node.kind else {
            return Err(TreeError::NotText(key.clone()).into());
        };
        let len = text.chars().count();
        if offset > len {
            return Err(TreeError::OffsetOutOfBounds {
                key: key.clone(),
                offset,
            }
            .into());
        }

        let byte = text
            .char_indices()
            .nth(offset)
            .map_or(text.len(), |(index, _)| index);
        let left = text[..byte].to_string();
        let right = text[byte..].to_string();
        let format = *format;

        let parent = self.parent_of(key)?;
        let index = self.index_in_parent(key)?;
        self.set_text(key, left)?;
        self.insert_tree(&parent, index + 1, NodeTemplate::formatted(right, format))
    }

    /// Move a node (with its subtree) to `index` (clamped) under `new_parent`
    pub fn move_node(
        &mut self,
        key: &NodeKey,
        new_parent: &NodeKey,
        index: usize,
    ) -> Result<(), MutationError> {
        self.non_root(key, "moved")?;
        self.container(new_parent)?;
        if new_parent == key || self.is_descendant(new_parent, key) {
            return Err(TreeError::CycleDetected {
                node: key.clone(),
                parent: new_parent.clone(),
            }
            .into());
        }

        self.detach(key)?;
        self.attach(new_parent, index, key.clone())
    }

    fn is_descendant(&self, key: &NodeKey, of: &NodeKey) -> bool {
        let mut current = self.get(key).and_then(|node| node.parent.clone());
        while let Some(parent) = current {
            if &parent == of {
                return true;
            }
            current = self.get(&parent).and_then(|node| node.parent.clone());
        }
        false
    }

    /// Wrap sibling nodes in one new container of `kind`, placed where the
    /// first of them was. The nodes keep their relative order.
    pub fn wrap_nodes(&mut self, keys: &[NodeKey], kind: NodeKind) -> Result<NodeKey, MutationError> {
        let first = keys.first().ok_or(TreeError::EmptyWrap)?;
        if kind.is_leaf() || matches!(kind, NodeKind::Root) {
            return Err(TreeError::KindMismatch {
                from: kind.name(),
                to: "container",
            }
            .into());
        }

        let parent = self.parent_of(first)?;
        let mut positioned = Vec::with_capacity(keys.len());
        for key in keys {
            self.non_root(key, "wrapped")?;
            if self.parent_of(key)? != parent {
                return Err(TreeError::NotSiblings.into());
            }
            positioned.push((self.index_in_parent(key)?, key.clone()));
        }
        positioned.sort();
        positioned.dedup();

        let index = positioned[0].0;
        let wrapper = self.insert_node(&parent, index, kind)?;
        for (position, (_, key)) in positioned.iter().enumerate() {
            self.move_node(key, &wrapper, position)?;
        }
        Ok(wrapper)
    }

    /// Remove a container, splicing its children into its place
    pub fn unwrap_node(&mut self, key: &NodeKey) -> Result<(), MutationError> {
        let node = self.non_root(key, "unwrapped")?;
        if node.kind.is_leaf() {
            return Err(TreeError::NotAContainer(key.clone()).into());
        }
        let children = node.children.clone();
        let parent = self.parent_of(key)?;
        let index = self.index_in_parent(key)?;

        for (offset, child) in children.iter().enumerate() {
            self.move_node(child, &parent, index + 1 + offset)?;
        }
        self.remove_node(key)
    }

    /// Selection to install after commit, instead of reconciling the old one
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }
}
