//! # Selection Model
//!
//! A selection targets either a text range, an ordered set of nodes, or
//! nothing. Range endpoints are [`Point`]s: a character offset inside a text
//! node, or a child index ("boundary") inside a container.
//!
//! Every query here is a pure function of `(snapshot, selection)`.

use crate::errors::SelectionResolutionError;
use folio_document::node::is_text;
use folio_document::{Node, NodeKey, Snapshot, TextFormat};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// A position inside a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: impl Into<NodeKey>, offset: usize) -> Self {
        Self {
            key: key.into(),
            offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    None,
    Range {
        anchor: Point,
        focus: Point,
    },
    Nodes {
        keys: Vec<NodeKey>,
    },
}

impl Selection {
    /// Collapsed range at one point
    pub fn caret(key: impl Into<NodeKey>, offset: usize) -> Self {
        let point = Point::new(key, offset);
        Selection::Range {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn range(anchor: Point, focus: Point) -> Self {
        Selection::Range { anchor, focus }
    }

    /// Node set selection; duplicate keys are dropped, first occurrence wins
    pub fn nodes(keys: impl IntoIterator<Item = NodeKey>) -> Self {
        let mut seen = HashSet::new();
        let keys = keys
            .into_iter()
            .filter(|key| seen.insert(key.clone()))
            .collect();
        Selection::Nodes { keys }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self, Selection::Range { anchor, focus } if anchor == focus)
    }

    /// Every key the selection refers to
    pub fn keys(&self) -> Vec<&NodeKey> {
        match self {
            Selection::None => Vec::new(),
            Selection::Range { anchor, focus } => vec![&anchor.key, &focus.key],
            Selection::Nodes { keys } => keys.iter().collect(),
        }
    }

    /// Check every key and offset against a snapshot
    pub fn validate(&self, snapshot: &Snapshot) -> Result<(), SelectionResolutionError> {
        match self {
            Selection::None => Ok(()),
            Selection::Range { anchor, focus } => {
                validate_point(snapshot, anchor)?;
                validate_point(snapshot, focus)
            }
            Selection::Nodes { keys } => keys
                .iter()
                .find(|key| !snapshot.contains(key))
                .map_or(Ok(()), |key| {
                    Err(SelectionResolutionError::UnknownKey(key.clone()))
                }),
        }
    }
}

fn validate_point(snapshot: &Snapshot, point: &Point) -> Result<(), SelectionResolutionError> {
    let node = snapshot
        .get_node(&point.key)
        .ok_or_else(|| SelectionResolutionError::UnknownKey(point.key.clone()))?;
    let len = node.offset_len();
    if point.offset > len {
        return Err(SelectionResolutionError::OffsetOutOfRange {
            key: point.key.clone(),
            offset: point.offset,
            len,
        });
    }
    Ok(())
}

/// Resolve a point to a leaf position (or an empty container)
pub fn resolve_point(snapshot: &Snapshot, point: &Point) -> Option<Point> {
    let node = snapshot.get_node(&point.key)?;
    if node.kind.is_leaf() {
        let offset = point.offset.min(node.offset_len());
        return Some(Point::new(node.key.clone(), offset));
    }
    if node.children.is_empty() {
        return Some(Point::new(node.key.clone(), 0));
    }
    match node.children.get(point.offset) {
        Some(child) => {
            let leaf = snapshot.first_leaf(child)?;
            Some(Point::new(leaf.key.clone(), 0))
        }
        None => {
            let leaf = snapshot.last_leaf(&node.key)?;
            Some(Point::new(leaf.key.clone(), leaf.offset_len()))
        }
    }
}

/// Order two resolved points by document position, then offset
pub fn compare_points(snapshot: &Snapshot, a: &Point, b: &Point) -> Ordering {
    snapshot
        .compare_order(&a.key, &b.key)
        .unwrap_or(Ordering::Equal)
        .then(a.offset.cmp(&b.offset))
}

/// Resolved `(start, end)` of a range, in document order
pub fn ordered_range(snapshot: &Snapshot, selection: &Selection) -> Option<(Point, Point)> {
    let Selection::Range { anchor, focus } = selection else {
        return None;
    };
    let anchor = resolve_point(snapshot, anchor)?;
    let focus = resolve_point(snapshot, focus)?;
    if compare_points(snapshot, &anchor, &focus) == Ordering::Greater {
        Some((focus, anchor))
    } else {
        Some((anchor, focus))
    }
}

/// Lazy, restartable iterator over selected nodes in document order
#[derive(Clone)]
pub struct SelectionNodes<'a> {
    snapshot: &'a Snapshot,
    inner: NodesInner<'a>,
}

#[derive(Clone)]
enum NodesInner<'a> {
    Walk {
        next: Option<&'a Node>,
        last: NodeKey,
    },
    Listed(std::vec::IntoIter<NodeKey>),
}

impl<'a> Iterator for SelectionNodes<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let snapshot = self.snapshot;
        match &mut self.inner {
            NodesInner::Walk { next, last } => {
                let current = (*next)?;
                *next = if current.key == *last {
                    None
                } else {
                    snapshot.next_in_order(&current.key)
                };
                Some(current)
            }
            NodesInner::Listed(keys) => keys.find_map(|key| snapshot.get_node(&key)),
        }
    }
}

/// Selected nodes. A range yields every node in pre-order from its start
/// leaf to its end leaf; a node set yields its nodes in document order.
pub fn collect_nodes<'a>(snapshot: &'a Snapshot, selection: &Selection) -> SelectionNodes<'a> {
    let inner = match selection {
        Selection::None => NodesInner::Listed(Vec::new().into_iter()),
        Selection::Range { .. } => match ordered_range(snapshot, selection) {
            Some((start, end)) => NodesInner::Walk {
                next: snapshot.get_node(&start.key),
                last: end.key,
            },
            None => NodesInner::Listed(Vec::new().into_iter()),
        },
        Selection::Nodes { keys } => {
            let mut keyed: Vec<(Vec<usize>, NodeKey)> = keys
                .iter()
                .filter_map(|key| Some((snapshot.path(key)?, key.clone())))
                .collect();
            keyed.sort();
            NodesInner::Listed(
                keyed
                    .into_iter()
                    .map(|(_, key)| key)
                    .collect::<Vec<_>>()
                    .into_iter(),
            )
        }
    };
    SelectionNodes { snapshot, inner }
}

/// First selected node, or non-root ancestor of one, matching `predicate`
pub fn find_node_of_type<'a, P>(
    snapshot: &'a Snapshot,
    selection: &Selection,
    predicate: P,
) -> Option<&'a Node>
where
    P: Fn(&Node) -> bool,
{
    for node in collect_nodes(snapshot, selection) {
        if predicate(node) {
            return Some(node);
        }
        if let Some(ancestor) = snapshot
            .ancestors(&node.key)
            .filter(|ancestor| !ancestor.is_root())
            .find(|ancestor| predicate(ancestor))
        {
            return Some(ancestor);
        }
    }
    None
}

pub fn contains_node_type<P>(snapshot: &Snapshot, selection: &Selection, predicate: P) -> bool
where
    P: Fn(&Node) -> bool,
{
    find_node_of_type(snapshot, selection, predicate).is_some()
}

/// Distinct top-level ancestors of the selected nodes, in document order
pub fn top_level_blocks<'a>(snapshot: &'a Snapshot, selection: &Selection) -> Vec<&'a Node> {
    let mut seen = HashSet::new();
    collect_nodes(snapshot, selection)
        .filter_map(|node| snapshot.top_level_ancestor(&node.key))
        .filter(|block| seen.insert(block.key.clone()))
        .collect()
}

/// The covered char range `[start, end)` of one text node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub key: NodeKey,
    pub start: usize,
    pub end: usize,
    /// Length of the whole text node, in chars
    pub len: usize,
}

impl TextSpan {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn covers_whole_node(&self) -> bool {
        self.start == 0 && self.end == self.len
    }
}

/// Text nodes intersected by the selection. A caret yields its own
/// (collapsed) span; a node touched only at a range boundary is skipped.
pub fn intersected_text(snapshot: &Snapshot, selection: &Selection) -> Vec<TextSpan> {
    match selection {
        Selection::None => Vec::new(),
        Selection::Range { .. } => {
            let Some((start, end)) = ordered_range(snapshot, selection) else {
                return Vec::new();
            };

            if start == end {
                return snapshot
                    .get_node(&start.key)
                    .filter(|node| is_text(node))
                    .map(|node| TextSpan {
                        key: node.key.clone(),
                        start: start.offset,
                        end: start.offset,
                        len: node.offset_len(),
                    })
                    .into_iter()
                    .collect();
            }

            collect_nodes(snapshot, selection)
                .filter(|node| is_text(node))
                .filter_map(|node| {
                    let len = node.offset_len();
                    let from = if node.key == start.key { start.offset } else { 0 };
                    let to = if node.key == end.key { end.offset } else { len };
                    (from < to).then(|| TextSpan {
                        key: node.key.clone(),
                        start: from,
                        end: to,
                        len,
                    })
                })
                .collect()
        }
        Selection::Nodes { .. } => {
            let mut seen = HashSet::new();
            let mut spans = Vec::new();
            for selected in collect_nodes(snapshot, selection) {
                let subtree_end = snapshot.next_after_subtree(&selected.key).map(|n| n.key.clone());
                let mut current = Some(selected);
                while let Some(node) = current {
                    if Some(&node.key) == subtree_end.as_ref() {
                        break;
                    }
                    let len = node.offset_len();
                    if is_text(node) && len > 0 && seen.insert(node.key.clone()) {
                        spans.push(TextSpan {
                            key: node.key.clone(),
                            start: 0,
                            end: len,
                            len,
                        });
                    }
                    current = snapshot.next_in_order(&node.key);
                }
            }
            spans
        }
    }
}

/// Unanimous format state: every intersected text node carries `format`
pub fn text_format_active(snapshot: &Snapshot, selection: &Selection, format: TextFormat) -> bool {
    let spans = intersected_text(snapshot, selection);
    !spans.is_empty()
        && spans.iter().all(|span| {
            snapshot
                .get_node(&span.key)
                .is_some_and(|node| node.format().contains(format))
        })
}

/// Repair a selection against a snapshot: unknown keys clear it, offsets clamp
pub fn sanitize(selection: Selection, snapshot: &Snapshot) -> Selection {
    match selection.validate(snapshot) {
        Ok(()) => selection,
        Err(SelectionResolutionError::OffsetOutOfRange { .. }) => clamp_offsets(selection, snapshot),
        Err(err) => {
            warn!("clearing selection: {}", err);
            match selection {
                Selection::Nodes { keys } => {
                    let keys: Vec<NodeKey> = keys.into_iter().filter(|k| snapshot.contains(k)).collect();
                    if keys.is_empty() {
                        Selection::None
                    } else {
                        Selection::Nodes { keys }
                    }
                }
                _ => Selection::None,
            }
        }
    }
}

fn clamp_offsets(selection: Selection, snapshot: &Snapshot) -> Selection {
    let clamp = |point: Point| {
        let len = snapshot.get_node(&point.key).map_or(0, Node::offset_len);
        Point {
            offset: point.offset.min(len),
            key: point.key,
        }
    };
    match selection {
        Selection::Range { anchor, focus } => Selection::Range {
            anchor: clamp(anchor),
            focus: clamp(focus),
        },
        other => other,
    }
}

/// Where a key of the base snapshot lives after a commit
enum Remapped {
    Same(NodeKey),
    Replaced(NodeKey),
    Ancestor(NodeKey),
}

fn surviving(key: &NodeKey, next: &Snapshot, replaced: &HashMap<NodeKey, NodeKey>) -> Option<NodeKey> {
    let mut current = key.clone();
    // every replacement mints a fresh key, so chains end
    while !next.contains(&current) {
        current = replaced.get(&current)?.clone();
    }
    Some(current)
}

fn remap_key(
    key: &NodeKey,
    base: &Snapshot,
    next: &Snapshot,
    replaced: &HashMap<NodeKey, NodeKey>,
) -> Option<Remapped> {
    if next.contains(key) {
        return Some(Remapped::Same(key.clone()));
    }
    if let Some(found) = surviving(key, next, replaced) {
        return Some(Remapped::Replaced(found));
    }
    base.ancestors(key)
        .filter(|ancestor| !ancestor.is_root())
        .find_map(|ancestor| surviving(&ancestor.key, next, replaced))
        .map(Remapped::Ancestor)
}

/// Carry a selection across a commit. Keys removed by the transaction follow
/// their replacement, else the nearest surviving ancestor in the base tree;
/// a point with neither clears the selection.
pub fn reconcile(
    selection: &Selection,
    base: &Snapshot,
    next: &Snapshot,
    replaced: &HashMap<NodeKey, NodeKey>,
) -> Selection {
    let remap_point = |point: &Point| {
        remap_key(&point.key, base, next, replaced).map(|remapped| match remapped {
            Remapped::Same(key) | Remapped::Replaced(key) => Point {
                key,
                offset: point.offset,
            },
            Remapped::Ancestor(key) => Point { key, offset: 0 },
        })
    };

    let result = match selection {
        Selection::None => Selection::None,
        Selection::Range { anchor, focus } => match (remap_point(anchor), remap_point(focus)) {
            (Some(anchor), Some(focus)) => clamp_offsets(Selection::Range { anchor, focus }, next),
            _ => Selection::None,
        },
        Selection::Nodes { keys } => {
            let mapped = Selection::nodes(keys.iter().filter_map(|key| {
                remap_key(key, base, next, replaced).map(|remapped| match remapped {
                    Remapped::Same(key) | Remapped::Replaced(key) | Remapped::Ancestor(key) => key,
                })
            }));
            match mapped {
                Selection::Nodes { keys } if keys.is_empty() => Selection::None,
                other => other,
            }
        }
    };

    if let Some(lost) = selection.keys().into_iter().find(|key| !next.contains(key)) {
        if !replaced.contains_key(lost) {
            warn!(
                "{}; selection remapped",
                SelectionResolutionError::UnknownKey(lost.clone())
            );
        }
    }
    result
}
