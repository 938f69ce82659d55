//! Where new inline content goes

use crate::errors::MutationError;
use crate::selection::{ordered_range, top_level_blocks, Selection};
use crate::transaction::Transaction;
use folio_document::{NodeKey, NodeKind, NodeTemplate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InsertAt {
    /// Directly under an inline-holding container
    Inline { parent: NodeKey, index: usize },
    /// Inside a new paragraph under a block-holding container
    Block { parent: NodeKey, index: usize },
}

/// Insertion point for inline content: the end of a range (splitting the
/// text there), after the last selected block, or the end of the document.
pub(crate) fn insertion_point(
    tx: &mut Transaction<'_>,
    selection: &Selection,
) -> Result<InsertAt, MutationError> {
    let base = tx.base();
    let end_of_document = InsertAt::Block {
        parent: base.root_key().clone(),
        index: usize::MAX,
    };

    match selection {
        Selection::None => Ok(end_of_document),
        Selection::Nodes { .. } => match top_level_blocks(base, selection).last() {
            Some(block) => Ok(InsertAt::Block {
                parent: base.root_key().clone(),
                index: tx.index_in_parent(&block.key)? + 1,
            }),
            None => Ok(end_of_document),
        },
        Selection::Range { .. } => {
            let Some((_, end)) = ordered_range(base, selection) else {
                return Ok(end_of_document);
            };
            let Some(node) = base.get_node(&end.key) else {
                return Ok(end_of_document);
            };

            match &node.kind {
                NodeKind::Text { .. } => {
                    let len = node.offset_len();
                    let parent = tx.parent_of(&end.key)?;
                    let index = tx.index_in_parent(&end.key)?;
                    if end.offset == 0 {
                        Ok(InsertAt::Inline { parent, index })
                    } else {
                        if end.offset < len {
                            tx.split_text(&end.key, end.offset)?;
                        }
                        Ok(InsertAt::Inline {
                            parent,
                            index: index + 1,
                        })
                    }
                }
                kind if kind.is_leaf() => Ok(InsertAt::Inline {
                    parent: tx.parent_of(&end.key)?,
                    index: tx.index_in_parent(&end.key)? + 1,
                }),
                NodeKind::Root | NodeKind::Details { .. } => Ok(InsertAt::Block {
                    parent: end.key.clone(),
                    index: end.offset,
                }),
                _ => Ok(InsertAt::Inline {
                    parent: end.key.clone(),
                    index: end.offset,
                }),
            }
        }
    }
}

/// Insert `template` at `at`, returning its key
pub(crate) fn insert_inline(
    tx: &mut Transaction<'_>,
    at: InsertAt,
    template: NodeTemplate,
) -> Result<NodeKey, MutationError> {
    match at {
        InsertAt::Inline { parent, index } => tx.insert_tree(&parent, index, template),
        InsertAt::Block { parent, index } => {
            let paragraph = tx.insert_tree(&parent, index, NodeTemplate::paragraph(Vec::new()))?;
            tx.insert_tree(&paragraph, 0, template)
        }
    }
}
