//! Collapsible block insertion

use crate::errors::MutationError;
use crate::selection::{top_level_blocks, Selection};
use crate::transaction::Transaction;
use folio_document::node;
use folio_document::NodeKey;

/// Move the selected top-level blocks into a new details block placed where
/// the first of them was. Without a selection, an empty details block is
/// appended to the document.
pub(crate) fn insert_details(
    tx: &mut Transaction<'_>,
    selection: &Selection,
) -> Result<(), MutationError> {
    let base = tx.base();
    let root = base.root_key().clone();
    let blocks: Vec<NodeKey> = top_level_blocks(base, selection)
        .into_iter()
        .map(|block| block.key.clone())
        .collect();

    let Some(first) = blocks.first() else {
        tx.insert_node(&root, usize::MAX, node::details())?;
        return Ok(());
    };

    let index = tx.index_in_parent(first)?;
    let details = tx.insert_node(&root, index + 1, node::details())?;
    for (position, block) in blocks.iter().enumerate() {
        tx.move_node(block, &details, position)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Point;
    use crate::transaction::run_update;
    use folio_document::node::is_details;
    use folio_document::{KeyGenerator, NodeTemplate, Snapshot};

    fn setup() -> (Snapshot, KeyGenerator) {
        let mut keys = KeyGenerator::new("details");
        let snapshot = Snapshot::create(
            vec![
                NodeTemplate::paragraph_text("One"),
                NodeTemplate::paragraph_text("Two"),
                NodeTemplate::paragraph_text("Three"),
            ],
            &mut keys,
        )
        .unwrap();
        (snapshot, keys)
    }

    #[test]
    fn test_no_selection_appends_empty_details() {
        let (base, mut keys) = setup();
        let result = run_update(&base, &Selection::None, &mut keys, |tx| {
            insert_details(tx, &Selection::None)
        })
        .unwrap();

        let blocks = result.snapshot.get_children(result.snapshot.root_key());
        assert_eq!(blocks.len(), 4);
        assert!(is_details(blocks[3]));
        assert!(blocks[3].children.is_empty());
    }

    #[test]
    fn test_selected_blocks_move_inside() {
        let (base, mut keys) = setup();
        let second = base.root().children[1].clone();
        let third = base.root().children[2].clone();
        let selection = Selection::range(
            Point::new(base.first_leaf(&second).unwrap().key.clone(), 1),
            Point::new(base.first_leaf(&third).unwrap().key.clone(), 2),
        );

        let result = run_update(&base, &selection, &mut keys, |tx| insert_details(tx, &selection)).unwrap();

        let snapshot = result.snapshot;
        let blocks = snapshot.get_children(snapshot.root_key());
        assert_eq!(blocks.len(), 2);
        assert!(is_details(blocks[1]));
        assert_eq!(blocks[1].children, vec![second, third]);
        assert!(snapshot.validate().is_ok());
        // moved nodes keep their keys, so the selection is unchanged
        assert_eq!(result.selection, selection);
    }
}
