//! Block-type toggle

use crate::errors::MutationError;
use crate::selection::{collect_nodes, Selection};
use crate::transaction::Transaction;
use folio_document::node;
use folio_document::{Node, NodeKind, Snapshot};
use std::collections::HashSet;

/// Toggle every text block of the selection on its own: a block that
/// already matches becomes a paragraph, any other becomes `kind`. Blocks
/// keep their children; a bare leaf at the top level is wrapped instead.
/// A block sitting inside a matching wrapper (a paragraph in a quote) turns
/// off by unwrapping that wrapper.
pub(crate) fn toggle_block(
    tx: &mut Transaction<'_>,
    selection: &Selection,
    matcher: &(dyn Fn(&Node) -> bool + Send + Sync),
    kind: &NodeKind,
) -> Result<(), MutationError> {
    let base = tx.base();
    let mut unwrapped = HashSet::new();

    for block in toggle_targets(base, selection) {
        let matches = matcher(block);
        if !matches {
            let wrapper = base
                .ancestors(&block.key)
                .filter(|ancestor| !ancestor.is_root())
                .find(|ancestor| matcher(ancestor));
            if let Some(wrapper) = wrapper {
                if unwrapped.insert(wrapper.key.clone()) {
                    tx.unwrap_node(&wrapper.key)?;
                }
                continue;
            }
        }

        let target = if matches { node::paragraph() } else { kind.clone() };
        if block.kind == target {
            continue;
        }

        if block.kind.is_leaf() {
            tx.wrap_nodes(std::slice::from_ref(&block.key), target)?;
        } else {
            tx.replace_node(&block.key, target)?;
        }
    }
    Ok(())
}

/// A block holding only inline content
fn is_text_block(snapshot: &Snapshot, node: &Node) -> bool {
    !node.is_root()
        && node.kind.is_container()
        && !node.kind.is_inline()
        && !matches!(node.kind, NodeKind::Details { .. })
        && snapshot
            .get_children(&node.key)
            .iter()
            .all(|child| child.kind.is_inline())
}

fn nested_text_blocks<'a>(snapshot: &'a Snapshot, node: &Node, out: &mut Vec<&'a Node>) {
    for child in snapshot.get_children(&node.key) {
        if is_text_block(snapshot, child) {
            out.push(child);
        } else if child.kind.is_container() && !child.kind.is_inline() {
            nested_text_blocks(snapshot, child, out);
        }
    }
}

/// Distinct text blocks under the selection, in document order. Selected
/// containers of blocks contribute the text blocks inside them.
fn toggle_targets<'a>(snapshot: &'a Snapshot, selection: &Selection) -> Vec<&'a Node> {
    let listed = matches!(selection, Selection::Nodes { .. });
    let mut candidates = Vec::new();

    for node in collect_nodes(snapshot, selection) {
        let nearest = std::iter::once(node)
            .chain(snapshot.ancestors(&node.key))
            .find(|candidate| is_text_block(snapshot, candidate));
        match nearest {
            Some(block) => candidates.push(block),
            None if node.kind.is_leaf() && node.parent.as_ref() == Some(snapshot.root_key()) => {
                candidates.push(node)
            }
            None if listed && !node.kind.is_inline() => {
                nested_text_blocks(snapshot, node, &mut candidates)
            }
            None => {}
        }
    }

    let mut seen = HashSet::new();
    candidates.retain(|block| seen.insert(block.key.clone()));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Point;
    use crate::transaction::run_update;
    use folio_document::node::{is_heading_of, is_paragraph, is_quote};
    use folio_document::{HeadingLevel, KeyGenerator, NodeTemplate, Snapshot};
    use folio_markup::to_markup;

    fn setup() -> (Snapshot, KeyGenerator) {
        let mut keys = KeyGenerator::new("block");
        let snapshot = Snapshot::create(
            vec![
                NodeTemplate::paragraph_text("One"),
                NodeTemplate::heading(HeadingLevel::H2, vec![NodeTemplate::text("Two")]),
                NodeTemplate::paragraph_text("Three"),
            ],
            &mut keys,
        )
        .unwrap();
        (snapshot, keys)
    }

    fn text(snapshot: &Snapshot, block: usize) -> folio_document::NodeKey {
        let block = &snapshot.root().children[block];
        snapshot.first_leaf(block).unwrap().key.clone()
    }

    fn is_h2(node: &Node) -> bool {
        is_heading_of(node, HeadingLevel::H2)
    }

    #[test]
    fn test_mixed_selection_converts_per_block() {
        let (base, mut keys) = setup();
        let selection = Selection::range(Point::new(text(&base, 0), 1), Point::new(text(&base, 1), 2));

        let result = run_update(&base, &selection, &mut keys, |tx| {
            toggle_block(tx, &selection, &is_h2, &node::heading(HeadingLevel::H2))
        })
        .unwrap();

        let blocks = result.snapshot.get_children(result.snapshot.root_key());
        assert!(is_h2(blocks[0]));
        // the heading matched, so it turned back into a paragraph
        assert!(is_paragraph(blocks[1]));
        assert!(is_paragraph(blocks[2]));
        assert_eq!(result.snapshot.text_content(&blocks[0].key), "One");
        // text keys survive; the selection still points at them
        assert_eq!(result.selection, selection);
    }

    #[test]
    fn test_quote_then_paragraph_button() {
        let (base, mut keys) = setup();
        let selection = Selection::caret(text(&base, 2), 0);

        let quoted = run_update(&base, &selection, &mut keys, |tx| {
            toggle_block(tx, &selection, &is_quote, &node::quote())
        })
        .unwrap();
        assert!(is_quote(quoted.snapshot.get_children(quoted.snapshot.root_key())[2]));

        let back = run_update(&quoted.snapshot, &quoted.selection, &mut keys, |tx| {
            toggle_block(tx, &quoted.selection, &is_paragraph, &node::paragraph())
        })
        .unwrap();
        assert!(is_paragraph(back.snapshot.get_children(back.snapshot.root_key())[2]));
        assert_eq!(back.snapshot.text_content(back.snapshot.root_key()), "OneTwoThree");

        // already a paragraph: nothing to do
        let again = run_update(&back.snapshot, &back.selection, &mut keys, |tx| {
            toggle_block(tx, &back.selection, &is_paragraph, &node::paragraph())
        })
        .unwrap();
        assert!(!again.changed);
    }

    fn caret_in_first_text(snapshot: &Snapshot) -> Selection {
        let text = snapshot.first_leaf(snapshot.root_key()).unwrap().key.clone();
        Selection::caret(text, 0)
    }

    #[test]
    fn test_paragraphs_inside_quote_convert_in_place() {
        let mut keys = KeyGenerator::new("block");
        let base = Snapshot::create(
            vec![NodeTemplate::quote(vec![NodeTemplate::paragraph_text("x")])],
            &mut keys,
        )
        .unwrap();
        let selection = caret_in_first_text(&base);

        let heading = run_update(&base, &selection, &mut keys, |tx| {
            toggle_block(tx, &selection, &is_h2, &node::heading(HeadingLevel::H2))
        })
        .unwrap();
        assert_eq!(to_markup(&heading.snapshot), "<blockquote><h2>x</h2></blockquote>");

        // the caret already sits in a paragraph
        let paragraph = run_update(&base, &selection, &mut keys, |tx| {
            toggle_block(tx, &selection, &is_paragraph, &node::paragraph())
        })
        .unwrap();
        assert!(!paragraph.changed);

        // the quote itself matches, so toggling it off lifts the paragraph out
        let unquoted = run_update(&base, &selection, &mut keys, |tx| {
            toggle_block(tx, &selection, &is_quote, &node::quote())
        })
        .unwrap();
        assert_eq!(to_markup(&unquoted.snapshot), "<p>x</p>");
        assert_eq!(unquoted.selection, selection);
    }

    #[test]
    fn test_heading_inside_details_keeps_summary() {
        let mut keys = KeyGenerator::new("block");
        let base = Snapshot::create(
            vec![NodeTemplate::new(
                NodeKind::Details {
                    summary: "More".into(),
                },
                vec![
                    NodeTemplate::paragraph_text("a"),
                    NodeTemplate::paragraph_text("b"),
                ],
            )],
            &mut keys,
        )
        .unwrap();
        let selection = caret_in_first_text(&base);

        let result = run_update(&base, &selection, &mut keys, |tx| {
            toggle_block(tx, &selection, &is_h2, &node::heading(HeadingLevel::H2))
        })
        .unwrap();
        assert_eq!(
            to_markup(&result.snapshot),
            "<details><summary>More</summary><h2>a</h2><p>b</p></details>"
        );
        result.snapshot.validate().unwrap();
    }

    #[test]
    fn test_selected_container_toggles_its_blocks() {
        let mut keys = KeyGenerator::new("block");
        let base = Snapshot::create(
            vec![NodeTemplate::details(vec![
                NodeTemplate::paragraph_text("a"),
                NodeTemplate::quote(vec![NodeTemplate::paragraph_text("b")]),
            ])],
            &mut keys,
        )
        .unwrap();
        let details = base.root().children[0].clone();
        let selection = Selection::nodes(vec![details]);

        let result = run_update(&base, &selection, &mut keys, |tx| {
            toggle_block(tx, &selection, &is_h2, &node::heading(HeadingLevel::H2))
        })
        .unwrap();
        assert_eq!(
            to_markup(&result.snapshot),
            "<details><summary></summary><h2>a</h2><blockquote><h2>b</h2></blockquote></details>"
        );
    }

    #[test]
    fn test_empty_selection_is_noop() {
        let (base, mut keys) = setup();
        let result = run_update(&base, &Selection::None, &mut keys, |tx| {
            toggle_block(tx, &Selection::None, &is_quote, &node::quote())
        })
        .unwrap();
        assert!(!result.changed);
    }
}
