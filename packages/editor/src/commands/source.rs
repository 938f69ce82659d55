//! View and replace the document markup through the source modal

use super::{prompt, CommandOutcome, EditorContext};
use crate::errors::EditorError;
use crate::modal::{ModalForm, ModalHost, SourceForm};
use crate::selection::Selection;
use folio_document::NodeTemplate;
use folio_markup::parse_markup;
use tracing::debug;

pub(crate) async fn edit_source<H: ModalHost>(
    ctx: &mut EditorContext<'_, H>,
    description: &str,
) -> Result<CommandOutcome, EditorError> {
    let current = ctx.session.to_markup();
    let defaults = ModalForm::Source(SourceForm {
        source: current.clone(),
    });

    let Some(ModalForm::Source(form)) = prompt(ctx.modals, defaults).await? else {
        return Ok(CommandOutcome::Cancelled);
    };
    if form.source.trim() == current.trim() {
        return Ok(CommandOutcome::Unchanged);
    }

    // parse before opening the transaction: bad markup leaves the document alone
    let mut blocks = parse_markup(&form.source)?;
    if blocks.is_empty() {
        blocks.push(NodeTemplate::paragraph(Vec::new()));
    }
    debug!(blocks = blocks.len(), "replacing document from source");

    let outcome = ctx.session.update(description, |tx| {
        let root = tx.base().root_key().clone();
        for child in tx.children(&root)? {
            tx.remove_node(&child)?;
        }
        for (index, block) in blocks.into_iter().enumerate() {
            tx.insert_tree(&root, index, block)?;
        }
        tx.set_selection(Selection::None);
        Ok(())
    })?;
    Ok(outcome.into())
}
