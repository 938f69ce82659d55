//! Insert or edit an image through the image modal

use super::insert::{insert_inline, insertion_point};
use super::{prompt, CommandOutcome, EditorContext};
use crate::errors::{EditorError, MutationError};
use crate::modal::{ImageForm, ModalForm, ModalHost};
use crate::selection::{find_node_of_type, Selection};
use crate::transaction::Transaction;
use folio_document::node::{self, is_image};
use folio_document::{NodeKey, NodeKind, NodeTemplate, Snapshot};

pub(crate) async fn edit_image<H: ModalHost>(
    ctx: &mut EditorContext<'_, H>,
    description: &str,
) -> Result<CommandOutcome, EditorError> {
    let (existing, defaults) = image_defaults(ctx.session.snapshot(), ctx.session.selection());
    if let Some(image) = &existing {
        ctx.session.set_selection(Selection::nodes(vec![image.clone()]));
    }

    let Some(ModalForm::Image(form)) = prompt(ctx.modals, ModalForm::Image(defaults)).await? else {
        return Ok(CommandOutcome::Cancelled);
    };

    let selection = ctx.session.selection().clone();
    let outcome = ctx.session.update(description, |tx| match &existing {
        Some(image) => update_image(tx, image, &form),
        None => create_image(tx, &selection, &form),
    })?;
    Ok(outcome.into())
}

fn image_defaults(snapshot: &Snapshot, selection: &Selection) -> (Option<NodeKey>, ImageForm) {
    let Some(image) = find_node_of_type(snapshot, selection, is_image) else {
        return (None, ImageForm::default());
    };
    let form = match &image.kind {
        NodeKind::Image {
            src,
            alt,
            width,
            height,
        } => ImageForm {
            src: src.clone(),
            alt: alt.clone(),
            width: width.map(|w| w.to_string()).unwrap_or_default(),
            height: height.map(|h| h.to_string()).unwrap_or_default(),
        },
        _ => ImageForm::default(),
    };
    (Some(image.key.clone()), form)
}

/// "320", "320px" and " 320 " all read as 320; blank or zero is unset
fn parse_dimension(value: &str) -> Option<u32> {
    value
        .trim()
        .trim_end_matches("px")
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|size| *size > 0)
}

fn image_kind(form: &ImageForm) -> NodeKind {
    node::image(
        form.src.trim(),
        form.alt.trim(),
        parse_dimension(&form.width),
        parse_dimension(&form.height),
    )
}

fn update_image(tx: &mut Transaction<'_>, image: &NodeKey, form: &ImageForm) -> Result<(), MutationError> {
    if form.src.trim().is_empty() {
        return tx.remove_node(image);
    }
    tx.update_node(image, image_kind(form))?;
    tx.set_selection(Selection::nodes(vec![image.clone()]));
    Ok(())
}

fn create_image(tx: &mut Transaction<'_>, selection: &Selection, form: &ImageForm) -> Result<(), MutationError> {
    if form.src.trim().is_empty() {
        return Ok(());
    }
    let at = insertion_point(tx, selection)?;
    let image = insert_inline(tx, at, NodeTemplate::leaf(image_kind(form)))?;
    tx.set_selection(Selection::nodes(vec![image]));
    Ok(())
}
