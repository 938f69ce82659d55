//! Insert or edit a link through the link modal

use super::format::isolate_spans;
use super::insert::{insert_inline, insertion_point};
use super::{non_empty, prompt, CommandOutcome, EditorContext};
use crate::errors::{EditorError, MutationError};
use crate::modal::{LinkForm, ModalForm, ModalHost};
use crate::selection::{find_node_of_type, intersected_text, Selection, TextSpan};
use crate::transaction::Transaction;
use folio_document::node::{self, is_link};
use folio_document::{NodeKey, NodeKind, NodeTemplate, Snapshot, TextFormat};

pub(crate) async fn edit_link<H: ModalHost>(
    ctx: &mut EditorContext<'_, H>,
    description: &str,
) -> Result<CommandOutcome, EditorError> {
    let (existing, defaults) = link_defaults(ctx.session.snapshot(), ctx.session.selection());
    if let Some(link) = &existing {
        ctx.session.set_selection(Selection::nodes(vec![link.clone()]));
    }

    let Some(ModalForm::Link(form)) = prompt(ctx.modals, ModalForm::Link(defaults.clone())).await? else {
        return Ok(CommandOutcome::Cancelled);
    };

    let selection = ctx.session.selection().clone();
    let outcome = ctx.session.update(description, |tx| match &existing {
        Some(link) => update_link(tx, link, &defaults, &form),
        None => create_link(tx, &selection, &defaults, &form),
    })?;
    Ok(outcome.into())
}

/// The link under the selection and the form values to prefill
pub(crate) fn link_defaults(snapshot: &Snapshot, selection: &Selection) -> (Option<NodeKey>, LinkForm) {
    match find_node_of_type(snapshot, selection, is_link) {
        Some(link) => {
            let mut form = LinkForm {
                text: snapshot.text_content(&link.key),
                ..LinkForm::default()
            };
            if let NodeKind::Link { url, title, target } = &link.kind {
                form.url = url.clone();
                form.title = title.clone().unwrap_or_default();
                form.target = target.clone().unwrap_or_default();
            }
            (Some(link.key.clone()), form)
        }
        None => (
            None,
            LinkForm {
                text: selected_text(snapshot, selection),
                ..LinkForm::default()
            },
        ),
    }
}

fn selected_text(snapshot: &Snapshot, selection: &Selection) -> String {
    intersected_text(snapshot, selection)
        .iter()
        .filter_map(|span| {
            let node = snapshot.get_node(&span.key)?;
            Some(
                node.text()
                    .chars()
                    .skip(span.start)
                    .take(span.end - span.start)
                    .collect::<String>(),
            )
        })
        .collect()
}

fn link_kind(form: &LinkForm) -> NodeKind {
    node::link(form.url.trim(), non_empty(&form.title), non_empty(&form.target))
}

/// Swap the link's children for one text run, keeping the first run's format
fn replace_link_text(tx: &mut Transaction<'_>, link: &NodeKey, text: &str) -> Result<(), MutationError> {
    let children = tx.children(link)?;
    let format = children
        .first()
        .and_then(|child| tx.get(child))
        .map_or(TextFormat::empty(), |child| child.format());
    for child in &children {
        tx.remove_node(child)?;
    }
    tx.insert_tree(link, 0, NodeTemplate::formatted(text, format))?;
    Ok(())
}

fn update_link(
    tx: &mut Transaction<'_>,
    link: &NodeKey,
    defaults: &LinkForm,
    form: &LinkForm,
) -> Result<(), MutationError> {
    if form.url.trim().is_empty() {
        return tx.unwrap_node(link);
    }

    tx.update_node(link, link_kind(form))?;
    if !form.text.is_empty() && form.text != defaults.text {
        replace_link_text(tx, link, &form.text)?;
    }
    tx.set_selection(Selection::nodes(vec![link.clone()]));
    Ok(())
}

/// Consecutive siblings among `keys`, each run under one parent
fn sibling_runs(tx: &Transaction<'_>, keys: &[NodeKey]) -> Result<Vec<Vec<NodeKey>>, MutationError> {
    let mut runs: Vec<Vec<NodeKey>> = Vec::new();
    let mut previous: Option<(NodeKey, usize)> = None;

    for key in keys {
        let parent = tx.parent_of(key)?;
        let index = tx.index_in_parent(key)?;
        let continues = matches!(&previous, Some((p, i)) if *p == parent && *i + 1 == index);
        match runs.last_mut() {
            Some(run) if continues => run.push(key.clone()),
            _ => runs.push(vec![key.clone()]),
        }
        previous = Some((parent, index));
    }
    Ok(runs)
}

fn create_link(
    tx: &mut Transaction<'_>,
    selection: &Selection,
    defaults: &LinkForm,
    form: &LinkForm,
) -> Result<(), MutationError> {
    if form.url.trim().is_empty() {
        return Ok(());
    }

    let spans: Vec<TextSpan> = match selection {
        Selection::Range { .. } => intersected_text(tx.base(), selection)
            .into_iter()
            .filter(|span| !span.is_collapsed())
            .collect(),
        _ => Vec::new(),
    };

    if !spans.is_empty() {
        let isolated = isolate_spans(tx, &spans)?;
        let mut links = Vec::new();
        for run in sibling_runs(tx, &isolated)? {
            links.push(tx.wrap_nodes(&run, link_kind(form))?);
        }
        if let [link] = links.as_slice() {
            if !form.text.is_empty() && form.text != defaults.text {
                replace_link_text(tx, link, &form.text)?;
            }
        }
        tx.set_selection(Selection::nodes(links));
        return Ok(());
    }

    let text = if form.text.is_empty() {
        form.url.trim()
    } else {
        form.text.as_str()
    };
    let at = insertion_point(tx, selection)?;
    let link = insert_inline(
        tx,
        at,
        NodeTemplate::new(link_kind(form), vec![NodeTemplate::text(text)]),
    )?;
    tx.set_selection(Selection::nodes(vec![link]));
    Ok(())
}
