//! Inline mark toggles

use crate::config::{EditorConfig, FormatPolicy};
use crate::errors::MutationError;
use crate::selection::{compare_points, intersected_text, Point, Selection, TextSpan};
use crate::transaction::Transaction;
use folio_document::{NodeKey, Snapshot, TextFormat};
use std::cmp::Ordering;

/// Non-empty spans of the text runs the selection covers. A caret covers nothing.
fn covered_spans(snapshot: &Snapshot, selection: &Selection) -> Vec<TextSpan> {
    intersected_text(snapshot, selection)
        .into_iter()
        .filter(|span| !span.is_collapsed())
        .collect()
}

fn has_format(snapshot: &Snapshot, span: &TextSpan, format: TextFormat) -> bool {
    snapshot
        .get_node(&span.key)
        .is_some_and(|node| node.format().contains(format))
}

/// Split each partially covered run at the span boundaries so that exactly
/// the covered chars sit in their own node. Returns the covered nodes in
/// document order.
pub(crate) fn isolate_spans(
    tx: &mut Transaction<'_>,
    spans: &[TextSpan],
) -> Result<Vec<NodeKey>, MutationError> {
    let mut isolated = Vec::with_capacity(spans.len());
    for span in spans {
        if span.end < span.len {
            tx.split_text(&span.key, span.end)?;
        }
        let key = if span.start > 0 {
            tx.split_text(&span.key, span.start)?
        } else {
            span.key.clone()
        };
        isolated.push(key);
    }
    Ok(isolated)
}

/// Point a range selection at the isolated runs, keeping its direction
fn reselect(
    tx: &mut Transaction<'_>,
    selection: &Selection,
    isolated: &[NodeKey],
) -> Result<(), MutationError> {
    let Selection::Range { anchor, focus } = selection else {
        return Ok(());
    };
    let (Some(first), Some(last)) = (isolated.first(), isolated.last()) else {
        return Ok(());
    };

    let start = Point::new(first.clone(), 0);
    let end = Point::new(last.clone(), tx.node(last)?.offset_len());
    let backwards = compare_points(tx.base(), anchor, focus) == Ordering::Greater;
    tx.set_selection(if backwards {
        Selection::range(end, start)
    } else {
        Selection::range(start, end)
    });
    Ok(())
}

/// Set or clear one mark over the covered text. Whether to set is decided by
/// the configured [`FormatPolicy`]; setting a mark also drops the marks it
/// excludes.
pub(crate) fn toggle_format(
    tx: &mut Transaction<'_>,
    selection: &Selection,
    format: TextFormat,
    config: &EditorConfig,
) -> Result<(), MutationError> {
    let base = tx.base();
    let spans = covered_spans(base, selection);
    let Some(first) = spans.first() else {
        return Ok(());
    };

    let set = match config.format_policy {
        FormatPolicy::Unanimous => !spans.iter().all(|span| has_format(base, span, format)),
        FormatPolicy::FirstNode => !has_format(base, first, format),
    };
    let excluded = format.exclusions(config.code_excludes_marks);

    let isolated = isolate_spans(tx, &spans)?;
    for key in &isolated {
        let current = tx.node(key)?.format();
        let next = if set {
            (current | format) - excluded
        } else {
            current - format
        };
        tx.set_format(key, next)?;
    }
    reselect(tx, selection, &isolated)
}

/// Remove every mark from the covered text
pub(crate) fn clear_formatting(
    tx: &mut Transaction<'_>,
    selection: &Selection,
) -> Result<(), MutationError> {
    let base = tx.base();
    let spans = covered_spans(base, selection);
    let formatted = spans.iter().any(|span| {
        base.get_node(&span.key)
            .is_some_and(|node| !node.format().is_empty())
    });
    if !formatted {
        return Ok(());
    }

    let isolated = isolate_spans(tx, &spans)?;
    for key in &isolated {
        tx.set_format(key, TextFormat::empty())?;
    }
    reselect(tx, selection, &isolated)
}
