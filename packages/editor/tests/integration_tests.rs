//! Integration tests for the editor crate

use folio_document::{NodeKey, NodeTemplate, Snapshot};
use folio_editor::{
    CommandOutcome, CommandRegistry, EditorConfig, EditorContext, EditorSession, LinkForm,
    ModalForm, ModalOutcome, NoModals, Point, ScriptedModals, Selection, SourceForm,
};

fn session(markup: &str) -> EditorSession {
    EditorSession::from_markup(EditorConfig::default(), markup).unwrap()
}

fn key_at(session: &EditorSession, path: &[usize]) -> NodeKey {
    session.snapshot().node_at_path(path).unwrap().key.clone()
}

async fn dispatch(
    registry: &CommandRegistry,
    session: &mut EditorSession,
    modals: &mut ScriptedModals,
    name: &str,
) -> CommandOutcome {
    registry
        .dispatch(name, &mut EditorContext::new(session, modals))
        .await
        .unwrap()
}

/// Text runs of every top-level block, as (markup tag-free text, format bits)
fn runs(snapshot: &Snapshot) -> Vec<(String, u8)> {
    snapshot
        .document_order()
        .filter(|node| folio_document::node::is_text(node))
        .map(|node| (node.text().to_string(), node.format().bits()))
        .collect()
}

#[tokio::test]
async fn test_heading_over_two_paragraphs_is_one_commit() {
    let registry = CommandRegistry::default_registry();
    let mut session = session("<p>A</p><p>B</p>");
    let mut modals = ScriptedModals::new();
    session.set_selection(Selection::range(
        Point::new(key_at(&session, &[0, 0]), 0),
        Point::new(key_at(&session, &[1, 0]), 1),
    ));

    let outcome = dispatch(&registry, &mut session, &mut modals, "h2").await;

    assert_eq!(outcome, CommandOutcome::Applied { version: 1 });
    assert_eq!(session.to_markup(), "<h2>A</h2><h2>B</h2>");
    assert_eq!(session.history().undo_levels(), 1);
    assert!(registry
        .is_active("h2", session.snapshot(), session.selection())
        .unwrap());
}

#[tokio::test]
async fn test_block_toggles_inside_nested_containers() {
    let registry = CommandRegistry::default_registry();
    let mut session = session("<blockquote><p>x</p></blockquote>");
    let mut modals = ScriptedModals::new();
    session.set_selection(Selection::caret(key_at(&session, &[0, 0, 0]), 1));

    assert!(registry
        .is_active("paragraph", session.snapshot(), session.selection())
        .unwrap());
    let outcome = dispatch(&registry, &mut session, &mut modals, "paragraph").await;
    assert_eq!(outcome, CommandOutcome::Unchanged);
    assert_eq!(session.to_markup(), "<blockquote><p>x</p></blockquote>");

    dispatch(&registry, &mut session, &mut modals, "h2").await;
    let markup = session.to_markup();
    assert_eq!(markup, "<blockquote><h2>x</h2></blockquote>");
    assert_eq!(folio_markup::to_markup(&reread(&markup)), markup);

    dispatch(&registry, &mut session, &mut modals, "blockquote").await;
    assert_eq!(session.to_markup(), "<h2>x</h2>");

    let mut session = self::session("<details><summary>More</summary><p>a</p></details>");
    session.set_selection(Selection::caret(key_at(&session, &[0, 0, 0]), 0));
    dispatch(&registry, &mut session, &mut modals, "h2").await;
    assert_eq!(
        session.to_markup(),
        "<details><summary>More</summary><h2>a</h2></details>"
    );
}

fn reread(markup: &str) -> Snapshot {
    let mut keys = folio_document::KeyGenerator::new("reread");
    folio_markup::from_markup(markup, &mut keys).unwrap()
}

#[tokio::test]
async fn test_details_without_selection_appends() {
    let registry = CommandRegistry::default_registry();
    let mut session = session("<p>A</p><p>B</p>");
    let mut modals = ScriptedModals::new();

    dispatch(&registry, &mut session, &mut modals, "details").await;

    assert_eq!(
        session.to_markup(),
        "<p>A</p><p>B</p><details><summary></summary></details>"
    );
    let last = session.snapshot().root().children.last().unwrap().clone();
    assert!(folio_document::node::is_details(
        session.snapshot().get_node(&last).unwrap()
    ));
}

#[tokio::test]
async fn test_link_inside_existing_link_prefills_modal() {
    let registry = CommandRegistry::default_registry();
    let mut session = session(
        r#"<p>See <a href="https://docs.example" title="Docs" target="_blank">the docs</a></p>"#,
    );
    let mut modals = ScriptedModals::new();
    session.set_selection(Selection::caret(key_at(&session, &[0, 1, 0]), 3));

    assert!(registry
        .is_active("link", session.snapshot(), session.selection())
        .unwrap());

    modals.respond(ModalOutcome::Cancelled);
    let before = session.snapshot().clone();
    let outcome = dispatch(&registry, &mut session, &mut modals, "link").await;

    assert_eq!(outcome, CommandOutcome::Cancelled);
    assert_eq!(
        modals.shown(),
        vec![ModalForm::Link(LinkForm {
            url: "https://docs.example".to_string(),
            text: "the docs".to_string(),
            title: "Docs".to_string(),
            target: "_blank".to_string(),
        })]
    );
    // prefill happened before any mutation, and cancelling committed nothing
    assert_eq!(session.snapshot(), &before);
    assert!(!session.can_undo());
}

#[tokio::test]
async fn test_undo_redo_restore_exact_state() {
    let registry = CommandRegistry::default_registry();
    let mut session = session("<p>Hello world</p>");
    let mut modals = ScriptedModals::new();
    let text = key_at(&session, &[0, 0]);
    session.set_selection(Selection::range(Point::new(text.clone(), 0), Point::new(text, 5)));

    dispatch(&registry, &mut session, &mut modals, "bold").await;
    let committed = (session.snapshot().clone(), session.selection().clone());

    assert!(matches!(
        dispatch(&registry, &mut session, &mut modals, "undo").await,
        CommandOutcome::Applied { version: 0 }
    ));
    assert_eq!(session.to_markup(), "<p>Hello world</p>");

    dispatch(&registry, &mut session, &mut modals, "redo").await;
    assert_eq!((session.snapshot().clone(), session.selection().clone()), committed);
    assert_eq!(session.to_markup(), "<p><strong>Hello</strong> world</p>");
}

#[tokio::test]
async fn test_double_format_toggle_is_content_identical() {
    let registry = CommandRegistry::default_registry();
    let mut session = session("<p>one <em>two</em> three</p>");
    let mut modals = ScriptedModals::new();
    let original = runs(session.snapshot());
    session.set_selection(Selection::range(
        Point::new(key_at(&session, &[0, 0]), 2),
        Point::new(key_at(&session, &[0, 2]), 3),
    ));

    dispatch(&registry, &mut session, &mut modals, "underline").await;
    assert!(registry
        .is_active("underline", session.snapshot(), session.selection())
        .unwrap());
    dispatch(&registry, &mut session, &mut modals, "underline").await;

    let text: String = runs(session.snapshot()).into_iter().map(|(text, _)| text).collect();
    let original_text: String = original.iter().map(|(text, _)| text.as_str()).collect();
    assert_eq!(text, original_text);
    assert_eq!(session.to_markup(), "<p>one <em>two</em> three</p>");
}

#[tokio::test]
async fn test_block_toggle_round_trip() {
    let registry = CommandRegistry::default_registry();
    let mut session = session("<p>Note</p>");
    let mut modals = ScriptedModals::new();
    session.set_selection(Selection::caret(key_at(&session, &[0, 0]), 2));

    dispatch(&registry, &mut session, &mut modals, "callout-warning").await;
    assert_eq!(session.to_markup(), r#"<p class="callout warning">Note</p>"#);

    dispatch(&registry, &mut session, &mut modals, "callout-warning").await;
    assert_eq!(session.to_markup(), "<p>Note</p>");
    assert_eq!(session.history().undo_levels(), 2);
}

#[tokio::test]
async fn test_clear_formatting_zeroes_runs() {
    let registry = CommandRegistry::default_registry();
    let mut session = session("<p><strong>bold</strong> <u><s>marked</s></u></p>");
    let mut modals = ScriptedModals::new();
    let paragraph = key_at(&session, &[0]);
    session.set_selection(Selection::nodes(vec![paragraph]));

    dispatch(&registry, &mut session, &mut modals, "clear-formatting").await;

    assert!(runs(session.snapshot()).iter().all(|(_, bits)| *bits == 0));
    assert_eq!(session.to_markup(), "<p>bold marked</p>");
}

#[tokio::test]
async fn test_source_submission_is_one_history_entry() {
    let registry = CommandRegistry::default_registry();
    let mut session = session("<p>Draft</p>");
    let mut modals = ScriptedModals::new();
    modals.respond(ModalOutcome::Submitted(ModalForm::Source(SourceForm {
        source: "<h3>Title</h3><blockquote>Quote</blockquote>".to_string(),
    })));

    dispatch(&registry, &mut session, &mut modals, "source").await;

    assert_eq!(session.to_markup(), "<h3>Title</h3><blockquote>Quote</blockquote>");
    assert_eq!(session.history().undo_levels(), 1);
    assert!(session.undo());
    assert_eq!(session.to_markup(), "<p>Draft</p>");
}

#[tokio::test]
async fn test_history_limit_evicts_oldest() -> anyhow::Result<()> {
    let config = EditorConfig::from_json(r#"{ "historyLimit": 2 }"#)?;
    let mut session = EditorSession::from_markup(config, "<p>x</p>")?;
    let registry = CommandRegistry::default_registry();
    let mut modals = NoModals;
    session.set_selection(Selection::caret(key_at(&session, &[0, 0]), 0));

    for name in ["h2", "h3", "h4"] {
        registry
            .dispatch(name, &mut EditorContext::new(&mut session, &mut modals))
            .await?;
    }

    assert_eq!(session.history().undo_levels(), 2);
    assert!(session.undo());
    assert!(session.undo());
    assert!(!session.undo());
    // the oldest commit is gone, so undo stops at the first heading
    assert_eq!(session.to_markup(), "<h2>x</h2>");
    Ok(())
}

#[test]
fn test_to_markup_is_deterministic() {
    let session = session(
        r#"<h2>T</h2><p>a <strong>b</strong> <a href="/x">c</a></p><details><summary>S</summary><p>d</p></details>"#,
    );
    let first = session.to_markup();
    for _ in 0..5 {
        assert_eq!(session.to_markup(), first);
    }
}

#[test]
fn test_accepted_transactions_keep_invariants() {
    let mut session = session("<p>A</p><blockquote>B</blockquote><p>C</p>");
    let first = key_at(&session, &[0]);
    let quote = key_at(&session, &[1]);
    let last = key_at(&session, &[2]);

    session
        .update("shuffle", |tx| {
            tx.move_node(&last, &quote, 0)?;
            let details = tx.wrap_nodes(&[first.clone(), quote.clone()], folio_document::node::details())?;
            tx.insert_tree(&details, 0, NodeTemplate::paragraph_text("Intro"))?;
            Ok(())
        })
        .unwrap();

    assert!(session.snapshot().validate().is_ok());
    assert_eq!(session.snapshot().root().children.len(), 1);
}

#[test]
fn test_rejected_transaction_leaves_document() {
    let mut session = session("<p>A</p>");
    let paragraph = key_at(&session, &[0]);
    let text = key_at(&session, &[0, 0]);

    let result = session.update("cycle", |tx| tx.move_node(&paragraph, &text, 0));

    assert!(result.is_err());
    assert_eq!(session.to_markup(), "<p>A</p>");
    assert_eq!(session.snapshot().version(), 0);
}
