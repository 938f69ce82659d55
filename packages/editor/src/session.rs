//! # Editor Session
//!
//! The owned, process-wide editing state: current snapshot, selection,
//! history and key generator. Created on load, consumed on close.
//!
//! Every mutation goes through [`EditorSession::update`], which runs one
//! transaction, pushes exactly one history entry when something changed,
//! and notifies subscribers.

use crate::config::EditorConfig;
use crate::errors::{EditorError, MutationError};
use crate::history::{History, HistoryEntry};
use crate::selection::{sanitize, Selection};
use crate::transaction::{run_update, Transaction};
use folio_document::{KeyGenerator, NodeTemplate, Snapshot};
use folio_markup::{from_markup, to_markup_with, MarkupOptions};
use tracing::{debug, instrument, warn};

/// What happened to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Commit,
    Undo,
    Redo,
}

/// Delivered to subscribers after the session state changed
#[derive(Debug, Clone)]
pub struct UpdateEvent {
    pub kind: UpdateKind,
    pub snapshot: Snapshot,
    pub selection: Selection,
    pub description: Option<String>,
}

/// Result of [`EditorSession::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Committed { version: u64 },
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&UpdateEvent)>;

pub struct EditorSession {
    /// Unique session identifier
    id: String,
    config: EditorConfig,
    snapshot: Snapshot,
    selection: Selection,
    history: History,
    keys: KeyGenerator,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl EditorSession {
    /// Session over an empty document (one empty paragraph)
    pub fn new(config: EditorConfig) -> Self {
        let mut keys = KeyGenerator::new(&config.document_name);
        let snapshot = Snapshot::empty(&mut keys);
        Self::assemble(config, snapshot, keys)
    }

    /// Session over a document built from templates
    pub fn load(config: EditorConfig, blocks: Vec<NodeTemplate>) -> Result<Self, EditorError> {
        let mut keys = KeyGenerator::new(&config.document_name);
        let snapshot = if blocks.is_empty() {
            Snapshot::empty(&mut keys)
        } else {
            Snapshot::create(blocks, &mut keys)?
        };
        Ok(Self::assemble(config, snapshot, keys))
    }

    /// Session over a document read from markup
    pub fn from_markup(config: EditorConfig, markup: &str) -> Result<Self, EditorError> {
        let mut keys = KeyGenerator::new(&config.document_name);
        let parsed = from_markup(markup, &mut keys)?;
        let snapshot = if parsed.is_empty() {
            Snapshot::empty(&mut keys)
        } else {
            parsed
        };
        Ok(Self::assemble(config, snapshot, keys))
    }

    fn assemble(config: EditorConfig, snapshot: Snapshot, keys: KeyGenerator) -> Self {
        let id = format!("session-{}", keys.seed());
        debug!(session = %id, nodes = snapshot.len(), "editor session opened");
        Self {
            id,
            history: History::with_max_levels(config.history_limit),
            config,
            snapshot,
            selection: Selection::None,
            keys,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Replace the selection. Keys the snapshot does not have are recovered
    /// locally: offsets clamp, unknown keys clear.
    pub fn set_selection(&mut self, selection: Selection) {
        if let Err(err) = selection.validate(&self.snapshot) {
            warn!("selection repaired: {}", err);
        }
        self.selection = sanitize(selection, &self.snapshot);
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Run one transaction against the current snapshot
    #[instrument(skip(self, f), fields(session = %self.id, version = self.snapshot.version()))]
    pub fn update<F>(&mut self, description: &str, f: F) -> Result<UpdateOutcome, MutationError>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<(), MutationError>,
    {
        let result = run_update(&self.snapshot, &self.selection, &mut self.keys, f)?;

        if !result.changed {
            self.selection = result.selection;
            return Ok(UpdateOutcome::Unchanged);
        }

        let version = result.snapshot.version();
        self.history.push(HistoryEntry {
            before: self.snapshot.clone(),
            after: result.snapshot.clone(),
            selection_before: self.selection.clone(),
            selection_after: result.selection.clone(),
            description: Some(description.to_string()),
        });
        self.snapshot = result.snapshot;
        self.selection = result.selection;

        self.notify(UpdateKind::Commit, Some(description.to_string()));
        Ok(UpdateOutcome::Committed { version })
    }

    /// Restore the state before the last commit. False at the bottom of history.
    pub fn undo(&mut self) -> bool {
        let description = self.history.undo_description().map(str::to_string);
        match self.history.undo() {
            Some((snapshot, selection)) => {
                self.snapshot = snapshot;
                self.selection = selection;
                self.notify(UpdateKind::Undo, description);
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone commit. False at the top of history.
    pub fn redo(&mut self) -> bool {
        let description = self.history.redo_description().map(str::to_string);
        match self.history.redo() {
            Some((snapshot, selection)) => {
                self.snapshot = snapshot;
                self.selection = selection;
                self.notify(UpdateKind::Redo, description);
                true
            }
            None => false,
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&UpdateEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, kind: UpdateKind, description: Option<String>) {
        if self.listeners.is_empty() {
            return;
        }
        let event = UpdateEvent {
            kind,
            snapshot: self.snapshot.clone(),
            selection: self.selection.clone(),
            description,
        };
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    /// Markup of the current snapshot
    pub fn to_markup(&self) -> String {
        self.to_markup_with(&MarkupOptions::default())
    }

    pub fn to_markup_with(&self, options: &MarkupOptions) -> String {
        to_markup_with(&self.snapshot, options).markup
    }

    /// End the session, handing back the final snapshot
    pub fn close(self) -> Snapshot {
        debug!(session = %self.id, version = self.snapshot.version(), "editor session closed");
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_document::node;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> EditorSession {
        EditorSession::load(
            EditorConfig::default(),
            vec![
                NodeTemplate::paragraph_text("A"),
                NodeTemplate::paragraph_text("B"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_session_creation() {
        let session = EditorSession::new(EditorConfig::default());
        assert!(session.id().starts_with("session-"));
        assert_eq!(session.snapshot().root().children.len(), 1);
        assert!(session.selection().is_none());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_update_pushes_one_entry_and_notifies() {
        let mut session = session();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        session.subscribe(move |event| sink.borrow_mut().push((event.kind, event.snapshot.version())));

        let first = session.snapshot().root().children[0].clone();
        let outcome = session
            .update("quote", |tx| tx.update_node(&first, node::quote()))
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Committed { version: 1 });
        assert_eq!(session.history().undo_levels(), 1);
        assert_eq!(session.history().undo_description(), Some("quote"));
        assert_eq!(*events.borrow(), vec![(UpdateKind::Commit, 1)]);
    }

    #[test]
    fn test_unchanged_update_skips_history() {
        let mut session = session();
        let outcome = session.update("nothing", |_| Ok(())).unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_rejected_update_keeps_document() {
        let mut session = session();
        let before = session.snapshot().clone();
        let result = session.update("bad", |tx| {
            let first = tx.base().root().children[0].clone();
            tx.remove_node(&first)?;
            Err(MutationError::rejected("changed my mind"))
        });

        assert_eq!(result, Err(MutationError::rejected("changed my mind")));
        assert_eq!(session.snapshot(), &before);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_undo_redo_restore_snapshot_and_selection() {
        let mut session = session();
        let first = session.snapshot().root().children[0].clone();
        session.set_selection(Selection::nodes(vec![first.clone()]));

        session
            .update("remove", |tx| tx.remove_node(&first))
            .unwrap();
        let after = (session.snapshot().clone(), session.selection().clone());

        assert!(session.undo());
        assert_eq!(session.selection(), &Selection::nodes(vec![first]));
        assert!(!session.undo());

        assert!(session.redo());
        assert_eq!((session.snapshot().clone(), session.selection().clone()), after);
        assert!(!session.redo());
    }

    #[test]
    fn test_set_selection_repairs_unknown_keys() {
        let mut session = session();
        session.set_selection(Selection::caret("missing", 4));
        assert_eq!(session.selection(), &Selection::None);
    }

    #[test]
    fn test_unsubscribe() {
        let mut session = session();
        let id = session.subscribe(|_| {});
        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));
    }

    #[test]
    fn test_from_markup_and_close() {
        let session = EditorSession::from_markup(EditorConfig::default(), "<h2>T</h2>").unwrap();
        assert_eq!(session.to_markup(), "<h2>T</h2>");
        let snapshot = session.close();
        assert_eq!(snapshot.version(), 0);

        let empty = EditorSession::from_markup(EditorConfig::default(), "").unwrap();
        assert_eq!(empty.to_markup(), "<p></p>");
    }
}
