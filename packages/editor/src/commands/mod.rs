//! # Commands
//!
//! Toolbar and keyboard actions over an [`EditorSession`].
//!
//! A [`Command`] is data: a name, a label, an active-state rule and an
//! action. Commands that share structure (heading levels, callout
//! categories, inline marks) come out of the same factory.
//!
//! ## Suspension
//!
//! ```text
//! read selection ──▶ (await modal) ──▶ one transaction
//!        │                  │
//!        └── no transaction is open while a modal is shown
//! ```
//!
//! Commands that need input (link, image, source) capture everything they
//! read from the session before the await and only open their transaction
//! after the modal resolves. A cancelled modal commits nothing.

mod block;
mod details;
mod format;
mod image;
mod insert;
mod link;
mod registry;
mod source;

pub use registry::CommandRegistry;

use crate::errors::EditorError;
use crate::modal::{Modal, ModalForm, ModalHost, ModalOutcome};
use crate::selection::{contains_node_type, text_format_active, Selection};
use crate::session::{EditorSession, UpdateOutcome};
use folio_document::node::{self, is_details, is_image, is_link, is_paragraph, is_quote};
use folio_document::{CalloutCategory, HeadingLevel, Node, NodeKind, Snapshot, TextFormat};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Node predicate shared between a command's active state and its action
pub type NodeMatcher = Arc<dyn Fn(&Node) -> bool + Send + Sync>;

/// When a command reports itself as active (pressed)
#[derive(Clone)]
pub enum ActiveWhen {
    Never,
    /// A selected node, or one of its ancestors, matches
    Contains(NodeMatcher),
    /// Every intersected text run carries the mark
    Format(TextFormat),
}

#[derive(Clone)]
pub enum CommandAction {
    Undo,
    Redo,
    /// Toggle the top-level blocks of the selection between `kind` and paragraph
    ToggleBlock { matcher: NodeMatcher, kind: NodeKind },
    ToggleFormat(TextFormat),
    ClearFormatting,
    InsertDetails,
    EditLink,
    EditImage,
    ViewSource,
}

/// What a command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The document moved to `version` (commit, undo or redo)
    Applied { version: u64 },
    Unchanged,
    /// The user dismissed a modal
    Cancelled,
}

impl From<UpdateOutcome> for CommandOutcome {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Committed { version } => CommandOutcome::Applied { version },
            UpdateOutcome::Unchanged => CommandOutcome::Unchanged,
        }
    }
}

/// Everything a command may touch while it runs
pub struct EditorContext<'a, H: ModalHost> {
    pub session: &'a mut EditorSession,
    pub modals: &'a mut H,
}

impl<'a, H: ModalHost> EditorContext<'a, H> {
    pub fn new(session: &'a mut EditorSession, modals: &'a mut H) -> Self {
        Self { session, modals }
    }
}

#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub label: String,
    pub active: ActiveWhen,
    pub action: CommandAction,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Command {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        active: ActiveWhen,
        action: CommandAction,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            active,
            action,
        }
    }

    /// Pressed state for the given selection
    pub fn is_active(&self, snapshot: &Snapshot, selection: &Selection) -> bool {
        match &self.active {
            ActiveWhen::Never => false,
            ActiveWhen::Contains(matcher) => {
                contains_node_type(snapshot, selection, |node| matcher(node))
            }
            ActiveWhen::Format(format) => text_format_active(snapshot, selection, *format),
        }
    }

    pub async fn apply<H: ModalHost>(
        &self,
        ctx: &mut EditorContext<'_, H>,
    ) -> Result<CommandOutcome, EditorError> {
        debug!(command = %self.name, version = ctx.session.snapshot().version(), "applying command");

        match &self.action {
            CommandAction::Undo => Ok(history_outcome(ctx.session.undo(), ctx.session)),
            CommandAction::Redo => Ok(history_outcome(ctx.session.redo(), ctx.session)),
            CommandAction::ToggleBlock { matcher, kind } => {
                let selection = ctx.session.selection().clone();
                let outcome = ctx.session.update(&self.label, |tx| {
                    block::toggle_block(tx, &selection, matcher.as_ref(), kind)
                })?;
                Ok(outcome.into())
            }
            CommandAction::ToggleFormat(format) => {
                let selection = ctx.session.selection().clone();
                let config = ctx.session.config().clone();
                let outcome = ctx.session.update(&self.label, |tx| {
                    format::toggle_format(tx, &selection, *format, &config)
                })?;
                Ok(outcome.into())
            }
            CommandAction::ClearFormatting => {
                let selection = ctx.session.selection().clone();
                let outcome = ctx
                    .session
                    .update(&self.label, |tx| format::clear_formatting(tx, &selection))?;
                Ok(outcome.into())
            }
            CommandAction::InsertDetails => {
                let selection = ctx.session.selection().clone();
                let outcome = ctx
                    .session
                    .update(&self.label, |tx| details::insert_details(tx, &selection))?;
                Ok(outcome.into())
            }
            CommandAction::EditLink => link::edit_link(ctx, &self.label).await,
            CommandAction::EditImage => image::edit_image(ctx, &self.label).await,
            CommandAction::ViewSource => source::edit_source(ctx, &self.label).await,
        }
    }
}

fn history_outcome(moved: bool, session: &EditorSession) -> CommandOutcome {
    if moved {
        CommandOutcome::Applied {
            version: session.snapshot().version(),
        }
    } else {
        CommandOutcome::Unchanged
    }
}

/// Show a modal prefilled with `defaults`. `None` when the user cancels.
async fn prompt<H: ModalHost>(
    modals: &mut H,
    defaults: ModalForm,
) -> Result<Option<ModalForm>, EditorError> {
    let kind = defaults.kind();
    let modal = modals.create_modal(kind);
    match modal.show(defaults).await {
        ModalOutcome::Cancelled => {
            debug!(%kind, "modal cancelled");
            Ok(None)
        }
        ModalOutcome::Submitted(form) if form.kind() == kind => Ok(Some(form)),
        ModalOutcome::Submitted(_) => Err(EditorError::UnexpectedForm(kind)),
    }
}

/// Blank fields mean "unset"
fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// Factories

/// Block-type toggle: blocks matching `matcher` turn back into paragraphs,
/// everything else becomes `kind`
pub fn block_command(
    name: impl Into<String>,
    label: impl Into<String>,
    matcher: impl Fn(&Node) -> bool + Send + Sync + 'static,
    kind: NodeKind,
) -> Command {
    let matcher: NodeMatcher = Arc::new(matcher);
    Command::new(
        name,
        label,
        ActiveWhen::Contains(Arc::clone(&matcher)),
        CommandAction::ToggleBlock { matcher, kind },
    )
}

/// `h{level}`
pub fn heading_command(level: HeadingLevel, label: impl Into<String>) -> Command {
    block_command(
        level.tag(),
        label,
        move |node| node::is_heading_of(node, level),
        node::heading(level),
    )
}

/// `callout-{category}`
pub fn callout_command(category: CalloutCategory, label: impl Into<String>) -> Command {
    block_command(
        format!("callout-{}", category.as_str()),
        label,
        move |node| node::is_callout_of(node, category),
        node::callout(category),
    )
}

pub fn quote_command(label: impl Into<String>) -> Command {
    block_command("blockquote", label, is_quote, node::quote())
}

pub fn paragraph_command(label: impl Into<String>) -> Command {
    block_command("paragraph", label, is_paragraph, node::paragraph())
}

/// Inline mark toggle, named after the mark ("bold", "code", ...)
pub fn format_command(format: TextFormat, label: impl Into<String>) -> Command {
    let name = format.mark_name().unwrap_or("format");
    Command::new(
        name,
        label,
        ActiveWhen::Format(format),
        CommandAction::ToggleFormat(format),
    )
}

pub fn undo_command() -> Command {
    Command::new("undo", "Undo", ActiveWhen::Never, CommandAction::Undo)
}

pub fn redo_command() -> Command {
    Command::new("redo", "Redo", ActiveWhen::Never, CommandAction::Redo)
}

pub fn clear_formatting_command() -> Command {
    Command::new(
        "clear-formatting",
        "Clear formatting",
        ActiveWhen::Never,
        CommandAction::ClearFormatting,
    )
}

pub fn link_command() -> Command {
    Command::new(
        "link",
        "Insert/edit link",
        ActiveWhen::Contains(Arc::new(is_link)),
        CommandAction::EditLink,
    )
}

pub fn image_command() -> Command {
    Command::new(
        "image",
        "Insert/Edit Image",
        ActiveWhen::Contains(Arc::new(is_image)),
        CommandAction::EditImage,
    )
}

pub fn details_command() -> Command {
    Command::new(
        "details",
        "Insert collapsible block",
        ActiveWhen::Contains(Arc::new(is_details)),
        CommandAction::InsertDetails,
    )
}

pub fn source_command() -> Command {
    Command::new(
        "source",
        "Source code",
        ActiveWhen::Never,
        CommandAction::ViewSource,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::modal::NoModals;
    use crate::selection::Point;
    use folio_document::{NodeKey, NodeTemplate};

    fn session() -> EditorSession {
        EditorSession::load(
            EditorConfig::default(),
            vec![
                NodeTemplate::paragraph_text("Alpha"),
                NodeTemplate::heading(HeadingLevel::H3, vec![NodeTemplate::text("Beta")]),
            ],
        )
        .unwrap()
    }

    fn text_of(session: &EditorSession, block: usize) -> NodeKey {
        let snapshot = session.snapshot();
        let block = &snapshot.root().children[block];
        snapshot.first_leaf(block).unwrap().key.clone()
    }

    #[test]
    fn test_factories_name_commands() {
        assert_eq!(heading_command(HeadingLevel::H2, "Large Header").name, "h2");
        assert_eq!(
            callout_command(CalloutCategory::Warning, "Warning Callout").name,
            "callout-warning"
        );
        assert_eq!(format_command(TextFormat::CODE, "Inline Code").name, "code");
        assert_eq!(format_command(TextFormat::CODE, "Inline Code").label, "Inline Code");
    }

    #[test]
    fn test_block_command_active_state() {
        let session = session();
        let h3 = heading_command(HeadingLevel::H3, "Medium Header");
        let h2 = heading_command(HeadingLevel::H2, "Large Header");

        let in_heading = Selection::caret(text_of(&session, 1), 2);
        assert!(h3.is_active(session.snapshot(), &in_heading));
        assert!(!h2.is_active(session.snapshot(), &in_heading));
        assert!(!h3.is_active(session.snapshot(), &Selection::None));
    }

    #[test]
    fn test_undo_never_active() {
        let session = session();
        let selection = Selection::caret(text_of(&session, 0), 0);
        assert!(!undo_command().is_active(session.snapshot(), &selection));
    }

    #[tokio::test]
    async fn test_apply_block_toggle_round_trip() {
        let mut session = session();
        let mut modals = NoModals;
        let text = text_of(&session, 0);
        session.set_selection(Selection::range(Point::new(text.clone(), 0), Point::new(text, 5)));

        let quote = quote_command("Blockquote");
        let outcome = quote
            .apply(&mut EditorContext::new(&mut session, &mut modals))
            .await
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Applied { version: 1 });
        assert_eq!(session.to_markup(), "<blockquote>Alpha</blockquote><h3>Beta</h3>");

        quote
            .apply(&mut EditorContext::new(&mut session, &mut modals))
            .await
            .unwrap();
        assert_eq!(session.to_markup(), "<p>Alpha</p><h3>Beta</h3>");
    }

    #[tokio::test]
    async fn test_undo_redo_outcomes() {
        let mut session = session();
        let mut modals = NoModals;
        let mut ctx = EditorContext::new(&mut session, &mut modals);

        assert_eq!(undo_command().apply(&mut ctx).await.unwrap(), CommandOutcome::Unchanged);
        assert_eq!(redo_command().apply(&mut ctx).await.unwrap(), CommandOutcome::Unchanged);
    }
}
