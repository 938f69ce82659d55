//! # Folio Editor
//!
//! Command and selection layer for the Folio rich-text editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: toolbar, keyboard, dialogs            │
//! └─────────────────────────────────────────────┘
//!                     ↓ Command::apply / is_active
//! ┌─────────────────────────────────────────────┐
//! │ editor: commands over an EditorSession      │
//! │  - Read the selection against the snapshot  │
//! │  - Await modals between transactions        │
//! │  - Run one transaction per edit             │
//! │  - Record history, reconcile the selection  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: immutable snapshots               │
//! │ markup: snapshot ⇄ HTML                     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are immutable**: a commit produces a new snapshot, never edits one
//! 2. **One edit, one transaction, one history entry**
//! 3. **Commands are data**: factories build families of commands
//! 4. **Selections are repaired, not trusted**: unknown keys remap or clear
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{CommandRegistry, EditorConfig, EditorContext, EditorSession, NoModals};
//!
//! let mut session = EditorSession::from_markup(EditorConfig::default(), "<p>Hello</p>")?;
//! let registry = CommandRegistry::default_registry();
//! let mut modals = NoModals;
//!
//! session.set_selection(selection);
//! registry
//!     .dispatch("bold", &mut EditorContext::new(&mut session, &mut modals))
//!     .await?;
//!
//! let html = session.to_markup();
//! ```

pub mod commands;
mod config;
mod errors;
mod history;
pub mod modal;
pub mod selection;
mod session;
pub mod transaction;

pub use commands::{
    ActiveWhen, Command, CommandAction, CommandOutcome, CommandRegistry, EditorContext,
    NodeMatcher,
};
pub use config::{EditorConfig, FormatPolicy};
pub use errors::{EditorError, MutationError, SelectionResolutionError};
pub use history::{History, HistoryEntry};
pub use modal::{
    ImageForm, LinkForm, Modal, ModalForm, ModalHost, ModalKind, ModalOutcome, NoModals,
    ScriptedModals, SourceForm,
};
pub use selection::{Point, Selection};
pub use session::{EditorSession, ListenerId, UpdateEvent, UpdateKind, UpdateOutcome};
pub use transaction::{run_update, Transaction, UpdateResult};
