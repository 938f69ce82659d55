//! Error types for the editor

use crate::modal::ModalKind;
use folio_document::{NodeKey, TreeError};
use folio_markup::MarkupError;
use thiserror::Error;

/// A transaction was rejected. The base snapshot stays current.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Invalid tree: {0}")]
    Tree(#[from] TreeError),

    #[error("Edit rejected: {0}")]
    Rejected(String),
}

impl MutationError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// A selection points at something the current snapshot does not have.
/// Always recovered locally by remapping or clearing the selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionResolutionError {
    #[error("Selected node {0} does not exist")]
    UnknownKey(NodeKey),

    #[error("Offset {offset} is past the end of {key} (length {len})")]
    OffsetOutOfRange {
        key: NodeKey,
        offset: usize,
        len: usize,
    },
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("The {0} modal returned a form of another kind")]
    UnexpectedForm(ModalKind),
}

impl From<TreeError> for EditorError {
    fn from(e: TreeError) -> Self {
        EditorError::Mutation(MutationError::Tree(e))
    }
}
