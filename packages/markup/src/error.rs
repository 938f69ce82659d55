use folio_document::{NodeKey, TreeError};
use thiserror::Error;

pub type MarkupResult<T> = Result<T, MarkupError>;

/// Errors raised while reading markup back into a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkupError {
    #[error("Unmatched closing tag </{tag}> at {pos}")]
    UnmatchedClose { tag: String, pos: usize },

    #[error("Invalid document structure: {0}")]
    Tree(#[from] TreeError),
}

impl MarkupError {
    pub fn unmatched_close(tag: impl Into<String>, pos: usize) -> Self {
        Self::UnmatchedClose {
            tag: tag.into(),
            pos,
        }
    }
}

/// A node or attribute the markup cannot carry. Conversion still succeeds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupConversionWarning {
    #[error("Unsupported tag <{tag}> on {key}, written as <div>")]
    UnsupportedTag { key: NodeKey, tag: String },

    #[error("Dropped {attribute}=\"{value}\" on {key}")]
    DroppedAttribute {
        key: NodeKey,
        attribute: &'static str,
        value: String,
    },

    #[error("Dropped {kind} {key}: {reason}")]
    DroppedNode {
        key: NodeKey,
        kind: &'static str,
        reason: &'static str,
    },
}
