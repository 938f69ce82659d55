use crate::key::NodeKey;
use thiserror::Error;

pub type TreeResult<T> = Result<T, TreeError>;

/// Violations of the document tree invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Parent not found: {0}")]
    ParentNotFound(NodeKey),

    #[error("Moving {node} under {parent} would create a cycle")]
    CycleDetected { node: NodeKey, parent: NodeKey },

    #[error("Node {child} listed twice under {parent}")]
    DuplicateChild { parent: NodeKey, child: NodeKey },

    #[error("Node {child} claims parent {claimed:?} but is listed under {actual}")]
    ParentMismatch {
        child: NodeKey,
        claimed: Option<NodeKey>,
        actual: NodeKey,
    },

    #[error("Node {0} is not reachable from the root")]
    Unreachable(NodeKey),

    #[error("Node {0} cannot have children")]
    NotAContainer(NodeKey),

    #[error("Inconsistent text format on {0}")]
    InconsistentFormat(NodeKey),

    #[error("The root node cannot be {0}")]
    RootImmutable(&'static str),

    #[error("Node {0} is not text")]
    NotText(NodeKey),

    #[error("Cannot turn {from} into {to} in place")]
    KindMismatch { from: &'static str, to: &'static str },

    #[error("Nodes to wrap must share one parent")]
    NotSiblings,

    #[error("Nothing to wrap")]
    EmptyWrap,

    #[error("Offset {offset} out of bounds for {key}")]
    OffsetOutOfBounds { key: NodeKey, offset: usize },
}
