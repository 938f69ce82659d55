//! # Folio Document
//!
//! Versioned, immutable document trees for the Folio rich-text editor.
//!
//! ## Model
//!
//! ```text
//! Snapshot (immutable, Arc-shared node records)
//!   └─ root
//!       ├─ block (paragraph | heading | quote | callout | details | element)
//!       │    └─ inline (text | link | image)
//!       └─ ...
//! ```
//!
//! Node kinds are a tagged variant ([`NodeKind`]) with free predicate and
//! constructor functions in [`node`]. Cross-node logic (transactions, selection,
//! commands) lives in `folio-editor`.

pub mod error;
pub mod format;
pub mod key;
pub mod node;
pub mod snapshot;
pub mod visitor;

pub use error::{TreeError, TreeResult};
pub use format::TextFormat;
pub use key::{get_document_seed, KeyGenerator, NodeKey, ROOT_KEY};
pub use node::{CalloutCategory, HeadingLevel, Node, NodeKind, NodeTemplate};
pub use snapshot::{insert_template, Ancestors, DocumentOrder, NodeMap, Snapshot};
pub use visitor::{walk_children, walk_node, walk_snapshot, Visitor};
