//! # Folio Markup
//!
//! Converts document snapshots to and from HTML.
//!
//! ```text
//! Snapshot ──writer──▶ "<h2>Title</h2><p>Body <strong>bold</strong></p>"
//!    ▲                                   │
//!    └────────────reader◀───lexer────────┘
//! ```
//!
//! Writing is deterministic: the same snapshot always yields the same string.
//! Nodes the markup cannot carry are reported as [`MarkupConversionWarning`]s
//! instead of failing the conversion.

pub mod error;
pub mod lexer;
pub mod reader;
pub mod writer;

pub use error::{MarkupConversionWarning, MarkupError, MarkupResult};
pub use reader::{from_markup, parse_markup};
pub use writer::{to_markup, to_markup_with, MarkupOptions, MarkupOutput};
