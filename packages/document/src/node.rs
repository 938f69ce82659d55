//! Node kinds, predicates and constructors.
//!
//! Node kinds are plain data. Anything that spans more than one node lives in
//! the editor's transaction and command layers.

use crate::format::TextFormat;
use crate::key::NodeKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Heading level (h1..h6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const H1: HeadingLevel = HeadingLevel(1);
    pub const H2: HeadingLevel = HeadingLevel(2);
    pub const H3: HeadingLevel = HeadingLevel(3);
    pub const H4: HeadingLevel = HeadingLevel(4);
    pub const H5: HeadingLevel = HeadingLevel(5);
    pub const H6: HeadingLevel = HeadingLevel(6);

    pub fn new(level: u8) -> Option<Self> {
        (1..=6).contains(&level).then_some(HeadingLevel(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn tag(self) -> &'static str {
        match self.0 {
            1 => "h1",
            2 => "h2",
            3 => "h3",
            4 => "h4",
            5 => "h5",
            _ => "h6",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let digit = tag.strip_prefix('h').or_else(|| tag.strip_prefix('H'))?;
        digit.parse::<u8>().ok().and_then(HeadingLevel::new)
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        HeadingLevel::new(value).ok_or_else(|| format!("invalid heading level: {}", value))
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.0
    }
}

/// Callout categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutCategory {
    Info,
    Danger,
    Warning,
    Success,
}

impl CalloutCategory {
    pub const ALL: [CalloutCategory; 4] = [
        CalloutCategory::Info,
        CalloutCategory::Danger,
        CalloutCategory::Warning,
        CalloutCategory::Success,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CalloutCategory::Info => "info",
            CalloutCategory::Danger => "danger",
            CalloutCategory::Warning => "warning",
            CalloutCategory::Success => "success",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        CalloutCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
    }
}

impl fmt::Display for CalloutCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged node variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Root,

    Text {
        text: String,
        #[serde(default)]
        format: TextFormat,
    },

    Paragraph,

    Heading { level: HeadingLevel },

    Quote,

    Callout { category: CalloutCategory },

    Link {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },

    Image {
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },

    /// Collapsible block
    Details {
        #[serde(default)]
        summary: String,
    },

    /// Generic container for block tags without a dedicated kind
    Element { tag: String },
}

impl NodeKind {
    /// Leaves never own children
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Text { .. } | NodeKind::Image { .. })
    }

    pub fn is_container(&self) -> bool {
        !self.is_leaf()
    }

    /// Inline kinds live inside blocks
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text { .. } | NodeKind::Image { .. } | NodeKind::Link { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Text { .. } => "text",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::Quote => "quote",
            NodeKind::Callout { .. } => "callout",
            NodeKind::Link { .. } => "link",
            NodeKind::Image { .. } => "image",
            NodeKind::Details { .. } => "details",
            NodeKind::Element { .. } => "element",
        }
    }
}

/// A node record inside a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: NodeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeKey>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn new(key: NodeKey, parent: Option<NodeKey>, kind: NodeKind) -> Self {
        Self {
            key,
            parent,
            children: Vec::new(),
            kind,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    /// Text content of a text node; empty for any other kind
    pub fn text(&self) -> &str {
        match &self.kind {
            NodeKind::Text { text, .. } => text,
            _ => "",
        }
    }

    pub fn format(&self) -> TextFormat {
        match &self.kind {
            NodeKind::Text { format, .. } => *format,
            _ => TextFormat::empty(),
        }
    }

    /// Length used for point offsets: chars for text, children for containers
    pub fn offset_len(&self) -> usize {
        match &self.kind {
            NodeKind::Text { text, .. } => text.chars().count(),
            _ => self.children.len(),
        }
    }
}

// Predicates

pub fn is_root(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Root)
}

pub fn is_text(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Text { .. })
}

pub fn is_paragraph(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Paragraph)
}

pub fn is_heading(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Heading { .. })
}

pub fn is_heading_of(node: &Node, level: HeadingLevel) -> bool {
    matches!(node.kind, NodeKind::Heading { level: l } if l == level)
}

pub fn is_quote(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Quote)
}

pub fn is_callout(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Callout { .. })
}

pub fn is_callout_of(node: &Node, category: CalloutCategory) -> bool {
    matches!(node.kind, NodeKind::Callout { category: c } if c == category)
}

pub fn is_link(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Link { .. })
}

pub fn is_image(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Image { .. })
}

pub fn is_details(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Details { .. })
}

pub fn is_element_of(node: &Node, tag: &str) -> bool {
    matches!(&node.kind, NodeKind::Element { tag: t } if t == tag)
}

// Constructors

pub fn paragraph() -> NodeKind {
    NodeKind::Paragraph
}

pub fn heading(level: HeadingLevel) -> NodeKind {
    NodeKind::Heading { level }
}

pub fn quote() -> NodeKind {
    NodeKind::Quote
}

pub fn callout(category: CalloutCategory) -> NodeKind {
    NodeKind::Callout { category }
}

pub fn details() -> NodeKind {
    NodeKind::Details {
        summary: String::new(),
    }
}

pub fn text(content: impl Into<String>) -> NodeKind {
    NodeKind::Text {
        text: content.into(),
        format: TextFormat::empty(),
    }
}

pub fn formatted_text(content: impl Into<String>, format: TextFormat) -> NodeKind {
    NodeKind::Text {
        text: content.into(),
        format,
    }
}

pub fn link(url: impl Into<String>, title: Option<String>, target: Option<String>) -> NodeKind {
    NodeKind::Link {
        url: url.into(),
        title,
        target,
    }
}

pub fn image(
    src: impl Into<String>,
    alt: impl Into<String>,
    width: Option<u32>,
    height: Option<u32>,
) -> NodeKind {
    NodeKind::Image {
        src: src.into(),
        alt: alt.into(),
        width,
        height,
    }
}

/// Key-less tree description used to build snapshots and insert subtrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeTemplate>,
}

impl NodeTemplate {
    pub fn new(kind: NodeKind, children: Vec<NodeTemplate>) -> Self {
        Self { kind, children }
    }

    pub fn leaf(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::leaf(text(content))
    }

    pub fn formatted(content: impl Into<String>, format: TextFormat) -> Self {
        Self::leaf(formatted_text(content, format))
    }

    pub fn paragraph(children: Vec<NodeTemplate>) -> Self {
        Self::new(paragraph(), children)
    }

    /// Paragraph holding a single plain text run
    pub fn paragraph_text(content: impl Into<String>) -> Self {
        Self::paragraph(vec![Self::text(content)])
    }

    pub fn heading(level: HeadingLevel, children: Vec<NodeTemplate>) -> Self {
        Self::new(heading(level), children)
    }

    pub fn quote(children: Vec<NodeTemplate>) -> Self {
        Self::new(quote(), children)
    }

    pub fn callout(category: CalloutCategory, children: Vec<NodeTemplate>) -> Self {
        Self::new(callout(category), children)
    }

    pub fn details(children: Vec<NodeTemplate>) -> Self {
        Self::new(details(), children)
    }

    pub fn link(url: impl Into<String>, children: Vec<NodeTemplate>) -> Self {
        Self::new(link(url, None, None), children)
    }

    /// Number of nodes in this template, including itself
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(NodeTemplate::size).sum::<usize>()
    }
}
