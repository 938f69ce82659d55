//! Snapshot → HTML.

use crate::error::MarkupConversionWarning;
use folio_document::{walk_children, walk_snapshot, Node, NodeKind, Snapshot, TextFormat, Visitor};
use tracing::warn;

/// Options for markup output
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupOptions {
    /// Put each block on its own line
    pub pretty: bool,
    /// Indentation string (pretty mode only)
    pub indent: String,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: "  ".to_string(),
        }
    }
}

/// Markup plus everything that could not be represented
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupOutput {
    pub markup: String,
    pub warnings: Vec<MarkupConversionWarning>,
}

/// Link targets HTML understands
const LINK_TARGETS: [&str; 4] = ["_blank", "_self", "_parent", "_top"];

/// Marks in nesting order, outermost first
const MARK_TAGS: [(TextFormat, &str); 7] = [
    (TextFormat::BOLD, "strong"),
    (TextFormat::ITALIC, "em"),
    (TextFormat::UNDERLINE, "u"),
    (TextFormat::STRIKETHROUGH, "s"),
    (TextFormat::SUPERSCRIPT, "sup"),
    (TextFormat::SUBSCRIPT, "sub"),
    (TextFormat::CODE, "code"),
];

/// Serialize a snapshot with default options
pub fn to_markup(snapshot: &Snapshot) -> String {
    to_markup_with(snapshot, &MarkupOptions::default()).markup
}

/// Serialize a snapshot, collecting conversion warnings
pub fn to_markup_with(snapshot: &Snapshot, options: &MarkupOptions) -> MarkupOutput {
    let mut writer = MarkupWriter::new(options);
    writer.visit_snapshot(snapshot);

    for warning in &writer.warnings {
        warn!("markup conversion: {}", warning);
    }

    MarkupOutput {
        markup: writer.buffer,
        warnings: writer.warnings,
    }
}

struct MarkupWriter<'o> {
    options: &'o MarkupOptions,
    depth: usize,
    buffer: String,
    warnings: Vec<MarkupConversionWarning>,
}

impl<'o> MarkupWriter<'o> {
    fn new(options: &'o MarkupOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
            warnings: Vec::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_indent(&mut self) {
        if self.options.pretty {
            for _ in 0..self.depth {
                self.buffer.push_str(&self.options.indent);
            }
        }
    }

    fn newline(&mut self) {
        if self.options.pretty {
            self.buffer.push('\n');
        }
    }

    fn open_tag(&mut self, node: &Node) -> String {
        match &node.kind {
            NodeKind::Paragraph => "p".to_string(),
            NodeKind::Heading { level } => level.tag().to_string(),
            NodeKind::Quote => "blockquote".to_string(),
            NodeKind::Callout { .. } => "p".to_string(),
            NodeKind::Details { .. } => "details".to_string(),
            NodeKind::Element { tag } => {
                if is_supported_tag(tag) {
                    tag.to_ascii_lowercase()
                } else {
                    self.warnings.push(MarkupConversionWarning::UnsupportedTag {
                        key: node.key.clone(),
                        tag: tag.clone(),
                    });
                    "div".to_string()
                }
            }
            _ => "div".to_string(),
        }
    }
}

impl Visitor for MarkupWriter<'_> {
    fn visit_snapshot(&mut self, snapshot: &Snapshot) {
        walk_snapshot(self, snapshot);
    }

    fn visit_block(&mut self, snapshot: &Snapshot, node: &Node) {
        let tag = self.open_tag(node);
        let block_children = has_block_children(snapshot, node);

        self.add_indent();
        self.add(&format!("<{}", tag));
        if let NodeKind::Callout { category } = &node.kind {
            self.add(&format!(" class=\"callout {}\"", category));
        }
        self.add(">");

        if is_void(&tag) {
            for child in snapshot.get_children(&node.key) {
                self.warnings.push(MarkupConversionWarning::DroppedNode {
                    key: child.key.clone(),
                    kind: child.kind.name(),
                    reason: "parent is a void element",
                });
            }
            self.newline();
            return;
        }

        if let NodeKind::Details { summary } = &node.kind {
            if block_children {
                self.newline();
                self.depth += 1;
                self.add_indent();
            }
            self.add(&format!("<summary>{}</summary>", escape_html(summary)));
        }

        if block_children {
            if !matches!(node.kind, NodeKind::Details { .. }) {
                self.depth += 1;
            }
            self.newline();
            walk_children(self, snapshot, node);
            self.depth -= 1;
            self.add_indent();
        } else {
            walk_children(self, snapshot, node);
        }

        self.add(&format!("</{}>", tag));
        self.newline();
    }

    fn visit_link(&mut self, snapshot: &Snapshot, node: &Node) {
        if let NodeKind::Link { url, title, target } = &node.kind {
            self.add(&format!("<a href=\"{}\"", escape_html(url)));
            if let Some(title) = title {
                self.add(&format!(" title=\"{}\"", escape_html(title)));
            }
            if let Some(target) = target {
                if LINK_TARGETS.contains(&target.as_str()) {
                    self.add(&format!(" target=\"{}\"", target));
                } else {
                    self.warnings.push(MarkupConversionWarning::DroppedAttribute {
                        key: node.key.clone(),
                        attribute: "target",
                        value: target.clone(),
                    });
                }
            }
            self.add(">");
            walk_children(self, snapshot, node);
            self.add("</a>");
        }
    }

    fn visit_text(&mut self, node: &Node) {
        let text = node.text();
        if text.is_empty() {
            return;
        }
        let format = node.format();

        for (flag, tag) in MARK_TAGS {
            if format.contains(flag) {
                self.add(&format!("<{}>", tag));
            }
        }

        let mut lines = text.split('\n');
        if let Some(first) = lines.next() {
            self.add(&escape_html(first));
        }
        for line in lines {
            self.add("<br>");
            self.add(&escape_html(line));
        }

        for (flag, tag) in MARK_TAGS.iter().rev() {
            if format.contains(*flag) {
                self.add(&format!("</{}>", tag));
            }
        }
    }

    fn visit_image(&mut self, node: &Node) {
        if let NodeKind::Image {
            src,
            alt,
            width,
            height,
        } = &node.kind
        {
            if src.is_empty() {
                self.warnings.push(MarkupConversionWarning::DroppedNode {
                    key: node.key.clone(),
                    kind: "image",
                    reason: "no source",
                });
                return;
            }

            self.add(&format!(
                "<img src=\"{}\" alt=\"{}\"",
                escape_html(src),
                escape_html(alt)
            ));
            if let Some(width) = width {
                self.add(&format!(" width=\"{}\"", width));
            }
            if let Some(height) = height {
                self.add(&format!(" height=\"{}\"", height));
            }
            self.add(">");
        }
    }
}

fn has_block_children(snapshot: &Snapshot, node: &Node) -> bool {
    snapshot
        .get_children(&node.key)
        .iter()
        .any(|child| !child.kind.is_inline())
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn is_supported_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    let well_formed = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric());
    well_formed
        && !matches!(
            tag.to_ascii_lowercase().as_str(),
            "script" | "style" | "iframe" | "object" | "embed" | "html" | "head" | "body"
        )
}

pub(crate) fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "img"
            | "input"
            | "br"
            | "hr"
            | "meta"
            | "link"
            | "area"
            | "base"
            | "col"
            | "embed"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_document::node::{self, HeadingLevel};
    use folio_document::{CalloutCategory, KeyGenerator, NodeTemplate};

    fn snapshot(children: Vec<NodeTemplate>) -> Snapshot {
        let mut keys = KeyGenerator::new("writer");
        Snapshot::create(children, &mut keys).unwrap()
    }

    #[test]
    fn test_blocks_and_marks() {
        let doc = snapshot(vec![
            NodeTemplate::heading(HeadingLevel::H2, vec![NodeTemplate::text("Title")]),
            NodeTemplate::paragraph(vec![
                NodeTemplate::text("Plain "),
                NodeTemplate::formatted("bold", TextFormat::BOLD | TextFormat::ITALIC),
            ]),
        ]);

        assert_eq!(
            to_markup(&doc),
            "<h2>Title</h2><p>Plain <strong><em>bold</em></strong></p>"
        );
    }

    #[test]
    fn test_callout_details_link_image() {
        let doc = snapshot(vec![
            NodeTemplate::callout(CalloutCategory::Warning, vec![NodeTemplate::text("Careful")]),
            NodeTemplate::details(vec![NodeTemplate::paragraph(vec![
                NodeTemplate::new(
                    node::link("https://a.b/?x=1&y=2", Some("T".into()), Some("_blank".into())),
                    vec![NodeTemplate::text("go")],
                ),
                NodeTemplate::leaf(node::image("cat.png", "A cat", Some(300), None)),
            ])]),
        ]);

        assert_eq!(
            to_markup(&doc),
            "<p class=\"callout warning\">Careful</p>\
             <details><summary></summary><p><a href=\"https://a.b/?x=1&amp;y=2\" title=\"T\" target=\"_blank\">go</a>\
             <img src=\"cat.png\" alt=\"A cat\" width=\"300\"></p></details>"
        );
    }

    #[test]
    fn test_escaping_and_line_breaks() {
        let doc = snapshot(vec![NodeTemplate::paragraph_text("a < b\nc & d")]);
        assert_eq!(to_markup(&doc), "<p>a &lt; b<br>c &amp; d</p>");
    }

    #[test]
    fn test_warnings_for_unrepresentable_nodes() {
        let doc = snapshot(vec![
            NodeTemplate::new(
                NodeKind::Element {
                    tag: "script".into(),
                },
                vec![],
            ),
            NodeTemplate::paragraph(vec![
                NodeTemplate::leaf(node::image("", "missing", None, None)),
                NodeTemplate::new(
                    node::link("/x", None, Some("popup".into())),
                    vec![NodeTemplate::text("x")],
                ),
            ]),
        ]);

        let output = to_markup_with(&doc, &MarkupOptions::default());
        assert_eq!(output.markup, "<div></div><p><a href=\"/x\">x</a></p>");
        assert_eq!(output.warnings.len(), 3);
        assert!(matches!(
            output.warnings[0],
            MarkupConversionWarning::UnsupportedTag { .. }
        ));
    }

    #[test]
    fn test_void_element_children_are_reported() {
        let doc = snapshot(vec![NodeTemplate::new(
            NodeKind::Element { tag: "hr".into() },
            vec![NodeTemplate::paragraph_text("lost")],
        )]);

        let output = to_markup_with(&doc, &MarkupOptions::default());
        assert_eq!(output.markup, "<hr>");
        assert_eq!(output.warnings.len(), 1);
        assert!(matches!(
            output.warnings[0],
            MarkupConversionWarning::DroppedNode { kind: "paragraph", .. }
        ));
    }

    #[test]
    fn test_pretty_output_indents_nested_blocks() {
        let doc = snapshot(vec![NodeTemplate::details(vec![NodeTemplate::paragraph_text(
            "Inside",
        )])]);

        let options = MarkupOptions {
            pretty: true,
            ..Default::default()
        };
        assert_eq!(
            to_markup_with(&doc, &options).markup,
            "<details>\n  <summary></summary>\n  <p>Inside</p>\n</details>\n"
        );
    }

    #[test]
    fn test_deterministic() {
        let doc = snapshot(vec![
            NodeTemplate::quote(vec![NodeTemplate::text("q")]),
            NodeTemplate::paragraph_text("p"),
        ]);
        assert_eq!(to_markup(&doc), to_markup(&doc));
    }
}
