//! HTML → document templates.
//!
//! The reader is lenient the way browsers are: unknown inline tags are
//! transparent, tags left open at the end are closed, and inline content
//! directly under the root or a details block gets an implicit paragraph.
//! Only a closing tag with no matching opener is an error.

use crate::error::{MarkupError, MarkupResult};
use crate::lexer::{close_tag_name, decode_entities, parse_open_tag, tokenize, MarkupToken, Tag};
use crate::writer::is_void;
use folio_document::node::{self, HeadingLevel};
use folio_document::{CalloutCategory, KeyGenerator, NodeKind, NodeTemplate, Snapshot, TextFormat};
use tracing::debug;

/// Parse markup into top-level block templates
pub fn parse_markup(source: &str) -> MarkupResult<Vec<NodeTemplate>> {
    let mut reader = Reader::new();

    for (token, span) in tokenize(source) {
        match token {
            MarkupToken::Comment => {}
            MarkupToken::Text(text) => reader.text(&decode_entities(text)),
            MarkupToken::OpenTag(slice) => reader.open(parse_open_tag(slice)),
            MarkupToken::CloseTag(slice) => reader.close(&close_tag_name(slice), span.start)?,
        }
    }

    Ok(reader.finish())
}

/// Parse markup into a fresh version-0 snapshot
pub fn from_markup(source: &str, keys: &mut KeyGenerator) -> MarkupResult<Snapshot> {
    let templates = parse_markup(source)?;
    Ok(Snapshot::create(templates, keys)?)
}

const BLOCK_ELEMENTS: [&str; 22] = [
    "div", "ul", "ol", "li", "pre", "table", "thead", "tbody", "tfoot", "tr", "td", "th", "hr",
    "section", "article", "header", "footer", "figure", "figcaption", "aside", "nav", "main",
];

fn mark_for(tag: &str) -> Option<TextFormat> {
    match tag {
        "strong" | "b" => Some(TextFormat::BOLD),
        "em" | "i" => Some(TextFormat::ITALIC),
        "u" => Some(TextFormat::UNDERLINE),
        "s" | "strike" | "del" => Some(TextFormat::STRIKETHROUGH),
        "sup" => Some(TextFormat::SUPERSCRIPT),
        "sub" => Some(TextFormat::SUBSCRIPT),
        "code" => Some(TextFormat::CODE),
        _ => None,
    }
}

fn block_kind(tag: &Tag) -> Option<NodeKind> {
    let name = tag.name.as_str();
    if let Some(level) = HeadingLevel::from_tag(name) {
        return Some(node::heading(level));
    }
    match name {
        "p" => Some(callout_class(tag).map_or(NodeKind::Paragraph, node::callout)),
        "blockquote" => Some(node::quote()),
        "details" => Some(node::details()),
        _ if BLOCK_ELEMENTS.contains(&name) => Some(NodeKind::Element {
            tag: name.to_string(),
        }),
        _ => None,
    }
}

fn callout_class(tag: &Tag) -> Option<CalloutCategory> {
    let classes: Vec<&str> = tag.attribute("class")?.split_whitespace().collect();
    if !classes.contains(&"callout") {
        return None;
    }
    classes.into_iter().find_map(CalloutCategory::parse)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn dimension(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().trim_end_matches("px").parse().ok())
}

enum FrameKind {
    Container(NodeTemplate),
    Mark(TextFormat),
    Summary,
    Transparent,
}

struct Frame {
    /// Closing tag that ends this frame; `None` for the root and implicit paragraphs
    tag: Option<String>,
    kind: FrameKind,
}

impl Frame {
    fn implicit(template: NodeTemplate) -> Self {
        Self {
            tag: None,
            kind: FrameKind::Container(template),
        }
    }

    fn is_implicit_paragraph(&self) -> bool {
        self.tag.is_none() && matches!(&self.kind, FrameKind::Container(t) if t.kind == NodeKind::Paragraph)
    }
}

struct Reader {
    stack: Vec<Frame>,
}

impl Reader {
    fn new() -> Self {
        Self {
            stack: vec![Frame::implicit(NodeTemplate::leaf(NodeKind::Root))],
        }
    }

    /// Marks applied by every open formatting tag, innermost winning
    fn current_format(&self) -> TextFormat {
        self.stack.iter().fold(TextFormat::empty(), |format, frame| match frame.kind {
            FrameKind::Mark(mark) => (format - mark.exclusions(false)) | mark,
            _ => format,
        })
    }

    fn nearest_container(&self) -> Option<usize> {
        self.stack
            .iter()
            .rposition(|frame| matches!(frame.kind, FrameKind::Container(_)))
    }

    fn in_summary(&self) -> Option<usize> {
        let container = self.nearest_container()?;
        self.stack[container..]
            .iter()
            .any(|frame| matches!(frame.kind, FrameKind::Summary))
            .then_some(container)
    }

    fn container_mut(&mut self, index: usize) -> Option<&mut NodeTemplate> {
        match &mut self.stack.get_mut(index)?.kind {
            FrameKind::Container(template) => Some(template),
            _ => None,
        }
    }

    /// Index of the container inline content should go into, opening an
    /// implicit paragraph when the nearest container only holds blocks
    fn inline_container(&mut self) -> usize {
        let index = self.nearest_container().unwrap_or(0);
        let needs_paragraph = match &self.stack[index].kind {
            FrameKind::Container(template) => matches!(
                template.kind,
                NodeKind::Root | NodeKind::Details { .. }
            ),
            _ => false,
        };
        if !needs_paragraph {
            return index;
        }
        self.stack
            .insert(index + 1, Frame::implicit(NodeTemplate::paragraph(vec![])));
        index + 1
    }

    fn push_inline(&mut self, template: NodeTemplate) {
        let index = self.inline_container();
        if let Some(container) = self.container_mut(index) {
            container.children.push(template);
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        if let Some(details) = self.in_summary() {
            if let Some(NodeTemplate {
                kind: NodeKind::Details { summary },
                ..
            }) = self.container_mut(details)
            {
                summary.push_str(text);
            }
            return;
        }

        if text.trim().is_empty() {
            let block_level = self.nearest_container().is_some_and(|index| {
                matches!(
                    &self.stack[index].kind,
                    FrameKind::Container(t) if matches!(t.kind, NodeKind::Root | NodeKind::Details { .. })
                )
            });
            if text.contains('\n') || block_level {
                return;
            }
        }

        let format = self.current_format();
        self.push_inline(NodeTemplate::formatted(text, format));
    }

    fn open(&mut self, tag: Tag) {
        if let Some(mark) = mark_for(&tag.name) {
            if !tag.self_closing {
                self.stack.push(Frame {
                    tag: Some(tag.name),
                    kind: FrameKind::Mark(mark),
                });
            }
            return;
        }

        if let Some(kind) = block_kind(&tag) {
            self.close_implicit_paragraph();
            let template = NodeTemplate::leaf(kind);
            if tag.self_closing || is_void(&tag.name) {
                self.attach(template);
            } else {
                self.stack.push(Frame {
                    tag: Some(tag.name),
                    kind: FrameKind::Container(template),
                });
            }
            return;
        }

        let name = tag.name.clone();
        match name.as_str() {
            "a" => {
                let link = node::link(
                    tag.attribute("href").unwrap_or_default(),
                    non_empty(tag.attribute("title")),
                    non_empty(tag.attribute("target")),
                );
                if tag.self_closing {
                    self.push_inline(NodeTemplate::leaf(link));
                } else {
                    self.inline_container();
                    self.stack.push(Frame {
                        tag: Some(tag.name),
                        kind: FrameKind::Container(NodeTemplate::leaf(link)),
                    });
                }
            }
            "img" => {
                let image = node::image(
                    tag.attribute("src").unwrap_or_default(),
                    tag.attribute("alt").unwrap_or_default(),
                    dimension(tag.attribute("width")),
                    dimension(tag.attribute("height")),
                );
                self.push_inline(NodeTemplate::leaf(image));
            }
            "br" => {
                let format = self.current_format();
                self.push_inline(NodeTemplate::formatted("\n", format));
            }
            "summary" if !tag.self_closing && self.stack_has_open_details() => {
                self.stack.push(Frame {
                    tag: Some(tag.name),
                    kind: FrameKind::Summary,
                });
            }
            name => {
                debug!("treating <{}> as transparent", name);
                if !tag.self_closing && !is_void(name) {
                    self.stack.push(Frame {
                        tag: Some(tag.name),
                        kind: FrameKind::Transparent,
                    });
                }
            }
        }
    }

    fn stack_has_open_details(&self) -> bool {
        self.nearest_container().is_some_and(|index| {
            matches!(
                &self.stack[index].kind,
                FrameKind::Container(t) if matches!(t.kind, NodeKind::Details { .. })
            )
        })
    }

    fn close(&mut self, name: &str, pos: usize) -> MarkupResult<()> {
        if is_void(name) {
            return Ok(());
        }
        let index = self
            .stack
            .iter()
            .rposition(|frame| frame.tag.as_deref() == Some(name))
            .ok_or_else(|| MarkupError::unmatched_close(name, pos))?;

        while self.stack.len() > index {
            self.pop();
        }
        Ok(())
    }

    /// Close an implicit paragraph so a block can open next to it
    fn close_implicit_paragraph(&mut self) {
        if let Some(index) = self.stack.iter().rposition(Frame::is_implicit_paragraph) {
            let container = self.nearest_container();
            if container == Some(index) {
                while self.stack.len() > index {
                    self.pop();
                }
            }
        }
    }

    fn pop(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(Frame {
            kind: FrameKind::Container(template),
            ..
        }) = self.stack.pop()
        {
            self.attach(template);
        }
    }

    /// Append a finished template to the nearest open container
    fn attach(&mut self, template: NodeTemplate) {
        if let Some(index) = self.nearest_container() {
            if let Some(container) = self.container_mut(index) {
                container.children.push(template);
            }
        }
    }

    fn finish(mut self) -> Vec<NodeTemplate> {
        while self.stack.len() > 1 {
            self.pop();
        }
        match self.stack.pop() {
            Some(Frame {
                kind: FrameKind::Container(mut root),
                ..
            }) => {
                merge_text_runs(&mut root.children);
                root.children
            }
            _ => Vec::new(),
        }
    }
}

/// Merge adjacent text runs that carry the same format
fn merge_text_runs(children: &mut Vec<NodeTemplate>) {
    let mut merged: Vec<NodeTemplate> = Vec::with_capacity(children.len());
    for mut child in children.drain(..) {
        merge_text_runs(&mut child.children);
        if let (
            Some(NodeTemplate {
                kind: NodeKind::Text { text, format },
                ..
            }),
            NodeKind::Text {
                text: next,
                format: next_format,
            },
        ) = (merged.last_mut(), &child.kind)
        {
            if format == next_format {
                text.push_str(next);
                continue;
            }
        }
        merged.push(child);
    }
    *children = merged;
}
