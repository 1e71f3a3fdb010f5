//! Plain-text extraction.
//!
//! Markup is dropped and entities escaped during parsing are decoded again.
//! Footnote references, progress cookies and timestamps keep their source
//! spelling, so parsing the extracted text finds the same objects again.

use crate::ast::{BlockBody, Document, Node};
use crate::renderer::Renderer;

#[derive(Debug, Default)]
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        TextRenderer
    }
}

impl Renderer for TextRenderer {
    fn render(&self, document: &Document) -> String {
        let text = blocks_text(&document.children);
        if document.escaped {
            html_escape::decode_html_entities(&text).into_owned()
        } else {
            text
        }
    }
}

fn blocks_text(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(node_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn inline_text(nodes: &[Node]) -> String {
    nodes.iter().map(node_text).collect()
}

fn node_text(node: &Node) -> String {
    match node {
        Node::Heading(heading) => {
            let mut title = String::new();
            if let Some(keyword) = &heading.keyword {
                title.push_str(&keyword.name);
                title.push(' ');
            }
            title.push_str(&inline_text(&heading.title));
            let children = blocks_text(&heading.children);
            if children.is_empty() {
                title
            } else {
                format!("{title}\n{children}")
            }
        }
        Node::Drawer { children, .. } => blocks_text(children),
        Node::PropertyDrawer(_) | Node::Keyword { .. } | Node::Blankline(_) | Node::Hr => {
            String::new()
        }
        Node::Block { body, .. } => match body {
            BlockBody::Raw { text, .. } => text.clone(),
            BlockBody::Nodes(nodes) => {
                if nodes.iter().all(is_inline) {
                    inline_text(nodes)
                } else {
                    blocks_text(nodes)
                }
            }
        },
        Node::BlockResult { lines, .. } => lines.join("\n"),
        Node::Table(rows) | Node::List { children: rows, .. } => blocks_text(rows),
        Node::TableRow { cells, .. } => cells
            .iter()
            .map(|cell| inline_text(cell))
            .collect::<Vec<_>>()
            .join(" | "),
        Node::ListItem { term, children, .. } => {
            let body = blocks_text(children);
            match term {
                Some(term) => format!("{} :: {body}", inline_text(term)),
                None => body,
            }
        }
        Node::Paragraph(children) => inline_text(children),

        Node::Text(text) => text.clone(),
        Node::Emphasis { children, .. } => inline_text(children),
        Node::Link(link) => link.description.clone().unwrap_or_else(|| link.url.clone()),
        Node::Footnote(label) => format!("[fn:{label}]"),
        Node::Timestamp {
            date,
            day,
            time,
            repeater,
        } => {
            let mut stamp = format!("<{date}");
            for part in [day, time, repeater].into_iter().flatten() {
                stamp.push(' ');
                stamp.push_str(part);
            }
            stamp.push('>');
            stamp
        }
        Node::Percent(cookie) => format!("[{cookie}]"),
        Node::LineBreak => String::new(),
    }
}

fn is_inline(node: &Node) -> bool {
    matches!(
        node,
        Node::Text(_)
            | Node::Emphasis { .. }
            | Node::Link(_)
            | Node::Footnote(_)
            | Node::Timestamp { .. }
            | Node::Percent(_)
            | Node::LineBreak
    )
}
