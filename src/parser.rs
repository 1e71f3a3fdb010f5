/// Block tree builder
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{BlockBody, BlockType, Document, Heading, Node, Property};
use crate::classify::{self, LineKind, ListMarker, TableLine};
use crate::inline::{escape_text, parse_inline};
use crate::properties::{Properties, TodoKeyword};
use crate::section::SectionIndex;

static PRIORITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[#([A-Za-z0-9])\]\s*").unwrap());
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s+):((?:[\w@#%]+:)+)\s*$").unwrap());

/// Deepest line range a nesting construct may open. Past it, lists, drawers,
/// blocks and headings keep their opening line as text.
pub const MAX_NESTING: usize = 256;

/// Where a line range sits. Headings only open sections at document level;
/// inside list items, drawers and blocks a `* x` line is paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Document,
    Nested,
}

pub struct Parser {
    escape: bool,
    properties: Properties,
    sections: SectionIndex,
    depth: usize,
}

impl Parser {
    pub fn new(escape: bool) -> Self {
        Parser {
            escape,
            properties: Properties::new(),
            sections: SectionIndex::new(),
            depth: 0,
        }
    }

    pub fn parse(mut self, input: &str) -> Document {
        let lines: Vec<&str> = input.lines().collect();
        let children = self.parse_lines(&lines, Scope::Document);

        Document {
            children,
            properties: self.properties,
            sections: self.sections,
            escaped: self.escape,
        }
    }

    /// Parse a whole line range into sibling blocks.
    fn parse_lines(&mut self, lines: &[&str], scope: Scope) -> Vec<Node> {
        let mut blocks = Vec::new();
        let mut i = 0;
        self.depth += 1;

        while i < lines.len() {
            let (block, lines_consumed) = self.parse_block(&lines[i..], scope);
            blocks.push(block);
            i += lines_consumed.max(1);
        }

        self.depth -= 1;
        blocks
    }

    /// Parse the block starting at `lines[0]`, returning it with the number of lines it used.
    fn parse_block(&mut self, lines: &[&str], scope: Scope) -> (Node, usize) {
        let line = lines[0];
        let kind = classify::classify(line);
        log::trace!("{kind:?}");

        if self.depth > MAX_NESTING
            && matches!(
                kind,
                LineKind::Heading { .. }
                    | LineKind::DrawerBegin { .. }
                    | LineKind::BlockBegin { .. }
                    | LineKind::ListItem(_)
            )
        {
            return self.degrade(line, "construct nested too deeply");
        }

        match kind {
            LineKind::Blank => self.parse_blanklines(lines),
            LineKind::Heading { level, title } if scope == Scope::Document => {
                self.parse_heading(lines, level, title)
            }
            LineKind::DrawerBegin { name } => self
                .parse_drawer(lines, name)
                .unwrap_or_else(|| self.degrade(line, "drawer")),
            LineKind::BlockBegin { name, params } => self
                .parse_fenced_block(lines, name, params)
                .unwrap_or_else(|| self.degrade(line, "block")),
            LineKind::BlockResult => self
                .parse_block_result(lines)
                .unwrap_or_else(|| self.degrade(line, "result")),
            LineKind::TableRow(_) => self.parse_table(lines),
            LineKind::ListItem(marker) => self.parse_list(lines, marker),
            LineKind::Keyword { key, value } => {
                self.properties.apply_keyword(key, value);
                (
                    Node::Keyword {
                        key: key.to_string(),
                        value: value.to_string(),
                    },
                    1,
                )
            }
            LineKind::Hr => (Node::Hr, 1),
            LineKind::Heading { .. } | LineKind::Text(_) => self.parse_paragraph(lines, scope),
        }
    }

    /// An opened paired construct without its terminator keeps its begin line as text.
    fn degrade(&self, line: &str, construct: &str) -> (Node, usize) {
        log::debug!("unterminated {construct}, keeping {line:?} as text");
        (
            Node::Paragraph(parse_inline(line.trim(), self.escape)),
            1,
        )
    }

    fn parse_blanklines(&self, lines: &[&str]) -> (Node, usize) {
        let count = lines
            .iter()
            .take_while(|line| line.trim().is_empty())
            .count();
        (Node::Blankline(count), count)
    }

    fn parse_heading(&mut self, lines: &[&str], level: usize, title: &str) -> (Node, usize) {
        let (keyword, priority, text, tags) = self.split_heading_title(title);
        let title = parse_inline(text, self.escape);

        // Register before the children so sections stay in document order
        let id = self.sections.add(level, keyword.clone(), title.clone());

        let end = section_end(lines, level);
        let mut children = self.parse_lines(&lines[1..end], Scope::Document);

        let mut properties = Vec::new();
        if matches!(children.first(), Some(Node::PropertyDrawer(_)))
            && let Node::PropertyDrawer(drawer) = children.remove(0)
        {
            properties = drawer;
        }

        if let Some(custom) = properties
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case("CUSTOM_ID") && !p.value.is_empty())
        {
            self.sections
                .set_anchor(id, escape_text(&custom.value, true));
        }

        let heading = Heading {
            level,
            keyword,
            priority,
            title,
            tags,
            anchor: self.sections.anchor(id).to_string(),
            properties,
            children,
        };

        (Node::Heading(heading), end)
    }

    /// `KEYWORD [#P] title :tag1:tag2:`
    fn split_heading_title<'a>(
        &self,
        title: &'a str,
    ) -> (Option<TodoKeyword>, Option<char>, &'a str, Vec<String>) {
        let mut rest = title;

        let first = rest.split_whitespace().next().unwrap_or_default();
        let keyword = self.properties.todo_keyword(first);
        if keyword.is_some() {
            rest = rest[first.len()..].trim_start();
        }

        let mut priority = None;
        if let Some(caps) = PRIORITY.captures(rest) {
            priority = caps.get(1).and_then(|m| m.as_str().chars().next());
            rest = &rest[caps.get(0).map_or(0, |m| m.end())..];
        }

        let mut tags = Vec::new();
        if let Some(caps) = TAGS.captures(rest)
            && let (Some(whole), Some(list)) = (caps.get(0), caps.get(1))
        {
            tags = list
                .as_str()
                .split(':')
                .filter(|tag| !tag.is_empty())
                .map(|tag| escape_text(tag, self.escape))
                .collect();
            rest = &rest[..whole.start()];
        }

        (keyword, priority, rest.trim(), tags)
    }

    fn parse_drawer(&mut self, lines: &[&str], name: &str) -> Option<(Node, usize)> {
        let end = lines[1..]
            .iter()
            .position(|line| classify::is_drawer_end(line))?
            + 1;
        let inner = &lines[1..end];

        let node = if classify::same_name(name, "PROPERTIES") {
            Node::PropertyDrawer(
                inner
                    .iter()
                    .filter_map(|line| classify::property(line))
                    .map(|(key, value)| Property {
                        key: key.to_string(),
                        value: value.to_string(),
                    })
                    .collect(),
            )
        } else {
            Node::Drawer {
                name: name.to_string(),
                children: self.parse_lines(inner, Scope::Nested),
            }
        };

        Some((node, end + 1))
    }

    fn parse_fenced_block(
        &mut self,
        lines: &[&str],
        name: &str,
        params: &str,
    ) -> Option<(Node, usize)> {
        let end = lines[1..]
            .iter()
            .position(|line| classify::is_block_end(line, name))?
            + 1;
        let inner = &lines[1..end];
        let first_param = params.split_whitespace().next().unwrap_or_default();

        let block_type = match name.to_lowercase().as_str() {
            "src" => BlockType::Src {
                language: first_param.to_string(),
            },
            "example" => BlockType::Example,
            "quote" => BlockType::Quote,
            "center" => BlockType::Center,
            "verse" => BlockType::Verse,
            "export" => BlockType::Export {
                backend: first_param.to_lowercase(),
            },
            other => BlockType::Special(other.to_string()),
        };

        let body = match &block_type {
            BlockType::Export { backend } => BlockBody::Raw {
                text: dedent(inner),
                escape: self.escape && !classify::same_name(backend, "html"),
            },
            t if t.is_raw() => BlockBody::Raw {
                text: dedent(inner),
                escape: self.escape,
            },
            BlockType::Verse => BlockBody::Nodes(self.parse_verse(inner)),
            _ => BlockBody::Nodes(self.parse_lines(inner, Scope::Nested)),
        };

        Some((
            Node::Block {
                block_type,
                params: params.to_string(),
                body,
            },
            end + 1,
        ))
    }

    /// Verse keeps its line structure: each source line is inline-parsed and
    /// followed by a line break.
    fn parse_verse(&self, lines: &[&str]) -> Vec<Node> {
        let mut nodes = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                nodes.push(Node::LineBreak);
                nodes.push(Node::Text("\n".to_string()));
            }
            nodes.extend(parse_inline(line.trim(), self.escape));
        }
        nodes
    }

    /// `#+RESULTS:` followed by `: output` lines, up to the first other line.
    fn parse_block_result(&self, lines: &[&str]) -> Option<(Node, usize)> {
        let output: Vec<String> = lines[1..]
            .iter()
            .map_while(|line| classify::result_line(line))
            .map(str::to_string)
            .collect();
        if output.is_empty() {
            return None;
        }

        let consumed = output.len() + 1;
        Some((
            Node::BlockResult {
                lines: output,
                escape: self.escape,
            },
            consumed,
        ))
    }

    /// Consecutive table rows. The first separator turns every row above it into a header.
    fn parse_table(&self, lines: &[&str]) -> (Node, usize) {
        let mut rows = Vec::new();
        let mut promoted = false;
        let mut i = 0;

        while i < lines.len() {
            let Some(row) = classify::table_row(lines[i]) else {
                break;
            };
            match row {
                TableLine::Separator => {
                    if !promoted {
                        for row in rows.iter_mut() {
                            if let Node::TableRow { header, .. } = row {
                                *header = true;
                            }
                        }
                        promoted = true;
                    }
                }
                TableLine::Cells(_) => {
                    let cells = row
                        .cells()
                        .into_iter()
                        .map(|cell| parse_inline(cell, self.escape))
                        .collect();
                    rows.push(Node::TableRow {
                        header: false,
                        cells,
                    });
                }
            }
            i += 1;
        }

        (Node::Table(rows), i)
    }

    /// The first item fixes the list's indentation and kind.
    fn parse_list(&mut self, lines: &[&str], first: ListMarker<'_>) -> (Node, usize) {
        let mut items = Vec::new();
        let mut marker = first;
        let mut i = 0;

        loop {
            let (item, consumed) = self.parse_list_item(&lines[i..], marker);
            items.push(item);
            i += consumed;

            // One blank line may separate siblings
            let mut next = i;
            if next < lines.len() && lines[next].trim().is_empty() {
                next += 1;
            }

            match lines.get(next).and_then(|line| list_marker(line)) {
                Some(sibling) if sibling.indent == first.indent && sibling.kind == first.kind => {
                    marker = sibling;
                    i = next;
                }
                _ => break,
            }
        }

        (
            Node::List {
                kind: first.kind,
                children: items,
            },
            i,
        )
    }

    /// An item owns every following line indented deeper than its marker.
    /// A single blank line may sit inside the item; two end it.
    fn parse_list_item(&mut self, lines: &[&str], marker: ListMarker<'_>) -> (Node, usize) {
        let mut body: Vec<&str> = Vec::new();
        if !marker.content.is_empty() {
            body.push(marker.content);
        }

        let mut i = 1;
        while i < lines.len() {
            let line = lines[i];
            if line.trim().is_empty() {
                let continues = lines.get(i + 1).is_some_and(|next| {
                    !next.trim().is_empty() && classify::indentation(next) > marker.indent
                });
                if !continues {
                    break;
                }
                body.push("");
            } else if classify::indentation(line) > marker.indent {
                body.push(line);
            } else {
                break;
            }
            i += 1;
        }

        let children = self.parse_lines(&body, Scope::Nested);
        let term = marker.term.map(|term| parse_inline(term, self.escape));

        (
            Node::ListItem {
                checkbox: marker.checkbox,
                term,
                children,
            },
            i,
        )
    }

    /// Consecutive text lines. Any line that opens another construct ends the paragraph.
    fn parse_paragraph(&self, lines: &[&str], scope: Scope) -> (Node, usize) {
        let mut i = 1;
        while i < lines.len() {
            match classify::classify(lines[i]) {
                LineKind::Text(_) => {}
                LineKind::Heading { .. } if scope == Scope::Nested => {}
                _ => break,
            }
            i += 1;
        }

        let mut children = Vec::new();
        for (n, line) in lines[..i].iter().enumerate() {
            if n > 0 {
                children.push(Node::Text("\n".to_string()));
            }
            children.extend(parse_inline(line.trim(), self.escape));
        }

        (Node::Paragraph(children), i)
    }
}

/// A list item line, as the classifier would see it.
fn list_marker(line: &str) -> Option<ListMarker<'_>> {
    match classify::classify(line) {
        LineKind::ListItem(marker) => Some(marker),
        _ => None,
    }
}

/// Index of the first line after `lines[0]` that closes a heading of `level`:
/// the next heading at the same or a shallower level. Complete
/// `#+BEGIN_`/`#+END_` blocks are skipped so their content never closes a section.
fn section_end(lines: &[&str], level: usize) -> usize {
    let mut i = 1;
    while i < lines.len() {
        let line = lines[i];
        if let Some((next_level, _)) = classify::heading(line)
            && next_level <= level
        {
            return i;
        }
        if let Some((name, _)) = classify::block_begin(line)
            && let Some(offset) = lines[i + 1..]
                .iter()
                .position(|l| classify::is_block_end(l, name))
        {
            i += offset + 2;
            continue;
        }
        i += 1;
    }
    lines.len()
}

/// Strip the indentation shared by all non-blank lines.
fn dedent(lines: &[&str]) -> String {
    let common = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| classify::indentation(line))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            line.char_indices()
                .nth(common)
                .map_or("", |(offset, _)| &line[offset..])
        })
        .collect::<Vec<_>>()
        .join("\n")
}
