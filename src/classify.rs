//! Line classification.
//!
//! Every source line is sorted into exactly one [`LineKind`], which carries the
//! pieces the block builder needs. Builders only ever see data from a line
//! that already matched, so there is no "accessor on a non-matching line" state.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_casefold::UnicodeCaseFold;

use crate::ast::{Checkbox, ListKind};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\*+)\s+(.+)$").unwrap());
static DRAWER_BEGIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*:(\S+):\s*$").unwrap());
static DRAWER_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*:END:\s*$").unwrap());
static PROPERTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*:(\S+):(?:\s+(.*)|$)").unwrap());
static BLOCK_BEGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*#\+BEGIN_(\w+)(.*)$").unwrap());
static BLOCK_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*#\+END_(\w+)\s*$").unwrap());
static BLOCK_RESULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*#\+RESULTS(?:\[[^\]]*\])?:").unwrap());
static RESULT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*:(?:\s(.*)|$)").unwrap());
static TABLE_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\|(.+)\|\s*$").unwrap());
static TABLE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|[-+|]*-[-+|]*\s*$").unwrap());
static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)(\d+)[.)]\s+(.+)$").unwrap());
static UNORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)[-+]\s+(.+)$").unwrap());
static CHECKBOX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([ X-])\](?:\s+(.*)|$)").unwrap());
static DESCRIPTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)\s+::(?:\s+(.*)|$)").unwrap());
static KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#\+([^:]+):(?:\s+(.*)|$)").unwrap());
static HR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-{5,}\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Heading { level: usize, title: &'a str },
    DrawerBegin { name: &'a str },
    BlockBegin { name: &'a str, params: &'a str },
    BlockResult,
    TableRow(TableLine<'a>),
    ListItem(ListMarker<'a>),
    Keyword { key: &'a str, value: &'a str },
    Hr,
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLine<'a> {
    Separator,
    Cells(&'a str), // Everything between the outer pipes
}

impl<'a> TableLine<'a> {
    pub fn cells(self) -> Vec<&'a str> {
        match self {
            TableLine::Separator => Vec::new(),
            TableLine::Cells(inner) => inner.split('|').map(str::trim).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker<'a> {
    pub indent: usize,
    pub kind: ListKind,
    pub checkbox: Option<Checkbox>,
    pub term: Option<&'a str>,
    pub content: &'a str,
}

/// Classify one line. Patterns are tried in a fixed precedence order since
/// several of them overlap.
pub fn classify(line: &str) -> LineKind<'_> {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if let Some((level, title)) = heading(line) {
        return LineKind::Heading { level, title };
    }
    if let Some(name) = drawer_begin(line) {
        return LineKind::DrawerBegin { name };
    }
    if let Some((name, params)) = block_begin(line) {
        return LineKind::BlockBegin { name, params };
    }
    if is_block_result(line) {
        return LineKind::BlockResult;
    }
    if let Some(row) = table_row(line) {
        return LineKind::TableRow(row);
    }
    if let Some(marker) = list_item(line) {
        return LineKind::ListItem(marker);
    }
    if let Some((key, value)) = keyword(line) {
        return LineKind::Keyword { key, value };
    }
    if HR.is_match(line) {
        return LineKind::Hr;
    }
    LineKind::Text(line)
}

pub fn heading(line: &str) -> Option<(usize, &str)> {
    let caps = HEADING.captures(line)?;
    let title = caps.get(2)?.as_str().trim();
    if title.is_empty() {
        return None;
    }
    Some((caps.get(1)?.as_str().len(), title))
}

/// `:NAME:` alone on a line. `:END:` closes drawers and never opens one.
pub fn drawer_begin(line: &str) -> Option<&str> {
    let name = DRAWER_BEGIN.captures(line)?.get(1)?.as_str();
    if same_name(name, "END") {
        return None;
    }
    Some(name)
}

pub fn is_drawer_end(line: &str) -> bool {
    DRAWER_END.is_match(line)
}

/// A `:KEY: value` line inside a property drawer.
pub fn property(line: &str) -> Option<(&str, &str)> {
    let caps = PROPERTY.captures(line)?;
    let key = caps.get(1)?.as_str();
    let value = caps.get(2).map_or("", |m| m.as_str().trim());
    Some((key, value))
}

pub fn block_begin(line: &str) -> Option<(&str, &str)> {
    let caps = BLOCK_BEGIN.captures(line)?;
    Some((caps.get(1)?.as_str(), caps.get(2).map_or("", |m| m.as_str().trim())))
}

/// Whether `line` is the `#+END_<name>` matching a block opened as `name`.
pub fn is_block_end(line: &str, name: &str) -> bool {
    BLOCK_END
        .captures(line)
        .and_then(|caps| caps.get(1))
        .is_some_and(|end| same_name(end.as_str(), name))
}

pub fn is_block_result(line: &str) -> bool {
    BLOCK_RESULT.is_match(line)
}

/// The text of a `: output` line following `#+RESULTS:`.
pub fn result_line(line: &str) -> Option<&str> {
    let caps = RESULT_LINE.captures(line)?;
    Some(caps.get(1).map_or("", |m| m.as_str()))
}

pub fn table_row(line: &str) -> Option<TableLine<'_>> {
    let caps = TABLE_ROW.captures(line)?;
    if TABLE_SEPARATOR.is_match(line) {
        return Some(TableLine::Separator);
    }
    Some(TableLine::Cells(caps.get(1)?.as_str()))
}

pub fn list_item(line: &str) -> Option<ListMarker<'_>> {
    let (indent, kind, body) = if let Some(caps) = ORDERED_ITEM.captures(line) {
        (caps.get(1)?, ListKind::Ordered, caps.get(3)?)
    } else {
        let caps = UNORDERED_ITEM.captures(line)?;
        (caps.get(1)?, ListKind::Unordered, caps.get(2)?)
    };
    let indent = indent.as_str().chars().count();
    let mut content = body.as_str();

    let mut checkbox = None;
    if let Some(caps) = CHECKBOX.captures(content) {
        checkbox = match caps.get(1)?.as_str() {
            "X" => Some(Checkbox::Checked),
            "-" => Some(Checkbox::Partial),
            _ => Some(Checkbox::Empty),
        };
        content = caps.get(2).map_or("", |m| m.as_str());
    }

    let mut term = None;
    let mut kind = kind;
    if kind == ListKind::Unordered
        && let Some(caps) = DESCRIPTIVE.captures(content)
    {
        kind = ListKind::Descriptive;
        term = Some(caps.get(1)?.as_str().trim());
        content = caps.get(2).map_or("", |m| m.as_str());
    }

    Some(ListMarker {
        indent,
        kind,
        checkbox,
        term,
        content: content.trim(),
    })
}

pub fn keyword(line: &str) -> Option<(&str, &str)> {
    let caps = KEYWORD.captures(line)?;
    Some((
        caps.get(1)?.as_str().trim(),
        caps.get(2).map_or("", |m| m.as_str()),
    ))
}

/// Number of leading whitespace characters.
pub fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Case-insensitive name comparison for block, drawer and backend names.
pub fn same_name(a: &str, b: &str) -> bool {
    a.chars().case_fold().eq(b.chars().case_fold())
}
