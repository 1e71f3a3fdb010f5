//! Inline object parser.
//!
//! [`InlineParser`] walks one text run left to right and yields inline nodes
//! lazily. At each position the openers are tried in priority order; when
//! none matches, the character is appended to the pending text node.

use std::iter::FusedIterator;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Link, LinkKind, Marker, Node};

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^<(\d{4}-\d{2}-\d{2})(?: ([[:alpha:]]+))?",
        r"(?: (\d{1,2}:\d{2}))?(?: (\+\d+[hdwmy]))?>",
    ))
    .unwrap()
});

/// Longest timestamp the pattern above can match, in chars.
const TIMESTAMP_WINDOW: usize = 48;

/// Emphasis openers, in the order they are tried. `**` must precede `*`.
const EMPHASIS: &[(&str, Marker)] = &[
    ("=", Marker::Code),
    ("`", Marker::Code),
    ("~", Marker::Verbatim),
    ("**", Marker::Italic),
    ("*", Marker::Bold),
    ("/", Marker::Italic),
    ("_", Marker::Underline),
    ("+", Marker::Strike),
];

const IMAGE_EXTENSIONS: &[&str] = &["png", "gif", "jpg", "jpeg", "svg", "tif", "tiff", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["webm", "mp4"];

pub struct InlineParser {
    chars: Vec<char>,
    pos: usize,
    escape: bool,
    text: String,
    pending: Option<Node>,
}

impl InlineParser {
    pub fn new(text: &str, escape: bool) -> Self {
        InlineParser {
            chars: text.chars().collect(),
            pos: 0,
            escape,
            text: String::new(),
            pending: None,
        }
    }

    fn from_chars(chars: &[char], escape: bool) -> Self {
        InlineParser {
            chars: chars.to_vec(),
            pos: 0,
            escape,
            text: String::new(),
            pending: None,
        }
    }

    fn take_text(&mut self) -> Option<Node> {
        if self.text.is_empty() {
            return None;
        }
        let text = std::mem::take(&mut self.text);
        Some(Node::Text(escape_text(&text, self.escape)))
    }

    fn starts_with_at(&self, pos: usize, pattern: &str) -> bool {
        let mut i = pos;
        for ch in pattern.chars() {
            if i >= self.chars.len() || self.chars[i] != ch {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Try every opener at `start`; returns the node and the index just past it.
    fn try_parse_object(&self, start: usize) -> Option<(Node, usize)> {
        match self.chars[start] {
            '[' => self
                .try_parse_link(start)
                .or_else(|| self.try_parse_footnote(start))
                .or_else(|| self.try_parse_percent(start)),
            '<' => self.try_parse_timestamp(start),
            '\\' => self.try_parse_line_break(start),
            _ => EMPHASIS
                .iter()
                .find_map(|&(delimiter, marker)| self.try_parse_emphasis(start, delimiter, marker)),
        }
    }

    fn try_parse_emphasis(
        &self,
        start: usize,
        delimiter: &str,
        marker: Marker,
    ) -> Option<(Node, usize)> {
        if !self.starts_with_at(start, delimiter) || !self.valid_pre_border(start) {
            return None;
        }

        let width = delimiter.chars().count();
        let content_start = start + width;
        if content_start >= self.chars.len() || self.chars[content_start].is_whitespace() {
            return None;
        }

        // The closing marker needs at least one character of content before it
        let mut i = content_start + 1;
        while i + width <= self.chars.len() {
            if !self.starts_with_at(i, delimiter) {
                i += 1;
                continue;
            }
            let before = self.chars[i - 1];
            if before.is_whitespace() || before == '\\' {
                i += 1;
                continue;
            }
            // First plausible closer decides
            if !self.valid_post_border(i + width) {
                return None;
            }
            let content = &self.chars[content_start..i];
            let children = if marker.is_raw() {
                let raw: String = content.iter().collect();
                vec![Node::Text(escape_text(&raw, self.escape))]
            } else {
                InlineParser::from_chars(content, self.escape).collect()
            };
            return Some((Node::Emphasis { marker, children }, i + width));
        }

        None
    }

    /// An opener must follow start-of-run, whitespace or opening punctuation,
    /// and must not be escaped.
    fn valid_pre_border(&self, pos: usize) -> bool {
        if pos == 0 {
            return true;
        }
        let ch = self.chars[pos - 1];
        ch.is_whitespace() || matches!(ch, '-' | '(' | '{' | '\'' | '"') || is_cjk(ch)
    }

    /// A closer must precede end-of-run, whitespace or closing punctuation.
    fn valid_post_border(&self, pos: usize) -> bool {
        if pos >= self.chars.len() {
            return true;
        }
        let ch = self.chars[pos];
        ch.is_whitespace()
            || matches!(
                ch,
                '-' | '.' | ',' | ':' | '!' | '?' | ';' | '\'' | '"' | ')' | '}' | '['
            )
            || is_cjk(ch)
    }

    /// `[[url]]` or `[[url][description]]`
    fn try_parse_link(&self, start: usize) -> Option<(Node, usize)> {
        if !self.starts_with_at(start, "[[") {
            return None;
        }
        let url_start = start + 2;
        let url_end = self.find_char(url_start, ']')?;
        if url_end == url_start {
            return None;
        }
        let url: String = self.chars[url_start..url_end].iter().collect();

        let after = url_end + 1;
        match self.chars.get(after) {
            Some(']') => Some((self.make_link(&url, None), after + 1)),
            Some('[') => {
                let desc_start = after + 1;
                let desc_end = self.find_char(desc_start, ']')?;
                if desc_end == desc_start || self.chars.get(desc_end + 1) != Some(&']') {
                    return None;
                }
                let description: String = self.chars[desc_start..desc_end].iter().collect();
                Some((self.make_link(&url, Some(&description)), desc_end + 2))
            }
            _ => None,
        }
    }

    fn make_link(&self, url: &str, description: Option<&str>) -> Node {
        let target = url.strip_prefix("file:").unwrap_or(url);
        let kind = match (description, extension(target)) {
            (None, Some(ext)) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => LinkKind::Image,
            (None, Some(ext)) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => LinkKind::Video,
            _ => LinkKind::Plain,
        };
        Node::Link(Link {
            url: escape_text(target, self.escape),
            description: description.map(|d| escape_text(d, self.escape)),
            kind,
        })
    }

    /// `[fn:label]`
    fn try_parse_footnote(&self, start: usize) -> Option<(Node, usize)> {
        if !self.starts_with_at(start, "[fn:") {
            return None;
        }
        let label_start = start + 4;
        let label_end = self.find_char(label_start, ']')?;
        if label_end == label_start {
            return None;
        }
        let label: String = self.chars[label_start..label_end].iter().collect();
        Some((
            Node::Footnote(escape_text(&label, self.escape)),
            label_end + 1,
        ))
    }

    /// `[n/m]` or `[n%]`
    fn try_parse_percent(&self, start: usize) -> Option<(Node, usize)> {
        let mut i = start + 1;
        let digits = |from: usize| {
            self.chars[from..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .count()
        };

        let numerator = digits(i);
        if numerator == 0 {
            return None;
        }
        i += numerator;

        match self.chars.get(i) {
            Some('%') => i += 1,
            Some('/') => {
                let denominator = digits(i + 1);
                if denominator == 0 {
                    return None;
                }
                i += 1 + denominator;
            }
            _ => return None,
        }

        if self.chars.get(i) != Some(&']') {
            return None;
        }
        let cookie: String = self.chars[start + 1..i].iter().collect();
        Some((Node::Percent(cookie), i + 1))
    }

    /// `<2020-08-19 Wed 12:00 +1w>`
    fn try_parse_timestamp(&self, start: usize) -> Option<(Node, usize)> {
        let end = (start + TIMESTAMP_WINDOW).min(self.chars.len());
        let window: String = self.chars[start..end].iter().collect();
        let caps = TIMESTAMP.captures(&window)?;
        let consumed = window[..caps.get(0)?.end()].chars().count();
        let group = |n: usize| caps.get(n).map(|m| m.as_str().to_string());

        Some((
            Node::Timestamp {
                date: caps.get(1)?.as_str().to_string(),
                day: group(2),
                time: group(3),
                repeater: group(4),
            },
            start + consumed,
        ))
    }

    /// Trailing `\\` at the end of the run.
    fn try_parse_line_break(&self, start: usize) -> Option<(Node, usize)> {
        if !self.starts_with_at(start, "\\\\") {
            return None;
        }
        let rest = &self.chars[start + 2..];
        if !rest.iter().all(|c| c.is_whitespace()) {
            return None;
        }
        Some((Node::LineBreak, self.chars.len()))
    }

    fn find_char(&self, from: usize, target: char) -> Option<usize> {
        self.chars
            .get(from..)?
            .iter()
            .position(|&c| c == target)
            .map(|offset| from + offset)
    }
}

impl Iterator for InlineParser {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        if let Some(node) = self.pending.take() {
            return Some(node);
        }

        while self.pos < self.chars.len() {
            if let Some((node, next)) = self.try_parse_object(self.pos) {
                self.pos = next;
                return match self.take_text() {
                    Some(text) => {
                        self.pending = Some(node);
                        Some(text)
                    }
                    None => Some(node),
                };
            }
            self.text.push(self.chars[self.pos]);
            self.pos += 1;
        }

        self.take_text()
    }
}

impl FusedIterator for InlineParser {}

/// Parse a text run into inline nodes.
pub fn parse_inline(text: &str, escape: bool) -> Vec<Node> {
    InlineParser::new(text, escape).collect()
}

/// HTML-escape `& < > " '` when `escape` is set.
pub fn escape_text(text: &str, escape: bool) -> String {
    if escape {
        html_escape::encode_quoted_attribute(text).into_owned()
    } else {
        text.to_string()
    }
}

/// Lowercased file extension of the last path segment, ignoring any query or fragment.
fn extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// CJK ideographs and punctuation count as borders for emphasis markers.
fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{4e00}'..='\u{9fff}' |
        '\u{3000}'..='\u{303f}' |
        '\u{ff01}'..='\u{ff64}' |
        '\u{2013}' | '\u{2014}' |
        '\u{2018}'..='\u{201f}' |
        '\u{2026}' | '\u{2027}' |
        '\u{fe4f}' | '\u{fe51}' | '\u{fe54}' |
        '\u{00b7}'
    )
}
