/// AST node types for Org documents
use serde::{Deserialize, Serialize};

use crate::properties::{Properties, TodoKeyword};
use crate::section::SectionIndex;

/// A parsed document: the block tree plus the state accumulated while parsing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub children: Vec<Node>,
    pub properties: Properties,
    pub sections: SectionIndex,
    /// Whether literal text in the tree was HTML-escaped during parsing.
    pub escaped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    // Block-level nodes
    Heading(Heading),
    Drawer {
        name: String,
        children: Vec<Node>,
    },
    PropertyDrawer(Vec<Property>),
    Block {
        block_type: BlockType,
        params: String,
        body: BlockBody,
    },
    BlockResult {
        lines: Vec<String>, // Raw result text, one entry per `: ` line
        escape: bool,
    },
    Table(Vec<Node>), // Contains TableRow nodes
    TableRow {
        header: bool,
        cells: Vec<Vec<Node>>, // Inline content per cell
    },
    List {
        kind: ListKind,
        children: Vec<Node>, // Contains ListItem nodes
    },
    ListItem {
        checkbox: Option<Checkbox>,
        term: Option<Vec<Node>>, // Only set in descriptive lists
        children: Vec<Node>,     // Block-level content
    },
    Keyword {
        key: String,
        value: String,
    },
    Paragraph(Vec<Node>),
    Blankline(usize), // Number of consecutive blank lines
    Hr,
    // Inline nodes
    Text(String), // Already escaped when the document was parsed with escaping on
    Emphasis {
        marker: Marker,
        children: Vec<Node>,
    },
    Link(Link),
    Footnote(String),
    Timestamp {
        date: String,
        day: Option<String>,
        time: Option<String>,
        repeater: Option<String>,
    },
    Percent(String), // `1/3` or `50%`, without brackets
    LineBreak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub level: usize, // Number of leading stars
    pub keyword: Option<TodoKeyword>,
    pub priority: Option<char>,
    pub title: Vec<Node>,
    pub tags: Vec<String>,
    pub anchor: String,
    pub properties: Vec<Property>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockType {
    Src { language: String },
    Example,
    Quote,
    Center,
    Verse,
    Export { backend: String },
    Special(String), // Any other `#+BEGIN_<NAME>`, lowercased
}

impl BlockType {
    /// Whether the block body is kept as raw lines instead of being parsed.
    pub fn is_raw(&self) -> bool {
        matches!(
            self,
            BlockType::Src { .. } | BlockType::Example | BlockType::Export { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockBody {
    Raw { text: String, escape: bool },
    Nodes(Vec<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListKind {
    Ordered,
    Unordered,
    Descriptive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Checkbox {
    Empty,   // [ ]
    Checked, // [X]
    Partial, // [-]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    Bold,      // *text*
    Italic,    // /text/ or **text**
    Underline, // _text_
    Strike,    // +text+
    Code,      // =text= or `text`
    Verbatim,  // ~text~
}

impl Marker {
    /// Code and verbatim spans keep their content as literal text.
    pub fn is_raw(self) -> bool {
        matches!(self, Marker::Code | Marker::Verbatim)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub description: Option<String>,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    Plain,
    Image,
    Video,
}
