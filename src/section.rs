//! Heading-only index used for the table of contents.
//!
//! Sections live in an arena and refer to their children by index. While
//! parsing, `open` holds the chain of sections from the outermost to the most
//! recently added one, which is all that is needed to place the next heading.

use serde::{Deserialize, Serialize};

use crate::ast::Node;
use crate::properties::TodoKeyword;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Dotted position in the tree: `1`, `1.2`, `1.2.1`.
    pub path: String,
    pub anchor: String,
    pub level: usize,
    pub keyword: Option<TodoKeyword>,
    pub title: Vec<Node>,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionIndex {
    sections: Vec<Section>,
    roots: Vec<usize>,
    #[serde(skip)]
    open: Vec<usize>,
}

impl SectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a heading and return its section id.
    ///
    /// The parent is found by walking up the open chain while the last
    /// section's level is at least the new level: an equal level becomes a
    /// sibling, a lower one a child.
    pub fn add(&mut self, level: usize, keyword: Option<TodoKeyword>, title: Vec<Node>) -> usize {
        while let Some(&last) = self.open.last() {
            if self.sections[last].level >= level {
                self.open.pop();
            } else {
                break;
            }
        }

        let id = self.sections.len();
        let path = match self.open.last() {
            Some(&parent) => {
                let parent = &self.sections[parent];
                format!("{}.{}", parent.path, parent.children.len() + 1)
            }
            None => (self.roots.len() + 1).to_string(),
        };

        match self.open.last() {
            Some(&parent) => self.sections[parent].children.push(id),
            None => self.roots.push(id),
        }

        log::trace!("section {path} at level {level}");
        self.sections.push(Section {
            anchor: format!("heading-{path}"),
            path,
            level,
            keyword,
            title,
            children: Vec::new(),
        });
        self.open.push(id);
        id
    }

    /// Replace the generated anchor, e.g. with a `CUSTOM_ID` property.
    pub fn set_anchor(&mut self, id: usize, anchor: String) {
        if let Some(section) = self.sections.get_mut(id) {
            section.anchor = anchor;
        }
    }

    pub fn get(&self, id: usize) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn anchor(&self, id: usize) -> &str {
        self.sections
            .get(id)
            .map(|s| s.anchor.as_str())
            .unwrap_or_default()
    }

    /// Top-level sections, in document order.
    pub fn roots(&self) -> impl Iterator<Item = &Section> {
        self.roots.iter().map(|&id| &self.sections[id])
    }

    pub fn children<'a>(&'a self, section: &'a Section) -> impl Iterator<Item = &'a Section> {
        section.children.iter().map(|&id| &self.sections[id])
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(index: &mut SectionIndex, level: usize) -> String {
        let id = index.add(level, None, Vec::new());
        index.get(id).unwrap().path.clone()
    }

    #[test]
    fn test_paths_follow_levels() {
        let mut index = SectionIndex::new();
        let paths: Vec<String> = [1, 2, 3, 2, 1]
            .into_iter()
            .map(|level| add(&mut index, level))
            .collect();
        assert_eq!(paths, ["1", "1.1", "1.1.1", "1.2", "2"]);

        let roots: Vec<&str> = index.roots().map(|s| s.path.as_str()).collect();
        assert_eq!(roots, ["1", "2"]);

        let first = index.roots().next().unwrap();
        let children: Vec<&str> = index.children(first).map(|s| s.path.as_str()).collect();
        assert_eq!(children, ["1.1", "1.2"]);
    }

    #[test]
    fn test_skipped_level_nests_under_nearest_lower_heading() {
        let mut index = SectionIndex::new();
        assert_eq!(add(&mut index, 1), "1");
        assert_eq!(add(&mut index, 3), "1.1");
        assert_eq!(add(&mut index, 2), "1.2");
    }

    #[test]
    fn test_deeper_first_heading_is_a_root() {
        let mut index = SectionIndex::new();
        assert_eq!(add(&mut index, 2), "1");
        assert_eq!(add(&mut index, 1), "2");
        assert_eq!(add(&mut index, 3), "2.1");
    }

    #[test]
    fn test_anchor_override() {
        let mut index = SectionIndex::new();
        let id = index.add(1, None, Vec::new());
        assert_eq!(index.anchor(id), "heading-1");
        index.set_anchor(id, "intro".to_string());
        assert_eq!(index.anchor(id), "intro");
        assert_eq!(index.anchor(42), "");
    }
}
