//! Document-wide state collected from keyword lines while parsing.
//!
//! Later parsing decisions read it (is the first word of a heading a TODO
//! keyword?) and so does the renderer (should a table of contents be emitted?).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoKeyword {
    pub name: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    todo: Vec<String>,
    done: Vec<String>,
    options: BTreeMap<String, String>,
    properties: BTreeMap<String, String>,
    keywords: BTreeMap<String, String>,
}

impl Default for Properties {
    fn default() -> Self {
        Properties {
            todo: vec!["TODO".to_string()],
            done: vec!["DONE".to_string()],
            options: BTreeMap::new(),
            properties: BTreeMap::new(),
            keywords: BTreeMap::new(),
        }
    }
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `#+KEY: value` line.
    pub fn apply_keyword(&mut self, key: &str, value: &str) {
        match key.to_ascii_uppercase().as_str() {
            "OPTIONS" => self.apply_options(value),
            "PROPERTY" => {
                let value = value.trim();
                if let Some((name, rest)) = value.split_once(char::is_whitespace) {
                    self.properties
                        .insert(name.to_string(), rest.trim().to_string());
                } else if !value.is_empty() {
                    self.properties.insert(value.to_string(), String::new());
                }
            }
            "TODO" | "SEQ_TODO" | "TYP_TODO" => {
                self.set_todo_sequence(value);
                self.keywords.insert(key.to_string(), value.to_string());
            }
            _ => {
                self.keywords.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Parse `toc:t num:nil H:3` style pairs. A bare word is stored with an empty value.
    fn apply_options(&mut self, value: &str) {
        for pair in value.split_whitespace() {
            match pair.split_once(':') {
                Some(("", _)) => {}
                Some((key, val)) => {
                    self.options.insert(key.to_string(), val.to_string());
                }
                None => {
                    self.options.insert(pair.to_string(), String::new());
                }
            }
        }
    }

    /// `TODO NEXT | DONE CANCELED`: words after `|` are done states.
    /// Without a `|` the last word is the only done state.
    fn set_todo_sequence(&mut self, value: &str) {
        let words: Vec<&str> = value.split_whitespace().collect();
        if words.is_empty() {
            return;
        }

        let (todo, done): (Vec<&str>, Vec<&str>) = match words.iter().position(|w| *w == "|") {
            Some(bar) => (words[..bar].to_vec(), words[bar + 1..].to_vec()),
            None => (
                words[..words.len() - 1].to_vec(),
                words[words.len() - 1..].to_vec(),
            ),
        };

        self.todo = todo.into_iter().map(str::to_string).collect();
        self.done = done.into_iter().map(str::to_string).collect();
    }

    pub fn todo_keyword(&self, word: &str) -> Option<TodoKeyword> {
        if self.todo.iter().any(|k| k == word) {
            Some(TodoKeyword {
                name: word.to_string(),
                done: false,
            })
        } else if self.done.iter().any(|k| k == word) {
            Some(TodoKeyword {
                name: word.to_string(),
                done: true,
            })
        } else {
            None
        }
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn keyword(&self, key: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// How many section levels the table of contents shows, if the document asks for one.
    pub fn toc_depth(&self) -> Option<usize> {
        match self.option("toc")? {
            "t" | "true" => Some(usize::MAX),
            "nil" | "" => None,
            n => match n.parse::<usize>() {
                Ok(0) | Err(_) => None,
                Ok(depth) => Some(depth),
            },
        }
    }

    /// `d:nil` hides all drawers, `d:t` shows all of them; by default only LOGBOOK is hidden.
    pub fn drawer_visible(&self, name: &str) -> bool {
        match self.option("d") {
            Some("nil") => false,
            Some("t") => true,
            _ => !name.eq_ignore_ascii_case("LOGBOOK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_todo_keywords() {
        let props = Properties::new();
        assert_eq!(
            props.todo_keyword("TODO"),
            Some(TodoKeyword {
                name: "TODO".to_string(),
                done: false
            })
        );
        assert!(props.todo_keyword("DONE").unwrap().done);
        assert_eq!(props.todo_keyword("NEXT"), None);
    }

    #[test]
    fn test_custom_todo_sequence() {
        let mut props = Properties::new();
        props.apply_keyword("TODO", "NEXT WAITING | FINISHED CANCELED");
        assert!(!props.todo_keyword("WAITING").unwrap().done);
        assert!(props.todo_keyword("CANCELED").unwrap().done);
        assert_eq!(props.todo_keyword("TODO"), None);
        assert_eq!(props.keyword("todo"), Some("NEXT WAITING | FINISHED CANCELED"));
    }

    #[test]
    fn test_todo_sequence_without_bar() {
        let mut props = Properties::new();
        props.apply_keyword("SEQ_TODO", "OPEN REVIEW CLOSED");
        assert!(!props.todo_keyword("REVIEW").unwrap().done);
        assert!(props.todo_keyword("CLOSED").unwrap().done);
    }

    #[test]
    fn test_options_and_toc_depth() {
        let mut props = Properties::new();
        assert_eq!(props.toc_depth(), None);

        props.apply_keyword("OPTIONS", "toc:t num:nil");
        assert_eq!(props.toc_depth(), Some(usize::MAX));
        assert_eq!(props.option("num"), Some("nil"));

        props.apply_keyword("OPTIONS", "toc:2");
        assert_eq!(props.toc_depth(), Some(2));

        props.apply_keyword("OPTIONS", "toc:1");
        assert_eq!(props.toc_depth(), Some(1));

        props.apply_keyword("OPTIONS", "toc:nil");
        assert_eq!(props.toc_depth(), None);
    }

    #[test]
    fn test_property_keyword() {
        let mut props = Properties::new();
        props.apply_keyword("PROPERTY", "header-args :results output");
        assert_eq!(props.property("header-args"), Some(":results output"));
    }

    #[test]
    fn test_unknown_keywords_are_kept_verbatim() {
        let mut props = Properties::new();
        props.apply_keyword("TITLE", "  My <Notes>  ");
        assert_eq!(props.keyword("TITLE"), Some("  My <Notes>  "));
    }

    #[test]
    fn test_drawer_visibility() {
        let mut props = Properties::new();
        assert!(props.drawer_visible("NOTES"));
        assert!(!props.drawer_visible("logbook"));

        props.apply_keyword("OPTIONS", "d:t");
        assert!(props.drawer_visible("LOGBOOK"));

        props.apply_keyword("OPTIONS", "d:nil");
        assert!(!props.drawer_visible("NOTES"));
    }
}
