/// An Org outline markup parser with HTML and plain-text renderers
pub mod ast;
pub mod classify;
pub mod config;
pub mod error;
pub mod highlight;
pub mod inline;
pub mod parser;
pub mod properties;
pub mod renderer;
pub mod section;
pub mod text;

pub use ast::{Document, Node};
pub use config::Options;
pub use error::{Error, Result};
pub use renderer::{HtmlRenderer, Renderer};
pub use text::TextRenderer;

use parser::Parser;

/// Parse Org text into a document tree.
pub fn parse(text: &str, escape: bool) -> Document {
    Parser::new(escape).parse(text)
}

/// Parse Org text and render it to an HTML fragment.
pub fn convert(text: &str, options: &Options) -> String {
    let document = parse(text, options.escape);
    HtmlRenderer::new(*options).render(&document)
}

/// Convert with default options.
pub fn org_to_html(text: &str) -> String {
    convert(text, &Options::default())
}

/// Fuzz entry: conversion is total and its output stays linear in the input.
#[cfg(test)]
#[test_fuzz::test_fuzz]
fn convert_target(text: &str) {
    let html = org_to_html(text);
    let bound = text.len() * 64 + 1024;
    assert!(
        html.len() <= bound,
        "{} bytes of output for {} bytes of input",
        html.len(),
        text.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input() {
        assert_eq!(org_to_html(""), "");
    }

    #[test]
    fn test_single_heading() {
        assert_eq!(org_to_html("* hello"), "<h1 id=\"heading-1\">hello</h1>");
    }

    #[test]
    fn test_ids_are_stable_across_runs() {
        let input = "* a\n** b\n* c";
        assert_eq!(org_to_html(input), org_to_html(input));
    }

    #[test]
    fn test_document_example() {
        let input = "#+TITLE: Notes\n#+OPTIONS: toc:nil\n\n* Plan\nSome *bold* text.\n\n- [X] done\n- [ ] open\n\n| k | v |\n|---+---|\n| a | 1 |";
        assert_eq!(
            org_to_html(input),
            "<h1 id=\"heading-1\">Plan</h1>\n<p>\nSome <b>bold</b> text.\n</p>\n\
             <ul>\n<li>\n<input type=\"checkbox\" checked=\"checked\" />\n<p>\ndone\n</p>\n</li>\n\
             <li>\n<input type=\"checkbox\" />\n<p>\nopen\n</p>\n</li>\n</ul>\n\
             <table>\n<tr>\n<th>k</th>\n<th>v</th>\n</tr>\n<tr>\n<td>a</td>\n<td>1</td>\n</tr>\n</table>"
        );
    }

    #[test]
    fn test_parse_exposes_properties() {
        let document = parse("#+AUTHOR: someone\n* One", true);
        assert_eq!(document.properties.keyword("AUTHOR"), Some("someone"));
        assert_eq!(document.sections.len(), 1);
    }

    #[test]
    fn test_document_serializes_to_json() {
        let document = parse("* One\n- item", true);
        let json = serde_json::to_string(&document).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.children, document.children);
    }

    #[test]
    fn test_fuzz_target_seeds() {
        for input in [
            "",
            "* a\n** b\n*** c",
            "#+BEGIN_SRC\n* x\n",
            "*****",
            "- \n  - \n    - [",
            "|",
            "[[[[[[",
            "*/_=~+*/_=~+",
            "\\\\\\\\",
        ] {
            convert_target(input);
        }
    }
}
