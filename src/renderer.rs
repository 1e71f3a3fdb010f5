/// HTML renderer for Org documents
use crate::ast::{
    BlockBody, BlockType, Checkbox, Document, Heading, Link, LinkKind, ListKind, Marker, Node,
};
use crate::config::Options;
use crate::inline::escape_text;
use crate::properties::{Properties, TodoKeyword};
use crate::section::{Section, SectionIndex};

/// Turns a parsed document into output text.
pub trait Renderer {
    fn render(&self, document: &Document) -> String;
}

pub struct HtmlRenderer {
    options: Options,
}

impl HtmlRenderer {
    pub fn new(options: Options) -> Self {
        HtmlRenderer { options }
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, document: &Document) -> String {
        let context = Context {
            options: &self.options,
            properties: &document.properties,
        };
        let body = render_blocks(&document.children, &context);

        let toc = match document.properties.toc_depth() {
            Some(depth) if self.options.toc && !document.sections.is_empty() => {
                render_toc(&document.sections, depth, &context)
            }
            _ => return body,
        };

        if body.is_empty() {
            toc
        } else {
            format!("{toc}\n{body}")
        }
    }
}

/// Everything rendering reads besides the node itself.
struct Context<'a> {
    options: &'a Options,
    properties: &'a Properties,
}

/// Block siblings, one per line. Blocks that produce nothing leave no gap.
fn render_blocks(nodes: &[Node], context: &Context) -> String {
    nodes
        .iter()
        .map(|node| render_node(node, context))
        .filter(|html| !html.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_inline(nodes: &[Node], context: &Context) -> String {
    nodes.iter().map(|node| render_node(node, context)).collect()
}

fn render_node(node: &Node, context: &Context) -> String {
    match node {
        Node::Heading(heading) => render_heading(heading, context),
        Node::Drawer { name, children } => {
            if context.properties.drawer_visible(name) {
                render_blocks(children, context)
            } else {
                String::new()
            }
        }
        Node::PropertyDrawer(_) | Node::Keyword { .. } | Node::Blankline(_) => String::new(),
        Node::Block {
            block_type, body, ..
        } => render_block(block_type, body, context),
        Node::BlockResult { lines, escape } => format!(
            "<pre class=\"example\">\n{}\n</pre>",
            escape_text(&lines.join("\n"), *escape)
        ),
        Node::Table(rows) => format!("<table>\n{}\n</table>", render_blocks(rows, context)),
        Node::TableRow { header, cells } => {
            let tag = if *header { "th" } else { "td" };
            let cells: Vec<String> = cells
                .iter()
                .map(|cell| format!("<{tag}>{}</{tag}>", render_inline(cell, context)))
                .collect();
            format!("<tr>\n{}\n</tr>", cells.join("\n"))
        }
        Node::List { kind, children } => {
            let tag = match kind {
                ListKind::Ordered => "ol",
                ListKind::Unordered => "ul",
                ListKind::Descriptive => "dl",
            };
            format!("<{tag}>\n{}\n</{tag}>", render_blocks(children, context))
        }
        Node::ListItem {
            checkbox,
            term,
            children,
        } => {
            let mut parts = Vec::new();
            if let Some(checkbox) = checkbox {
                parts.push(render_checkbox(*checkbox).to_string());
            }
            let body = render_blocks(children, context);
            if !body.is_empty() {
                parts.push(body);
            }

            let (open, close) = match term {
                Some(term) => (
                    format!("<dt>{}</dt>\n<dd>", render_inline(term, context)),
                    "</dd>",
                ),
                None => ("<li>".to_string(), "</li>"),
            };
            if parts.is_empty() {
                format!("{open}{close}")
            } else {
                format!("{open}\n{}\n{close}", parts.join("\n"))
            }
        }
        Node::Paragraph(children) => format!("<p>\n{}\n</p>", render_inline(children, context)),
        Node::Hr => "<hr/>".to_string(),

        Node::Text(text) => text.clone(),
        Node::Emphasis { marker, children } => {
            let content = render_inline(children, context);
            match marker {
                Marker::Bold => format!("<b>{content}</b>"),
                Marker::Italic => format!("<i>{content}</i>"),
                Marker::Underline => {
                    format!("<span style=\"text-decoration:underline\">{content}</span>")
                }
                Marker::Strike => format!("<del>{content}</del>"),
                Marker::Code | Marker::Verbatim => format!("<code>{content}</code>"),
            }
        }
        Node::Link(link) => render_link(link),
        Node::Footnote(label) => format!(
            "<sup><a id=\"fnr:{label}\" class=\"footref\" href=\"#fn.{label}\">{label}</a></sup>"
        ),
        Node::Timestamp {
            date,
            day,
            time,
            repeater,
        } => {
            let mut stamp = date.clone();
            for part in [day, time, repeater].into_iter().flatten() {
                stamp.push(' ');
                stamp.push_str(part);
            }
            format!(
                "<span class=\"timestamp-wrapper\"><span class=\"timestamp\">&lt;{}&gt;</span></span>",
                escape_text(&stamp, true)
            )
        }
        Node::Percent(cookie) => format!("<code>[{cookie}]</code>"),
        Node::LineBreak => "<br/>".to_string(),
    }
}

fn render_heading(heading: &Heading, context: &Context) -> String {
    let level = (heading.level as i64 + i64::from(context.options.offset)).clamp(1, 6);

    // Separators only sit between parts that render something
    let mut parts = Vec::new();
    if let Some(keyword) = &heading.keyword {
        parts.push(render_todo_keyword(keyword));
    }
    if let Some(priority) = heading.priority {
        parts.push(format!("<span class=\"priority\">[{priority}]</span>"));
    }
    parts.push(render_inline(&heading.title, context));
    for tag in &heading.tags {
        parts.push(format!("<span class=\"tag\">{tag}</span>"));
    }
    parts.retain(|part| !part.is_empty());
    let title = parts.join(" ");

    let html = format!("<h{level} id=\"{}\">{title}</h{level}>", heading.anchor);
    let children = render_blocks(&heading.children, context);
    if children.is_empty() {
        html
    } else {
        format!("{html}\n{children}")
    }
}

fn render_todo_keyword(keyword: &TodoKeyword) -> String {
    let class = if keyword.done { "done" } else { "todo" };
    format!(
        "<span class=\"{class}\">{}</span>",
        escape_text(&keyword.name, true)
    )
}

fn render_block(block_type: &BlockType, body: &BlockBody, context: &Context) -> String {
    if let (BlockType::Src { language }, BlockBody::Raw { text, .. }) = (block_type, body)
        && !language.is_empty()
        && let Some(highlight) = context.options.highlight
        && let Some(html) = highlight(language, text)
    {
        return html;
    }

    let content = match body {
        BlockBody::Raw { text, escape } => escape_text(text, *escape),
        BlockBody::Nodes(nodes) if *block_type == BlockType::Verse => render_inline(nodes, context),
        BlockBody::Nodes(nodes) => render_blocks(nodes, context),
    };

    match block_type {
        BlockType::Src { language } if language.is_empty() => format!("<pre>\n{content}\n</pre>"),
        BlockType::Src { language } => format!(
            "<pre class=\"src src-{}\">\n{content}\n</pre>",
            escape_text(language, true)
        ),
        BlockType::Example => format!("<pre class=\"example\">\n{content}\n</pre>"),
        BlockType::Quote => format!("<blockquote>\n{content}\n</blockquote>"),
        BlockType::Center => format!("<div style=\"text-align: center;\">\n{content}\n</div>"),
        BlockType::Verse => format!("<p class=\"verse\">\n{content}\n</p>"),
        BlockType::Export { backend } if backend == "html" => content,
        BlockType::Export { .. } => String::new(),
        BlockType::Special(name) => format!(
            "<div class=\"{}\">\n{content}\n</div>",
            escape_text(name, true)
        ),
    }
}

fn render_checkbox(checkbox: Checkbox) -> &'static str {
    match checkbox {
        Checkbox::Checked => "<input type=\"checkbox\" checked=\"checked\" />",
        Checkbox::Empty => "<input type=\"checkbox\" />",
        Checkbox::Partial => "<input type=\"checkbox\" class=\"partial\" />",
    }
}

fn render_link(link: &Link) -> String {
    let url = &link.url;
    match link.kind {
        LinkKind::Image => format!("<img src=\"{url}\"/>"),
        LinkKind::Video => format!("<video src=\"{url}\">{url}</video>"),
        LinkKind::Plain => format!(
            "<a href=\"{url}\">{}</a>",
            link.description.as_deref().unwrap_or(url)
        ),
    }
}

fn render_toc(sections: &SectionIndex, depth: usize, context: &Context) -> String {
    let items: Vec<String> = sections
        .roots()
        .map(|section| render_toc_item(sections, section, 1, depth, context))
        .collect();
    format!(
        "<div id=\"table-of-contents\">\n<h2>Table of Contents</h2>\n<div id=\"text-table-of-contents\">\n<ul>\n{}\n</ul>\n</div>\n</div>",
        items.join("\n")
    )
}

fn render_toc_item(
    sections: &SectionIndex,
    section: &Section,
    level: usize,
    depth: usize,
    context: &Context,
) -> String {
    let title = render_inline(&section.title, context);
    let label = match &section.keyword {
        Some(keyword) if title.is_empty() => render_todo_keyword(keyword),
        Some(keyword) => format!("{} {title}", render_todo_keyword(keyword)),
        None => title,
    };
    let mut html = format!("<li><a href=\"#{}\">{label}</a>", section.anchor);

    if level < depth && !section.children.is_empty() {
        let children: Vec<String> = sections
            .children(section)
            .map(|child| render_toc_item(sections, child, level + 1, depth, context))
            .collect();
        html.push_str(&format!("\n<ul>\n{}\n</ul>\n", children.join("\n")));
    }

    html.push_str("</li>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    fn render(input: &str) -> String {
        render_with(input, Options::default())
    }

    fn render_with(input: &str, options: Options) -> String {
        let document = Parser::new(options.escape).parse(input);
        HtmlRenderer::new(options).render(&document)
    }

    #[test]
    fn test_single_heading() {
        assert_eq!(render("* hello"), "<h1 id=\"heading-1\">hello</h1>");
    }

    #[test]
    fn test_heading_offset_is_clamped() {
        let options = Options {
            offset: 2,
            ..Options::default()
        };
        assert_eq!(
            render_with("* a\n***** b", options),
            "<h3 id=\"heading-1\">a</h3>\n<h6 id=\"heading-1.1\">b</h6>"
        );

        let options = Options {
            offset: -3,
            ..Options::default()
        };
        assert_eq!(render_with("** a", options), "<h1 id=\"heading-1\">a</h1>");
    }

    #[test]
    fn test_heading_anatomy() {
        assert_eq!(
            render("* TODO [#B] Write docs :work:"),
            "<h1 id=\"heading-1\"><span class=\"todo\">TODO</span> <span class=\"priority\">[B]</span> Write docs <span class=\"tag\">work</span></h1>"
        );
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(
            render("- a\n  - b\n- c"),
            "<ul>\n<li>\n<p>\na\n</p>\n<ul>\n<li>\n<p>\nb\n</p>\n</li>\n</ul>\n</li>\n<li>\n<p>\nc\n</p>\n</li>\n</ul>"
        );
    }

    #[test]
    fn test_checkbox_and_descriptive_items() {
        assert_eq!(
            render("- [ ] open\n- [X]"),
            "<ul>\n<li>\n<input type=\"checkbox\" />\n<p>\nopen\n</p>\n</li>\n<li>\n<input type=\"checkbox\" checked=\"checked\" />\n</li>\n</ul>"
        );
        assert_eq!(
            render("- Rust :: fast"),
            "<dl>\n<dt>Rust</dt>\n<dd>\n<p>\nfast\n</p>\n</dd>\n</dl>"
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            render("|a|b|\n|-|-|\n|c|d|"),
            "<table>\n<tr>\n<th>a</th>\n<th>b</th>\n</tr>\n<tr>\n<td>c</td>\n<td>d</td>\n</tr>\n</table>"
        );
    }

    #[test]
    fn test_unterminated_block() {
        assert_eq!(
            render("#+BEGIN_SRC python\nprint(1)"),
            "<p>\n#+BEGIN_SRC python\n</p>\n<p>\nprint(1)\n</p>"
        );
    }

    #[test]
    fn test_blocks() {
        assert_eq!(
            render("#+BEGIN_SRC rust\nif a < b {}\n#+END_SRC"),
            "<pre class=\"src src-rust\">\nif a &lt; b {}\n</pre>"
        );
        assert_eq!(
            render("#+BEGIN_EXAMPLE\n  x\n#+END_EXAMPLE"),
            "<pre class=\"example\">\nx\n</pre>"
        );
        assert_eq!(
            render("#+BEGIN_QUOTE\nwise words\n#+END_QUOTE"),
            "<blockquote>\n<p>\nwise words\n</p>\n</blockquote>"
        );
        assert_eq!(
            render("#+BEGIN_VERSE\none\ntwo\n#+END_VERSE"),
            "<p class=\"verse\">\none<br/>\ntwo\n</p>"
        );
        assert_eq!(
            render("#+BEGIN_EXPORT html\n<b>raw</b>\n#+END_EXPORT"),
            "<b>raw</b>"
        );
        assert_eq!(render("#+BEGIN_EXPORT latex\n\\LaTeX\n#+END_EXPORT"), "");
        assert_eq!(
            render("#+BEGIN_NOTE\nheads up\n#+END_NOTE"),
            "<div class=\"note\">\n<p>\nheads up\n</p>\n</div>"
        );
    }

    #[test]
    fn test_highlighter_is_used_for_src_blocks() {
        fn fake(language: &str, code: &str) -> Option<String> {
            (language == "rust").then(|| format!("<pre class=\"hl\">{code}</pre>"))
        }
        let options = Options {
            highlight: Some(fake),
            ..Options::default()
        };
        assert_eq!(
            render_with("#+BEGIN_SRC rust\nlet x = 1;\n#+END_SRC", options),
            "<pre class=\"hl\">let x = 1;</pre>"
        );
        assert_eq!(
            render_with("#+BEGIN_SRC zzz\nx\n#+END_SRC", options),
            "<pre class=\"src src-zzz\">\nx\n</pre>"
        );
    }

    #[test]
    fn test_results_and_drawers() {
        assert_eq!(
            render("#+RESULTS:\n: <ok>"),
            "<pre class=\"example\">\n&lt;ok&gt;\n</pre>"
        );
        assert_eq!(render(":NOTES:\nkept\n:END:"), "<p>\nkept\n</p>");
        assert_eq!(render(":LOGBOOK:\nhidden\n:END:"), "");
        assert_eq!(
            render("#+OPTIONS: d:nil\n:NOTES:\nhidden\n:END:"),
            ""
        );
    }

    #[test]
    fn test_inline_objects() {
        assert_eq!(
            render("*b* /i/ _u_ +s+ =c= ~v~"),
            "<p>\n<b>b</b> <i>i</i> <span style=\"text-decoration:underline\">u</span> <del>s</del> <code>c</code> <code>v</code>\n</p>"
        );
        assert_eq!(
            render("[[https://x.org][X]] [[a.png]] [[b.webm]] [fn:1] [1/2]"),
            "<p>\n<a href=\"https://x.org\">X</a> <img src=\"a.png\"/> <video src=\"b.webm\">b.webm</video> <sup><a id=\"fnr:1\" class=\"footref\" href=\"#fn.1\">1</a></sup> <code>[1/2]</code>\n</p>"
        );
        assert_eq!(
            render("at <2021-03-04 Thu>"),
            "<p>\nat <span class=\"timestamp-wrapper\"><span class=\"timestamp\">&lt;2021-03-04 Thu&gt;</span></span>\n</p>"
        );
    }

    #[test]
    fn test_escaping_can_be_disabled() {
        assert_eq!(render("a < b & c"), "<p>\na &lt; b &amp; c\n</p>");
        let options = Options {
            escape: false,
            ..Options::default()
        };
        assert_eq!(render_with("<em>raw</em>", options), "<p>\n<em>raw</em>\n</p>");
    }

    #[test]
    fn test_table_of_contents() {
        let input = "#+OPTIONS: toc:t\n* TODO One\n** Two\n* Three";
        assert_eq!(
            render(input),
            "<div id=\"table-of-contents\">\n<h2>Table of Contents</h2>\n<div id=\"text-table-of-contents\">\n<ul>\n\
             <li><a href=\"#heading-1\"><span class=\"todo\">TODO</span> One</a>\n<ul>\n<li><a href=\"#heading-1.1\">Two</a></li>\n</ul>\n</li>\n\
             <li><a href=\"#heading-2\">Three</a></li>\n</ul>\n</div>\n</div>\n\
             <h1 id=\"heading-1\"><span class=\"todo\">TODO</span> One</h1>\n<h2 id=\"heading-1.1\">Two</h2>\n<h1 id=\"heading-2\">Three</h1>"
        );
    }

    #[test]
    fn test_toc_needs_both_switches() {
        let input = "#+OPTIONS: toc:1\n* One\n** Two";
        let html = render(input);
        assert!(html.starts_with("<div id=\"table-of-contents\">"));
        assert!(!html.contains("href=\"#heading-1.1\""));

        let options = Options {
            toc: false,
            ..Options::default()
        };
        assert!(!render_with(input, options).contains("table-of-contents"));
        assert!(!render("* One").contains("table-of-contents"));
    }

    #[test]
    fn test_empty_heading_parts_leave_no_stray_spaces() {
        assert_eq!(
            render("* TODO"),
            "<h1 id=\"heading-1\"><span class=\"todo\">TODO</span></h1>"
        );
        assert_eq!(
            render("* :tag:"),
            "<h1 id=\"heading-1\"><span class=\"tag\">tag</span></h1>"
        );
        assert_eq!(
            render("* DONE :a:b:"),
            "<h1 id=\"heading-1\"><span class=\"done\">DONE</span> <span class=\"tag\">a</span> <span class=\"tag\">b</span></h1>"
        );
        assert!(render("#+OPTIONS: toc:t\n* TODO").contains(
            "<li><a href=\"#heading-1\"><span class=\"todo\">TODO</span></a></li>"
        ));
    }

    #[test]
    fn test_custom_id_anchor() {
        assert_eq!(
            render("* Intro\n:PROPERTIES:\n:CUSTOM_ID: start\n:END:"),
            "<h1 id=\"start\">Intro</h1>"
        );
    }
}
