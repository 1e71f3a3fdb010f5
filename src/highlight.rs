//! Source block highlighting.
//!
//! A highlighter receives the block language and its raw text, and returns
//! finished HTML for the whole block, or `None` to fall back to an escaped
//! `<pre>` block.

/// `fn(language, code) -> html`
pub type Highlight = fn(&str, &str) -> Option<String>;

#[cfg(feature = "highlight")]
mod syntect_highlight {
    use once_cell::sync::Lazy;
    use syntect::highlighting::ThemeSet;
    use syntect::html::highlighted_html_for_string;
    use syntect::parsing::SyntaxSet;

    static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
    static THEMES: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

    const THEME: &str = "InspiredGitHub";

    /// Highlight with syntect's bundled grammars. An unknown language tag
    /// falls back to first-line detection (shebangs, modelines).
    pub fn syntect(language: &str, code: &str) -> Option<String> {
        let first_line = code.lines().next().unwrap_or_default();
        let syntax = SYNTAXES
            .find_syntax_by_token(language)
            .or_else(|| SYNTAXES.find_syntax_by_first_line(first_line))?;
        let theme = THEMES.themes.get(THEME)?;

        match highlighted_html_for_string(code, &SYNTAXES, syntax, theme) {
            Ok(html) => Some(html),
            Err(err) => {
                log::debug!("highlighting {language} failed: {err}");
                None
            }
        }
    }
}

#[cfg(feature = "highlight")]
pub use syntect_highlight::syntect;
