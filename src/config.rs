use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::highlight::Highlight;

/// Conversion options.
///
/// Any subset of `offset`, `toc` and `escape` may be given in TOML; the rest
/// keep their defaults. The highlighter can only be set from code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Added to every heading level before rendering, clamped to `h1`..`h6`.
    pub offset: i32,
    /// Master switch for the table of contents. The document still has to
    /// ask for one with `#+OPTIONS: toc:t`.
    pub toc: bool,
    /// HTML-escape literal text while parsing.
    pub escape: bool,
    #[serde(skip)]
    pub highlight: Option<Highlight>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            offset: 0,
            toc: true,
            escape: true,
            highlight: None,
        }
    }
}

impl Options {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.offset, 0);
        assert!(options.toc);
        assert!(options.escape);
        assert!(options.highlight.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let options = Options::from_toml("offset = 1\n").unwrap();
        assert_eq!(options.offset, 1);
        assert!(options.toc);
        assert!(options.escape);

        let options = Options::from_toml("").unwrap();
        assert_eq!(options.offset, 0);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Options::from_toml("offset = \"high\"").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "toc = false\nescape = false").unwrap();

        let options = Options::load(file.path()).unwrap();
        assert!(!options.toc);
        assert!(!options.escape);
    }

    #[test]
    fn test_load_errors_carry_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = Options::load(&missing).unwrap_err();
        assert!(matches!(&err, Error::Read { path, .. } if *path == missing));
        assert!(err.to_string().contains("missing.toml"));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "toc = [").unwrap();
        assert!(matches!(
            Options::load(file.path()),
            Err(Error::Parse { .. })
        ));
    }
}
