use std::path::PathBuf;

/// Errors from the fallible edges of the crate. Conversion itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read options file at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse options file at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid options: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
