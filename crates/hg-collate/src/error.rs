use std::path::PathBuf;

/// Errors from writing collated output.
#[derive(Debug, thiserror::Error)]
pub enum CollateError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl CollateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for collation operations.
pub type CollateResult<T> = Result<T, CollateError>;
