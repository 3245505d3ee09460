/// Errors from document rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("format error: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Result alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
