use hg_store::StoreError;
use hg_types::TypeError;

/// Errors from catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
