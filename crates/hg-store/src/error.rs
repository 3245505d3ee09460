use hg_registry::RegistryError;
use hg_types::{ContentId, Epoch, Predicate, TypeError};

/// Errors from relationship store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store is sealed for generation; writes are rejected until
    /// `unseal()`.
    #[error("store is sealed at {0}; writes are rejected")]
    Sealed(Epoch),

    /// No fact with this id has been stored.
    #[error("unknown fact {0}")]
    UnknownFact(ContentId),

    /// The object does not fit the predicate (a literal where an entity is
    /// required, or the reverse).
    #[error("invalid object for '{predicate}': {reason}")]
    InvalidObject {
        predicate: Predicate,
        reason: &'static str,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// Fact log serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
