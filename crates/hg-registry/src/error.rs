use hg_types::{EntityRef, TypeError, Uri};

/// Errors from identifier registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The two identity classes carry contradictory primary types.
    #[error("identity conflict: {left} is a {left_type}, {right} is a {right_type}")]
    IdentityConflict {
        left: Uri,
        left_type: String,
        right: Uri,
        right_type: String,
    },

    /// The URI has never been registered.
    #[error("URI not registered: {0}")]
    NotRegistered(Uri),

    /// The handle was not issued by this registry.
    #[error("unknown entity handle {0}")]
    UnknownEntity(EntityRef),

    /// The arena is full.
    #[error("registry capacity exhausted")]
    CapacityExhausted,

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
