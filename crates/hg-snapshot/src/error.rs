use hg_crypto::HasherError;
use hg_types::{EntityRef, Uri};

/// Errors from snapshot materialization.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The handle was not issued by the graph's registry.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityRef),

    /// The URI was never registered in the graph.
    #[error("URI not in graph: {0}")]
    UnknownUri(Uri),

    #[error("digest error: {0}")]
    Digest(#[from] HasherError),
}

/// Result alias for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
