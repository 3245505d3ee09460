use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("unknown predicate: {0:?}")]
    UnknownPredicate(String),

    #[error("invalid timestamp {0:?}: expected RFC 3339 or YYYY-MM-DD")]
    InvalidTimestamp(String),

    #[error("invalid validity interval: valid_to {to} is not after valid_from {from}")]
    InvalidInterval { from: String, to: String },
}
