//! Snapshot engine for hgraph.
//!
//! [`SnapshotEngine::materialize`] computes the closed neighborhood of one
//! entity at one moment: its identity class, types, literal properties and
//! every relationship touching any alias, stored or derived. Relationships
//! become [`Sentence`]s, deduplicated by text and sorted by code point, so
//! equal graph state always gives an equal [`Snapshot`].

pub mod engine;
pub mod error;
pub mod snapshot;

pub use engine::SnapshotEngine;
pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{EncodingAnomaly, Sentence, Snapshot};
