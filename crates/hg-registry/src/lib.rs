//! Identifier registry for hgraph.
//!
//! Assigns stable [`EntityRef`] handles to URIs and reconciles declared
//! co-references (`A is same as B`) into identity classes with a union-find
//! over handles. Handles index an arena, so the graph never holds owning
//! references between entities and cycles in `is same as` chains are
//! harmless.
//!
//! # Resolution
//!
//! - [`IdentityRegistry`] -- the mutable registry used during ingestion;
//!   canonical resolution is lazy with path compression.
//! - [`RegistrySnapshot`] -- an immutable copy with every class precomputed,
//!   shared by all workers of a generation run.
//!
//! Both implement [`IdentityResolver`], the read boundary the store and
//! snapshot engine depend on.
//!
//! [`EntityRef`]: hg_types::EntityRef

pub mod error;
pub mod registry;
pub mod snapshot;
pub mod traits;

pub use error::{RegistryError, RegistryResult};
pub use registry::{IdentityRegistry, MergePolicy};
pub use snapshot::RegistrySnapshot;
pub use traits::IdentityResolver;
