//! Entity catalog for hgraph.
//!
//! The catalog holds no state of its own. Types, labels, comments, geometry
//! and provenance are facts in the relationship store under reserved
//! predicates; [`EntityCatalog`] reads them back as structured
//! [`Properties`], and [`record`] turns an ingested
//! [`EntityMetadata`] into those facts.

pub mod catalog;
pub mod error;
pub mod metadata;

pub use catalog::{record, EntityCatalog};
pub use error::{CatalogError, CatalogResult};
pub use metadata::{EntityMetadata, Properties};
