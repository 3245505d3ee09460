//! Append-only temporal relationship store for hgraph.
//!
//! Facts are `(subject, predicate, object)` triples with a half-open
//! validity interval. They are never mutated: corrections append a new fact
//! and a retraction closing the old one.
//!
//! # Orientation
//!
//! Each relationship is stored in exactly one direction. Inverse-side
//! predicates are flipped onto the primary member of their pair on write,
//! and symmetric facts put the smaller URI first. Reads derive the other
//! direction, so the neighborhood of either endpoint is complete and
//! re-ingesting a fact from either side is a no-op.
//!
//! # Phases
//!
//! - Ingestion: writes go through [`InMemoryFactStore`] (the
//!   [`FactWriter`]), each bumping the epoch, each appended to the
//!   [`FactLog`] when one is attached.
//! - Generation: [`InMemoryFactStore::seal`] freezes a [`GraphView`] that all
//!   workers share; writes fail with [`StoreError::Sealed`] until unsealed.

pub mod error;
pub mod fact;
pub mod log;
pub mod memory;
mod table;
pub mod traits;
pub mod view;

pub use error::{StoreError, StoreResult};
pub use fact::{Fact, FactId, FactObject, FactRecord, FactView, ObjectTerm};
pub use log::{FactLog, LogRecord, LoggedObject, Recovery};
pub use memory::{InMemoryFactStore, ReplayReport};
pub use traits::{FactReader, FactWriter, GraphReader};
pub use view::GraphView;
