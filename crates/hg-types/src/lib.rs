//! Foundation types for hgraph, the heritage graph snapshot generator.
//!
//! This crate provides the identity, vocabulary, and temporal types used
//! throughout the workspace. Every other hgraph crate depends on `hg-types`.
//!
//! # Key Types
//!
//! - [`ContentId`] -- BLAKE3 content digest for facts, slugs and snapshots
//! - [`Uri`] -- External entity identifier (Wikidata, AAT, CIDOC-CRM, local)
//! - [`EntityRef`] -- Integer handle into the identifier arena
//! - [`Predicate`] -- Closed relationship vocabulary with declared inverses
//! - [`Vocabulary`] -- Load-time resolution of predicate phrases and CRM codes
//! - [`Literal`] -- Literal fact object with optional language tag
//! - [`Validity`] -- Half-open validity interval of a fact
//! - [`Epoch`] -- Generation epoch stamped on sealed views and snapshots

pub mod content;
pub mod error;
pub mod literal;
pub mod predicate;
pub mod temporal;
pub mod uri;

pub use content::ContentId;
pub use error::TypeError;
pub use literal::{AnomalyKind, Literal, TRUNCATION_MARKER};
pub use predicate::{Predicate, PredicateClass, Vocabulary};
pub use temporal::{format_timestamp, parse_timestamp, Epoch, Timestamp, Validity};
pub use uri::{EntityRef, Uri};
