//! Content hashing for hgraph.
//!
//! Every content-derived identifier in the workspace (fact ids, slug
//! suffixes, snapshot digests) goes through [`ContentHasher`], which prefixes
//! a domain tag so the same bytes hashed for different purposes never
//! collide.

pub mod hasher;

pub use hasher::{ContentHasher, HasherError};
