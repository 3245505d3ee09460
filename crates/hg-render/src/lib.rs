//! Document renderer for hgraph.
//!
//! Turns a [`Snapshot`](hg_snapshot::Snapshot) into a markdown
//! [`Document`] with YAML-style front matter. The layout is byte-stable:
//! empty sections are omitted, literal text passes through untouched, and
//! the `Generated` stamp is the snapshot's as-of time, so a document is a
//! pure function of entity, time and graph state.

pub mod document;
pub mod error;
pub mod renderer;

pub use document::{Document, DOCUMENT_SEPARATOR};
pub use error::{RenderError, RenderResult};
pub use renderer::DocumentRenderer;
