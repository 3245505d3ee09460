//! Output layout for hgraph documents.
//!
//! Every document lands at `<slug>-<suffix>.md`, where the slug and the
//! 8-hex suffix both derive from the folded label. Distinct entities whose
//! labels fold to the same key share one file: their documents are ordered
//! by URI and joined by [`DOCUMENT_SEPARATOR`], never overwritten.
//!
//! - [`slug_for`] / [`label_key`] -- diacritic folding and slugging
//! - [`assign_paths`] / [`split_documents`] -- grouping and its inverse
//! - [`OutputSink`] -- the single writer shared by all workers of a run

pub mod error;
pub mod group;
pub mod sink;
pub mod slug;

pub use error::{CollateError, CollateResult};
pub use group::{assign_paths, join_documents, split_documents};
pub use hg_render::DOCUMENT_SEPARATOR;
pub use sink::{Collision, FileFailure, FlushReport, OutputSink};
pub use slug::{file_name_for, fold_label, label_key, slug_for};
