//! High-level SDK for hgraph.
//!
//! [`HeritageGraph`] is the entry point for applications: it loads
//! configuration, replays the fact log, ingests JSON Lines records and runs
//! batch generation on a bounded worker pool.

pub mod config;
pub mod error;
pub mod generate;
pub mod graph;
pub mod ingest;

pub use config::{GenerationConfig, HgConfig, StoreConfig, VocabularyConfig, DEFAULT_CONFIG_FILE};
pub use error::{SdkError, SdkResult};
pub use generate::{EntityFailure, Generator, RenderFn, RunReport};
pub use graph::{AliasReport, GenerateOutcome, HeritageGraph};
pub use ingest::{Applied, IngestFailure, IngestRecord, IngestReport, Ingestor};

// Re-export key types
pub use hg_collate::FlushReport;
pub use hg_registry::MergePolicy;
pub use hg_render::Document;
pub use hg_snapshot::Snapshot;
pub use hg_store::ReplayReport;
pub use hg_types::{format_timestamp, parse_timestamp, Timestamp, Uri};
