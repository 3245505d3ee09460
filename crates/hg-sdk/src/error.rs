use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("malformed record: {0}")]
    Record(#[from] serde_json::Error),

    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("type error: {0}")]
    Type(#[from] hg_types::TypeError),

    #[error("registry error: {0}")]
    Registry(#[from] hg_registry::RegistryError),

    #[error("store error: {0}")]
    Store(#[from] hg_store::StoreError),

    #[error("catalog error: {0}")]
    Catalog(#[from] hg_catalog::CatalogError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] hg_snapshot::SnapshotError),

    #[error("render error: {0}")]
    Render(#[from] hg_render::RenderError),

    #[error("output error: {0}")]
    Collate(#[from] hg_collate::CollateError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type SdkResult<T> = Result<T, SdkError>;
