use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use hg_collate::{FlushReport, OutputSink};
use hg_registry::{IdentityRegistry, IdentityResolver};
use hg_render::{Document, DocumentRenderer};
use hg_snapshot::{Snapshot, SnapshotEngine};
use hg_store::{FactLog, FactReader, GraphView, InMemoryFactStore, ReplayReport};
use hg_types::{EntityRef, Epoch, Timestamp, Uri};

use crate::config::HgConfig;
use crate::error::{SdkError, SdkResult};
use crate::generate::{Generator, RunReport};
use crate::ingest::{IngestReport, Ingestor};

/// Identity class of one URI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AliasReport {
    pub uri: Uri,
    pub canonical: Uri,
    /// Every member, the queried URI included, sorted.
    pub aliases: Vec<Uri>,
    pub primary_type: Option<String>,
}

/// A generation run plus the files it wrote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerateOutcome {
    pub run: RunReport,
    pub output_dir: PathBuf,
    pub flush: FlushReport,
}

/// High-level hgraph API.
///
/// Owns the store and its log, and switches between the ingestion phase
/// and the generation phase around each read.
pub struct HeritageGraph {
    config: HgConfig,
    ingestor: Ingestor,
    store: Arc<InMemoryFactStore>,
}

impl HeritageGraph {
    /// Open the graph backed by the configured fact log, replaying it first.
    pub fn open(config: HgConfig) -> SdkResult<(Self, ReplayReport)> {
        let log = FactLog::open(&config.store.log_path, config.store.sync_every_write)?;
        let registry = Arc::new(IdentityRegistry::new(config.generation.merge_policy));
        let (store, replay) = InMemoryFactStore::recover(registry, log)?;
        let graph = Self::with_store(config, store)?;
        Ok((graph, replay))
    }

    /// A graph without durability.
    pub fn in_memory(config: HgConfig) -> SdkResult<Self> {
        let registry = Arc::new(IdentityRegistry::new(config.generation.merge_policy));
        Self::with_store(config, InMemoryFactStore::new(registry))
    }

    fn with_store(config: HgConfig, store: InMemoryFactStore) -> SdkResult<Self> {
        let ingestor = Ingestor::new(config.vocabulary()?);
        Ok(Self {
            config,
            ingestor,
            store: Arc::new(store),
        })
    }

    /// Replay a fact log read-only and report its health.
    pub fn verify_log(path: &Path) -> SdkResult<ReplayReport> {
        let log = FactLog::open(path, false)?;
        let (_, report) = InMemoryFactStore::recover(Arc::new(IdentityRegistry::default()), log)?;
        Ok(report)
    }

    pub fn config(&self) -> &HgConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<InMemoryFactStore> {
        &self.store
    }

    pub fn epoch(&self) -> Epoch {
        self.store.epoch()
    }

    // ---- Ingestion ----

    pub fn ingest_path(&self, path: &Path) -> SdkResult<IngestReport> {
        let file = File::open(path).map_err(|source| SdkError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        self.ingest_reader(BufReader::new(file))
    }

    pub fn ingest_reader(&self, reader: impl std::io::BufRead) -> SdkResult<IngestReport> {
        self.ingestor.ingest_reader(self.store.as_ref(), reader)
    }

    // ---- Reads ----

    /// Materialize one entity against a sealed view.
    pub fn snapshot(&self, uri: &Uri, as_of: &Timestamp) -> SdkResult<Snapshot> {
        self.with_view(|view| Ok(SnapshotEngine::new(view).materialize_uri(uri, as_of)?))
    }

    /// Render one entity's document.
    pub fn render(&self, uri: &Uri, as_of: &Timestamp) -> SdkResult<Document> {
        let snapshot = self.snapshot(uri, as_of)?;
        Ok(DocumentRenderer::new().render(&snapshot)?)
    }

    pub fn aliases(&self, uri: &Uri) -> SdkResult<AliasReport> {
        let registry = self.store.registry();
        let entity = registry
            .lookup(uri)
            .ok_or_else(|| SdkError::UnknownEntity(uri.to_string()))?;
        let uri_of = |e: EntityRef| {
            registry
                .uri_of(e)
                .ok_or_else(|| SdkError::Internal(format!("dangling entity {e}")))
        };
        let aliases = registry
            .aliases_of(entity)
            .into_iter()
            .map(uri_of)
            .collect::<SdkResult<Vec<_>>>()?;
        Ok(AliasReport {
            uri: uri.clone(),
            canonical: uri_of(registry.canonical(entity))?,
            aliases,
            primary_type: registry.primary_type(entity)?,
        })
    }

    // ---- Generation ----

    /// Seal the graph, render every entity with catalog metadata, and write
    /// the documents under `output_dir` (the configured one by default).
    ///
    /// On cancellation, documents finished before the signal are still
    /// written.
    pub async fn generate(
        &self,
        as_of: Timestamp,
        output_dir: Option<PathBuf>,
        workers: Option<usize>,
        cancel: CancellationToken,
    ) -> SdkResult<GenerateOutcome> {
        let output_dir = output_dir.unwrap_or_else(|| self.config.generation.output_dir.clone());
        let workers = workers.unwrap_or(self.config.generation.workers);
        let was_sealed = self.store.is_sealed();
        let view = self.store.seal();

        let sink = Arc::new(OutputSink::new());
        let run = Generator::new(view, workers)
            .run(as_of, Arc::clone(&sink), cancel)
            .await;
        if !was_sealed {
            self.store.unseal();
        }
        let run = run?;

        let dir = output_dir.clone();
        let flush = tokio::task::spawn_blocking(move || sink.flush(&dir))
            .await
            .map_err(|e| SdkError::Internal(format!("flush task lost: {e}")))??;
        info!(
            dir = %output_dir.display(),
            files = flush.files,
            collisions = flush.collisions.len(),
            failed = flush.failures.len(),
            "documents written"
        );
        Ok(GenerateOutcome {
            run,
            output_dir,
            flush,
        })
    }

    /// Run `read` against a sealed view, returning to the ingestion phase
    /// afterwards unless the graph was already sealed.
    fn with_view<T>(&self, read: impl FnOnce(Arc<GraphView>) -> SdkResult<T>) -> SdkResult<T> {
        let was_sealed = self.store.is_sealed();
        let view = self.store.seal();
        let result = read(view);
        if !was_sealed {
            self.store.unseal();
        }
        result
    }
}
