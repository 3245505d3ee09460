//! Batch document generation over a sealed graph.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hg_catalog::EntityCatalog;
use hg_collate::OutputSink;
use hg_registry::IdentityResolver;
use hg_render::{Document, DocumentRenderer};
use hg_snapshot::SnapshotEngine;
use hg_store::{FactReader, GraphView};
use hg_types::{format_timestamp, EntityRef, Epoch, Timestamp, Uri};

use crate::error::{SdkError, SdkResult};

/// An entity whose document could not be produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityFailure {
    pub uri: Uri,
    pub error: String,
}

/// Outcome of one generation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Epoch of the sealed view every worker read.
    pub epoch: Epoch,
    pub as_of: Timestamp,
    /// Identity classes in the view.
    pub classes: usize,
    /// Documents handed to the sink.
    pub rendered: usize,
    pub failures: Vec<EntityFailure>,
    /// Classes never started because the run was cancelled.
    pub skipped: usize,
    pub cancelled: bool,
}

#[derive(Default)]
struct ClassOutcome {
    rendered: usize,
    failures: Vec<EntityFailure>,
}

/// Per-entity step of a run: materialize and render one entity.
pub type RenderFn = dyn Fn(EntityRef, &Timestamp) -> SdkResult<Document> + Send + Sync;

/// Renders every identity class of a sealed view on a bounded worker pool.
///
/// All workers share one `Arc<GraphView>`, so every document of a run
/// reflects the same epoch. The only shared mutable state is the
/// [`OutputSink`].
pub struct Generator {
    catalog: EntityCatalog<GraphView>,
    render: Arc<RenderFn>,
    workers: usize,
}

impl Generator {
    pub fn new(view: Arc<GraphView>, workers: usize) -> Self {
        let engine = SnapshotEngine::new(Arc::clone(&view));
        let renderer = DocumentRenderer::new();
        Self::with_render(view, workers, move |entity, as_of| {
            let snapshot = engine.materialize(entity, as_of)?;
            Ok(renderer.render(&snapshot)?)
        })
    }

    /// A generator that produces each document with `render` instead of
    /// the standard snapshot renderer.
    pub fn with_render<F>(view: Arc<GraphView>, workers: usize, render: F) -> Self
    where
        F: Fn(EntityRef, &Timestamp) -> SdkResult<Document> + Send + Sync + 'static,
    {
        Self {
            catalog: EntityCatalog::new(view),
            render: Arc::new(render),
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Render every class at `as_of` into `sink`.
    ///
    /// Work is scheduled per canonical class; a task renders each member of
    /// its class that has catalog metadata of its own. Cancelling `cancel`
    /// lets started tasks finish and drops the rest.
    pub async fn run(
        &self,
        as_of: Timestamp,
        sink: Arc<OutputSink>,
        cancel: CancellationToken,
    ) -> SdkResult<RunReport> {
        let view = Arc::clone(self.catalog.graph());
        let classes = view.identities().canonical_entities();
        let mut report = RunReport {
            epoch: view.epoch(),
            as_of,
            classes: classes.len(),
            rendered: 0,
            failures: Vec::new(),
            skipped: 0,
            cancelled: false,
        };
        info!(
            epoch = %report.epoch,
            as_of = %format_timestamp(&as_of),
            classes = report.classes,
            workers = self.workers,
            "generation started"
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks: JoinSet<ClassOutcome> = JoinSet::new();
        for (scheduled, root) in classes.iter().copied().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => Some(
                    permit.map_err(|e| SdkError::Internal(format!("worker pool closed: {e}")))?,
                ),
            };
            let Some(permit) = permit else {
                report.cancelled = true;
                report.skipped = classes.len() - scheduled;
                break;
            };
            let catalog = self.catalog.clone();
            let render = Arc::clone(&self.render);
            let sink = Arc::clone(&sink);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                render_class(&catalog, render.as_ref(), root, &as_of, &sink)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome =
                joined.map_err(|e| SdkError::Internal(format!("render task lost: {e}")))?;
            report.rendered += outcome.rendered;
            report.failures.extend(outcome.failures);
        }
        report.failures.sort_by(|a, b| a.uri.cmp(&b.uri));

        if report.cancelled {
            warn!(skipped = report.skipped, rendered = report.rendered, "generation cancelled");
        } else {
            info!(
                rendered = report.rendered,
                failed = report.failures.len(),
                "generation finished"
            );
        }
        Ok(report)
    }
}

fn render_class(
    catalog: &EntityCatalog<GraphView>,
    render: &RenderFn,
    root: EntityRef,
    as_of: &Timestamp,
    sink: &OutputSink,
) -> ClassOutcome {
    let mut outcome = ClassOutcome::default();
    for member in catalog.graph().aliases_of(root) {
        let Some(uri) = catalog.graph().uri_of(member) else {
            continue;
        };
        if !catalog.has_entry(member, as_of) {
            continue;
        }
        // Panics stay with the entity that raised them.
        let result = catch_unwind(AssertUnwindSafe(|| render(member, as_of)))
            .unwrap_or_else(|_| Err(SdkError::Internal("renderer panicked".into())));
        match result {
            Ok(document) => {
                debug!(uri = %document.uri, "document ready");
                sink.push(document);
                outcome.rendered += 1;
            }
            Err(e) => {
                warn!(uri = %uri, error = %e, "entity failed to render");
                outcome.failures.push(EntityFailure {
                    uri,
                    error: e.to_string(),
                });
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    use hg_catalog::{record, EntityMetadata};
    use hg_registry::IdentityRegistry;
    use hg_store::InMemoryFactStore;
    use hg_types::parse_timestamp;

    const CHURCH: &str = "https://ex.org/church";
    const NARTHEX: &str = "https://ex.org/narthex";
    const BEMA: &str = "https://ex.org/bema";

    fn uri(s: &str) -> Uri {
        Uri::parse(s).unwrap()
    }

    fn sealed_view() -> Arc<GraphView> {
        let store = InMemoryFactStore::new(Arc::new(IdentityRegistry::default()));
        let entries = [
            (CHURCH, "Panagia Phorbiottisa"),
            (NARTHEX, "Narthex"),
            (BEMA, "Bema"),
        ];
        for (target, label) in entries {
            record(&store, &EntityMetadata::new(uri(target)).with_label(label)).unwrap();
        }
        store.seal()
    }

    // -----------------------------------------------------------------------
    // Failure isolation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn failing_entities_do_not_stop_the_run() {
        let view = sealed_view();
        let engine = SnapshotEngine::new(Arc::clone(&view));
        let lookup = Arc::clone(&view);
        let generator = Generator::with_render(Arc::clone(&view), 2, move |entity, as_of| {
            let target = lookup.uri_of(entity).unwrap();
            if target == uri(NARTHEX) {
                return Err(SdkError::UnknownEntity(target.to_string()));
            }
            if target == uri(BEMA) {
                panic!("layout bug");
            }
            Ok(DocumentRenderer::new().render(&engine.materialize(entity, as_of)?)?)
        });

        let sink = Arc::new(OutputSink::new());
        let report = generator
            .run(
                parse_timestamp("2024-05-01").unwrap(),
                Arc::clone(&sink),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!report.cancelled);
        assert_eq!(report.classes, 3);
        assert_eq!(report.rendered, 1);
        let failed: Vec<&str> = report.failures.iter().map(|f| f.uri.as_str()).collect();
        assert_eq!(failed, vec![BEMA, NARTHEX]);
        assert!(report.failures[0].error.contains("panicked"));
        assert!(report.failures[1].error.contains(NARTHEX));

        let docs = sink.drain();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].uri, uri(CHURCH));
    }

    #[tokio::test]
    async fn standard_generator_renders_every_entry() {
        let view = sealed_view();
        let sink = Arc::new(OutputSink::new());
        let report = Generator::new(view, 4)
            .run(
                parse_timestamp("2024-05-01").unwrap(),
                Arc::clone(&sink),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(report.rendered, 3);
        assert!(report.failures.is_empty());
        assert_eq!(sink.len(), 3);
    }
}
