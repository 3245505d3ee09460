use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use hg_catalog::{EntityCatalog, Properties};
use hg_crypto::ContentHasher;
use hg_registry::IdentityResolver;
use hg_store::{FactObject, FactReader, GraphReader};
use hg_types::{format_timestamp, EntityRef, Literal, PredicateClass, Timestamp, Uri};

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::{EncodingAnomaly, Sentence, Snapshot};

/// Materializes snapshots from one graph state.
///
/// Cheap to clone; every clone reads the same graph. A generation run hands
/// one engine over a sealed view to all its workers.
pub struct SnapshotEngine<R: ?Sized> {
    catalog: EntityCatalog<R>,
}

/// The part of a snapshot that reaches the rendered document. Hashed for
/// the digest.
#[derive(Serialize)]
struct DigestInput<'a> {
    uri: &'a Uri,
    label: &'a str,
    as_of: String,
    types: &'a [String],
    properties: &'a Properties,
    relationships: Vec<&'a str>,
}

impl<R: GraphReader + ?Sized> SnapshotEngine<R> {
    pub fn new(graph: Arc<R>) -> Self {
        Self {
            catalog: EntityCatalog::new(graph),
        }
    }

    pub fn catalog(&self) -> &EntityCatalog<R> {
        &self.catalog
    }

    /// Materialize by URI.
    pub fn materialize_uri(&self, uri: &Uri, as_of: &Timestamp) -> SnapshotResult<Snapshot> {
        let entity = self
            .catalog
            .graph()
            .lookup(uri)
            .ok_or_else(|| SnapshotError::UnknownUri(uri.clone()))?;
        self.materialize(entity, as_of)
    }

    /// Compute the neighborhood of `entity` valid at `as_of`.
    ///
    /// Relationship facts of every alias are included, each endpoint under
    /// its own label, so the same fact produces the same sentence in every
    /// alias's snapshot. An entity with no facts yields a minimal snapshot.
    pub fn materialize(&self, entity: EntityRef, as_of: &Timestamp) -> SnapshotResult<Snapshot> {
        let graph = self.catalog.graph();
        let uri = graph
            .uri_of(entity)
            .ok_or(SnapshotError::UnknownEntity(entity))?;

        let label = self
            .catalog
            .primary_label(entity, as_of)
            .map(|lit| lit.value)
            .unwrap_or_else(|| uri.to_string());
        let types = self.catalog.types_of(entity, as_of);
        let properties = self.catalog.properties_of(entity, as_of);

        let mut anomalies = BTreeSet::new();
        let mut unresolved = BTreeSet::new();
        let mut sentences = BTreeSet::new();

        for view in graph.facts_for(entity, as_of) {
            if !matches!(
                view.predicate.class(),
                PredicateClass::Relationship | PredicateClass::Identity
            ) {
                continue;
            }
            let subject = self.endpoint_label(view.subject, as_of, &mut unresolved);
            let object = match &view.object {
                FactObject::Entity(other) => self.endpoint_label(*other, as_of, &mut unresolved),
                FactObject::Literal(lit) => {
                    note_anomaly(&mut anomalies, view.predicate.phrase(), lit);
                    lit.value.clone()
                }
            };
            sentences.insert(Sentence::new(subject, view.predicate, object));
        }

        note_anomaly(&mut anomalies, "label", &Literal::plain(label.clone()));
        for t in &types {
            note_anomaly(&mut anomalies, "type", &Literal::plain(t.clone()));
        }
        for lit in properties.literals() {
            note_anomaly(&mut anomalies, "property", lit);
        }

        let relationships: Vec<Sentence> = sentences.into_iter().collect();
        let digest = ContentHasher::SNAPSHOT.hash_json(&DigestInput {
            uri: &uri,
            label: &label,
            as_of: format_timestamp(as_of),
            types: &types,
            properties: &properties,
            relationships: relationships.iter().map(Sentence::text).collect(),
        })?;

        let unresolved: Vec<Uri> = unresolved.into_iter().collect();
        for missing in &unresolved {
            warn!(entity = %uri, reference = %missing, "unresolved reference; rendering raw URI");
        }
        let anomalies: Vec<EncodingAnomaly> = anomalies.into_iter().collect();
        for anomaly in &anomalies {
            warn!(
                entity = %uri,
                field = %anomaly.field,
                kind = %anomaly.kind,
                "encoding anomaly; passing literal through"
            );
        }

        debug!(
            entity = %uri,
            epoch = %graph.epoch(),
            relationships = relationships.len(),
            digest = %digest.short_hex(),
            "materialized snapshot"
        );

        Ok(Snapshot {
            entity,
            uri,
            label,
            as_of: *as_of,
            epoch: graph.epoch(),
            types,
            properties,
            relationships,
            unresolved,
            anomalies,
            digest,
        })
    }

    fn endpoint_label(
        &self,
        entity: EntityRef,
        as_of: &Timestamp,
        unresolved: &mut BTreeSet<Uri>,
    ) -> String {
        if let Some(label) = self.catalog.primary_label(entity, as_of) {
            return label.value;
        }
        match self.catalog.graph().uri_of(entity) {
            Some(uri) => {
                let raw = uri.to_string();
                if !self.catalog.class_has_entry(entity, as_of) {
                    unresolved.insert(uri);
                }
                raw
            }
            None => entity.to_string(),
        }
    }
}

impl<R: ?Sized> Clone for SnapshotEngine<R> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
        }
    }
}

fn note_anomaly(anomalies: &mut BTreeSet<EncodingAnomaly>, field: &str, lit: &Literal) {
    if let Some(kind) = lit.encoding_anomaly() {
        anomalies.insert(EncodingAnomaly {
            field: field.to_string(),
            value: lit.value.clone(),
            kind,
        });
    }
}
