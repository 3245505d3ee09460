use std::sync::Arc;

use tracing::debug;

use hg_registry::IdentityResolver;
use hg_store::{FactId, FactObject, FactReader, FactView, FactWriter, GraphReader};
use hg_types::{EntityRef, Literal, Predicate, PredicateClass, Timestamp};

use crate::error::CatalogResult;
use crate::metadata::{EntityMetadata, Properties};

/// Write an entity's metadata into the store as catalog facts.
///
/// Registers the URI even when the record carries nothing else. Returns the
/// ids of the catalog facts, existing or new.
pub fn record<W: FactWriter + ?Sized>(
    writer: &W,
    metadata: &EntityMetadata,
) -> CatalogResult<Vec<FactId>> {
    writer.register(&metadata.uri)?;
    let mut ids = Vec::new();
    for fact in metadata.to_facts() {
        ids.push(writer.add_fact(fact)?);
    }
    debug!(uri = %metadata.uri, facts = ids.len(), "recorded catalog entry");
    Ok(ids)
}

/// Read side of the catalog over a graph.
pub struct EntityCatalog<R: ?Sized> {
    graph: Arc<R>,
}

impl<R: GraphReader + ?Sized> EntityCatalog<R> {
    pub fn new(graph: Arc<R>) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &Arc<R> {
        &self.graph
    }

    /// Distinct type labels of the entity's identity class, in insertion
    /// order. Entity-valued types contribute their label.
    pub fn types_of(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for view in self.graph.facts_for(entity, as_of) {
            if view.derived || view.predicate != Predicate::IsClassifiedAsType {
                continue;
            }
            let label = match &view.object {
                FactObject::Literal(lit) => lit.value.clone(),
                FactObject::Entity(type_entity) => self.label_or_uri(*type_entity, as_of),
            };
            if !types.contains(&label) {
                types.push(label);
            }
        }
        types
    }

    /// Literal properties of the entity's identity class.
    pub fn properties_of(&self, entity: EntityRef, as_of: &Timestamp) -> Properties {
        let mut props = Properties::default();
        for view in self.graph.facts_for(entity, as_of) {
            if view.derived || view.predicate.class() != PredicateClass::Property {
                continue;
            }
            let FactObject::Literal(lit) = view.object else {
                continue;
            };
            match view.predicate {
                Predicate::HasLabel => push_distinct(&mut props.labels, lit),
                Predicate::HasAlternativeLabel => push_distinct(&mut props.alt_labels, lit),
                Predicate::HasComment => push_distinct(&mut props.comments, lit),
                Predicate::HasGeometry => push_distinct(&mut props.geometry, lit),
                Predicate::HasProvenance => push_distinct(&mut props.provenance, lit),
                _ => {}
            }
        }
        props
    }

    /// Whether the entity itself, not an alias, has any type or property
    /// valid at `as_of`.
    pub fn has_entry(&self, entity: EntityRef, as_of: &Timestamp) -> bool {
        self.graph
            .outgoing(entity, as_of)
            .iter()
            .any(is_catalog_fact)
    }

    /// Whether any member of the entity's identity class at `as_of` has an
    /// entry.
    pub fn class_has_entry(&self, entity: EntityRef, as_of: &Timestamp) -> bool {
        self.graph
            .aliases_at(entity, as_of)
            .into_iter()
            .any(|alias| self.has_entry(alias, as_of))
    }

    /// The entity's own first label, preferring labels without a language
    /// tag.
    pub fn primary_label(&self, entity: EntityRef, as_of: &Timestamp) -> Option<Literal> {
        let labels: Vec<Literal> = self
            .graph
            .outgoing(entity, as_of)
            .into_iter()
            .filter(|view| view.predicate == Predicate::HasLabel)
            .filter_map(|view| match view.object {
                FactObject::Literal(lit) => Some(lit),
                FactObject::Entity(_) => None,
            })
            .collect();
        labels
            .iter()
            .find(|lit| lit.lang.is_none())
            .or_else(|| labels.first())
            .cloned()
    }

    /// The entity's own primary label, falling back to its raw URI.
    ///
    /// Aliases never lend their labels: each URI keeps its own rendering
    /// identity.
    pub fn label_or_uri(&self, entity: EntityRef, as_of: &Timestamp) -> String {
        self.primary_label(entity, as_of)
            .map(|lit| lit.value)
            .or_else(|| self.graph.uri_of(entity).map(|uri| uri.to_string()))
            .unwrap_or_else(|| entity.to_string())
    }
}

impl<R: ?Sized> Clone for EntityCatalog<R> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
        }
    }
}

fn is_catalog_fact(view: &FactView) -> bool {
    matches!(
        view.predicate.class(),
        PredicateClass::Type | PredicateClass::Property
    )
}

fn push_distinct(values: &mut Vec<Literal>, lit: Literal) {
    if !values.contains(&lit) {
        values.push(lit);
    }
}
