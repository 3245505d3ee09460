use hg_registry::{IdentityResolver, RegistrySnapshot};
use hg_types::{EntityRef, Epoch, Timestamp, Uri, Validity};

use crate::fact::{Fact, FactId, FactView};
use crate::table::FactTable;
use crate::traits::FactReader;

/// Immutable graph state sealed for a generation run.
///
/// Carries the epoch it was sealed at. Every worker of a run reads through
/// the same `Arc<GraphView>`, so every snapshot of the run reflects one
/// graph state.
#[derive(Debug)]
pub struct GraphView {
    epoch: Epoch,
    identities: RegistrySnapshot,
    table: FactTable,
}

impl GraphView {
    pub(crate) fn new(epoch: Epoch, identities: RegistrySnapshot, table: FactTable) -> Self {
        Self {
            epoch,
            identities,
            table,
        }
    }

    /// The frozen identity classes.
    pub fn identities(&self) -> &RegistrySnapshot {
        &self.identities
    }

    pub fn uri(&self, entity: EntityRef) -> Option<&Uri> {
        self.identities.uri(entity)
    }

    pub fn retraction_count(&self) -> usize {
        self.table.retraction_count()
    }
}

impl FactReader for GraphView {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn facts_for(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<FactView> {
        self.table.neighborhood(entity, as_of)
    }

    fn aliases_at(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<EntityRef> {
        self.table.class_at(entity, as_of).into_iter().collect()
    }

    fn outgoing(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<FactView> {
        self.table.outgoing(entity, as_of)
    }

    fn fact(&self, id: &FactId) -> Option<Fact> {
        self.table.get(id).cloned()
    }

    fn effective_validity(&self, id: &FactId) -> Option<Validity> {
        self.table.get(id).map(|f| self.table.effective_validity(f))
    }

    fn fact_count(&self) -> usize {
        self.table.len()
    }
}

impl IdentityResolver for GraphView {
    fn uri_of(&self, entity: EntityRef) -> Option<Uri> {
        self.identities.uri_of(entity)
    }

    fn lookup(&self, uri: &Uri) -> Option<EntityRef> {
        self.identities.lookup(uri)
    }

    fn canonical(&self, entity: EntityRef) -> EntityRef {
        self.identities.canonical(entity)
    }

    fn aliases_of(&self, entity: EntityRef) -> Vec<EntityRef> {
        self.identities.aliases_of(entity)
    }

    fn entities(&self) -> Vec<EntityRef> {
        self.identities.entities()
    }
}
