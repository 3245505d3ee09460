use std::collections::HashMap;

use hg_types::{EntityRef, Uri};

use crate::traits::IdentityResolver;

/// Immutable, fully resolved view of an [`IdentityRegistry`](crate::IdentityRegistry).
///
/// Canonical handles and sorted alias lists are computed once at freeze time,
/// so lookups take no lock and are safe to share across generation workers.
#[derive(Clone, Debug, Default)]
pub struct RegistrySnapshot {
    uris: Vec<Uri>,
    index: HashMap<Uri, EntityRef>,
    canonical: Vec<EntityRef>,
    classes: HashMap<EntityRef, Vec<EntityRef>>,
}

impl RegistrySnapshot {
    pub(crate) fn new(
        uris: Vec<Uri>,
        index: HashMap<Uri, EntityRef>,
        canonical: Vec<EntityRef>,
        classes: HashMap<EntityRef, Vec<EntityRef>>,
    ) -> Self {
        Self {
            uris,
            index,
            canonical,
            classes,
        }
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    /// Canonical handles, one per identity class, sorted by URI.
    pub fn canonical_entities(&self) -> Vec<EntityRef> {
        let mut roots: Vec<EntityRef> = self.classes.keys().copied().collect();
        roots.sort_by(|a, b| self.uris[a.index()].cmp(&self.uris[b.index()]));
        roots
    }

    /// Borrowing form of [`IdentityResolver::aliases_of`].
    pub fn class_of(&self, entity: EntityRef) -> &[EntityRef] {
        self.canonical
            .get(entity.index())
            .and_then(|root| self.classes.get(root))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Borrowing form of [`IdentityResolver::uri_of`].
    pub fn uri(&self, entity: EntityRef) -> Option<&Uri> {
        self.uris.get(entity.index())
    }
}

impl IdentityResolver for RegistrySnapshot {
    fn uri_of(&self, entity: EntityRef) -> Option<Uri> {
        self.uri(entity).cloned()
    }

    fn lookup(&self, uri: &Uri) -> Option<EntityRef> {
        self.index.get(uri).copied()
    }

    fn canonical(&self, entity: EntityRef) -> EntityRef {
        self.canonical.get(entity.index()).copied().unwrap_or(entity)
    }

    fn aliases_of(&self, entity: EntityRef) -> Vec<EntityRef> {
        self.class_of(entity).to_vec()
    }

    fn entities(&self) -> Vec<EntityRef> {
        (0..self.uris.len() as u32).map(EntityRef::new).collect()
    }
}
