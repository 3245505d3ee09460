use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use hg_types::{EntityRef, Uri};

use crate::error::{RegistryError, RegistryResult};
use crate::snapshot::RegistrySnapshot;
use crate::traits::IdentityResolver;

/// What `declare_same_as` does when the two classes carry different
/// primary types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Reject the merge with [`RegistryError::IdentityConflict`].
    #[default]
    Strict,
    /// Accept the merge; the merged class keeps the type of the class whose
    /// representative URI sorts first.
    Permissive,
}

/// Mutable identifier registry used during ingestion.
///
/// URIs live in an arena indexed by [`EntityRef`]. Co-reference is a
/// union-find over arena slots with union by rank and path compression, so
/// resolution is lazy but every lookup leaves the path shorter for the next.
pub struct IdentityRegistry {
    policy: MergePolicy,
    inner: RwLock<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    uris: Vec<Uri>,
    index: HashMap<Uri, EntityRef>,
    parent: Vec<u32>,
    rank: Vec<u8>,
    /// Meaningful at roots only.
    members: Vec<Vec<EntityRef>>,
    /// Meaningful at roots only: the member with the smallest URI.
    representative: Vec<EntityRef>,
    /// Meaningful at roots only.
    primary_type: Vec<Option<String>>,
}

impl RegistryState {
    fn find(&mut self, slot: u32) -> u32 {
        let mut root = slot;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut cursor = slot;
        while self.parent[cursor as usize] != root {
            let next = self.parent[cursor as usize];
            self.parent[cursor as usize] = root;
            cursor = next;
        }
        root
    }

    fn find_readonly(&self, slot: u32) -> u32 {
        let mut root = slot;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        root
    }

    fn register(&mut self, uri: &Uri) -> RegistryResult<EntityRef> {
        if let Some(existing) = self.index.get(uri) {
            return Ok(*existing);
        }
        let slot = u32::try_from(self.uris.len()).map_err(|_| RegistryError::CapacityExhausted)?;
        let entity = EntityRef::new(slot);
        self.uris.push(uri.clone());
        self.index.insert(uri.clone(), entity);
        self.parent.push(slot);
        self.rank.push(0);
        self.members.push(vec![entity]);
        self.representative.push(entity);
        self.primary_type.push(None);
        debug!(%uri, %entity, "registered entity");
        Ok(entity)
    }

    fn check(&self, entity: EntityRef) -> RegistryResult<u32> {
        if entity.index() < self.uris.len() {
            Ok(entity.index() as u32)
        } else {
            Err(RegistryError::UnknownEntity(entity))
        }
    }
}

impl IdentityRegistry {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            inner: RwLock::new(RegistryState::default()),
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Register a URI, returning its handle. Idempotent.
    pub fn register(&self, uri: &Uri) -> RegistryResult<EntityRef> {
        let mut state = self.inner.write().expect("lock poisoned");
        state.register(uri)
    }

    /// Parse and register a raw URI string.
    pub fn register_str(&self, raw: &str) -> RegistryResult<EntityRef> {
        let uri = Uri::parse(raw)?;
        self.register(&uri)
    }

    /// The canonical handle of a registered URI.
    pub fn canonical_of(&self, uri: &Uri) -> RegistryResult<EntityRef> {
        let mut state = self.inner.write().expect("lock poisoned");
        let entity = *state
            .index
            .get(uri)
            .ok_or_else(|| RegistryError::NotRegistered(uri.clone()))?;
        let root = state.find(entity.index() as u32);
        Ok(state.representative[root as usize])
    }

    /// Declare two URIs co-referent, registering either if needed.
    ///
    /// Returns the canonical handle of the merged class. Fails with
    /// [`RegistryError::IdentityConflict`] under [`MergePolicy::Strict`] when
    /// both classes already carry different primary types; no merge happens
    /// in that case.
    pub fn declare_same_as(&self, a: &Uri, b: &Uri) -> RegistryResult<EntityRef> {
        let mut state = self.inner.write().expect("lock poisoned");
        let ea = state.register(a)?;
        let eb = state.register(b)?;
        let ra = state.find(ea.index() as u32);
        let rb = state.find(eb.index() as u32);
        if ra == rb {
            return Ok(state.representative[ra as usize]);
        }

        let merged_type = self.merged_type(&state, a, b, ra, rb)?;

        // Union by rank.
        let (root, child) = match state.rank[ra as usize].cmp(&state.rank[rb as usize]) {
            std::cmp::Ordering::Less => (rb, ra),
            std::cmp::Ordering::Greater => (ra, rb),
            std::cmp::Ordering::Equal => {
                state.rank[ra as usize] += 1;
                (ra, rb)
            }
        };
        state.parent[child as usize] = root;

        let moved = std::mem::take(&mut state.members[child as usize]);
        state.members[root as usize].extend(moved);
        let rep_root = state.representative[root as usize];
        let rep_child = state.representative[child as usize];
        if state.uris[rep_child.index()] < state.uris[rep_root.index()] {
            state.representative[root as usize] = rep_child;
        }
        state.primary_type[root as usize] = merged_type;
        state.primary_type[child as usize] = None;

        let canonical = state.representative[root as usize];
        debug!(left = %a, right = %b, %canonical, "merged identity classes");
        Ok(canonical)
    }

    /// Whether [`declare_same_as`](Self::declare_same_as) would accept the
    /// pair. Changes nothing.
    pub fn check_same_as(&self, a: &Uri, b: &Uri) -> RegistryResult<()> {
        let state = self.inner.read().expect("lock poisoned");
        let root_of = |uri: &Uri| {
            state
                .index
                .get(uri)
                .map(|entity| state.find_readonly(entity.index() as u32))
        };
        match (root_of(a), root_of(b)) {
            (Some(ra), Some(rb)) if ra != rb => self.merged_type(&state, a, b, ra, rb).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Primary type of the class formed by merging roots `ra` and `rb`.
    fn merged_type(
        &self,
        state: &RegistryState,
        a: &Uri,
        b: &Uri,
        ra: u32,
        rb: u32,
    ) -> RegistryResult<Option<String>> {
        let ta = state.primary_type[ra as usize].clone();
        let tb = state.primary_type[rb as usize].clone();
        match (ta, tb) {
            (Some(ta), Some(tb)) if ta != tb => match self.policy {
                MergePolicy::Strict => {
                    warn!(left = %a, right = %b, %ta, %tb, "rejected contradictory same-as");
                    Err(RegistryError::IdentityConflict {
                        left: a.clone(),
                        left_type: ta,
                        right: b.clone(),
                        right_type: tb,
                    })
                }
                MergePolicy::Permissive => {
                    let rep_a = state.representative[ra as usize];
                    let rep_b = state.representative[rb as usize];
                    if state.uris[rep_a.index()] <= state.uris[rep_b.index()] {
                        Ok(Some(ta))
                    } else {
                        Ok(Some(tb))
                    }
                }
            },
            (ta, tb) => Ok(ta.or(tb)),
        }
    }

    /// Record the first type seen for an entity's class.
    ///
    /// Later types never replace the primary type; they only show up in the
    /// catalog.
    pub fn note_primary_type(&self, entity: EntityRef, type_label: &str) -> RegistryResult<()> {
        let mut state = self.inner.write().expect("lock poisoned");
        let slot = state.check(entity)?;
        let root = state.find(slot);
        if state.primary_type[root as usize].is_none() {
            state.primary_type[root as usize] = Some(type_label.to_string());
        }
        Ok(())
    }

    /// The primary type of the entity's class.
    pub fn primary_type(&self, entity: EntityRef) -> RegistryResult<Option<String>> {
        let state = self.inner.read().expect("lock poisoned");
        let slot = state.check(entity)?;
        let root = state.find_readonly(slot);
        Ok(state.primary_type[root as usize].clone())
    }

    /// Number of registered URIs.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of identity classes.
    pub fn class_count(&self) -> usize {
        let state = self.inner.read().expect("lock poisoned");
        (0..state.parent.len())
            .filter(|&slot| state.parent[slot] as usize == slot)
            .count()
    }

    /// Freeze the registry into an immutable snapshot for a generation run.
    pub fn freeze(&self) -> RegistrySnapshot {
        let state = self.inner.read().expect("lock poisoned");
        let canonical = (0..state.uris.len() as u32)
            .map(|slot| state.representative[state.find_readonly(slot) as usize])
            .collect();
        let mut classes: HashMap<EntityRef, Vec<EntityRef>> = HashMap::new();
        for slot in 0..state.uris.len() {
            if state.parent[slot] as usize == slot {
                let mut members = state.members[slot].clone();
                members.sort_by(|x, y| state.uris[x.index()].cmp(&state.uris[y.index()]));
                classes.insert(state.representative[slot], members);
            }
        }
        RegistrySnapshot::new(state.uris.clone(), state.index.clone(), canonical, classes)
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new(MergePolicy::default())
    }
}

impl IdentityResolver for IdentityRegistry {
    fn uri_of(&self, entity: EntityRef) -> Option<Uri> {
        let state = self.inner.read().expect("lock poisoned");
        state.uris.get(entity.index()).cloned()
    }

    fn lookup(&self, uri: &Uri) -> Option<EntityRef> {
        let state = self.inner.read().expect("lock poisoned");
        state.index.get(uri).copied()
    }

    fn canonical(&self, entity: EntityRef) -> EntityRef {
        let mut state = self.inner.write().expect("lock poisoned");
        match state.check(entity) {
            Ok(slot) => {
                let root = state.find(slot);
                state.representative[root as usize]
            }
            Err(_) => entity,
        }
    }

    fn aliases_of(&self, entity: EntityRef) -> Vec<EntityRef> {
        let mut state = self.inner.write().expect("lock poisoned");
        let Ok(slot) = state.check(entity) else {
            return Vec::new();
        };
        let root = state.find(slot);
        let mut members = state.members[root as usize].clone();
        members.sort_by(|x, y| state.uris[x.index()].cmp(&state.uris[y.index()]));
        members
    }

    fn entities(&self) -> Vec<EntityRef> {
        let state = self.inner.read().expect("lock poisoned");
        (0..state.uris.len() as u32).map(EntityRef::new).collect()
    }
}

impl std::fmt::Debug for IdentityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityRegistry")
            .field("policy", &self.policy)
            .field("entity_count", &self.len())
            .finish()
    }
}
