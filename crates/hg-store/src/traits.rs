use hg_registry::IdentityResolver;
use hg_types::{EntityRef, Epoch, Timestamp, Uri, Validity};

use crate::error::StoreResult;
use crate::fact::{Fact, FactId, FactRecord, FactView};

/// Read boundary of the relationship store.
///
/// Implementations must satisfy:
/// - `facts_for` covers every alias of the entity at `as_of`, as subject
///   or object. An alias is joined by `is same as` facts valid at `as_of`.
/// - Every stored fact with an inverse is also visible from its object's
///   side, under the inverse predicate, marked `derived`.
/// - Results come in insertion order, so equal graph state gives equal
///   output.
pub trait FactReader: Send + Sync {
    /// Epoch of the state being read.
    fn epoch(&self) -> Epoch;

    /// The neighborhood of `entity` valid at `as_of`.
    fn facts_for(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<FactView>;

    /// The entity and every alias joined to it by identity facts valid at
    /// `as_of`, in handle order.
    fn aliases_at(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<EntityRef>;

    /// Stored facts whose subject is exactly `entity`, without aliases or
    /// derived inverses.
    fn outgoing(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<FactView>;

    /// A stored fact by id, in its stored direction.
    fn fact(&self, id: &FactId) -> Option<Fact>;

    /// The fact's validity after retractions.
    fn effective_validity(&self, id: &FactId) -> Option<Validity>;

    /// Number of stored facts. Derived inverses are not counted.
    fn fact_count(&self) -> usize;
}

/// Write boundary of the relationship store.
///
/// Writes are append-only and idempotent: re-adding a fact, in either
/// direction, returns the existing id without changing state.
pub trait FactWriter: Send + Sync {
    /// Register a URI without stating anything about it.
    fn register(&self, uri: &Uri) -> StoreResult<EntityRef>;

    /// Append a fact. Identity facts also merge the two identity classes.
    fn add_fact(&self, record: FactRecord) -> StoreResult<FactId>;

    /// Close a fact's validity at `at`.
    fn retract(&self, fact: &FactId, at: Timestamp) -> StoreResult<()>;

    /// Append `replacement` and close `old` at `at`, as one write.
    fn supersede(&self, old: &FactId, replacement: FactRecord, at: Timestamp)
        -> StoreResult<FactId>;

    /// Declare two URIs co-referent.
    fn declare_same_as(&self, a: &Uri, b: &Uri) -> StoreResult<EntityRef>;
}

/// Everything the catalog and snapshot engine read: facts plus identity.
pub trait GraphReader: FactReader + IdentityResolver {}

impl<T: FactReader + IdentityResolver + ?Sized> GraphReader for T {}
