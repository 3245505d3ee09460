use hg_types::{EntityRef, Uri};

/// Read boundary for identity resolution.
///
/// Implementations must keep canonicalization transitive and symmetric:
/// every member of a class resolves to the same canonical handle, and
/// [`aliases_of`](IdentityResolver::aliases_of) returns the same members
/// whichever member is asked.
pub trait IdentityResolver: Send + Sync {
    /// The URI behind a handle, if the handle was issued here.
    fn uri_of(&self, entity: EntityRef) -> Option<Uri>;

    /// The handle of a URI, without registering it.
    fn lookup(&self, uri: &Uri) -> Option<EntityRef>;

    /// The canonical representative of the entity's identity class.
    fn canonical(&self, entity: EntityRef) -> EntityRef;

    /// Every member of the entity's identity class, sorted by URI.
    fn aliases_of(&self, entity: EntityRef) -> Vec<EntityRef>;

    /// All issued handles in registration order.
    fn entities(&self) -> Vec<EntityRef>;
}
