use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use hg_catalog::Properties;
use hg_types::{AnomalyKind, ContentId, EntityRef, Epoch, Predicate, Timestamp, Uri};

/// One relationship rendered from the snapshot entity's neighborhood.
///
/// Ordering and equality go by the rendered text alone, byte-wise, which
/// for UTF-8 is Unicode code-point order.
#[derive(Clone, Debug, Serialize)]
pub struct Sentence {
    pub subject: String,
    pub predicate: Predicate,
    pub object: String,
    text: String,
}

impl Sentence {
    pub fn new(subject: impl Into<String>, predicate: Predicate, object: impl Into<String>) -> Self {
        let subject = subject.into();
        let object = object.into();
        let text = format!("{subject} {} {object}", predicate.phrase());
        Self {
            subject,
            predicate,
            object,
            text,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Sentence {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Sentence {}

impl PartialOrd for Sentence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sentence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text.as_bytes().cmp(other.text.as_bytes())
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A literal that looks damaged. It is rendered unchanged.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EncodingAnomaly {
    /// Where the literal appears (`label`, `comment`, a predicate phrase, ...).
    pub field: String,
    pub value: String,
    pub kind: AnomalyKind,
}

/// Immutable materialization of one entity's neighborhood at `as_of`.
///
/// Snapshots are never mutated, only superseded by a later materialization.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub entity: EntityRef,
    pub uri: Uri,
    /// Primary label, or the URI when the entity has none.
    pub label: String,
    pub as_of: Timestamp,
    /// Epoch of the graph state the snapshot was taken from.
    pub epoch: Epoch,
    pub types: Vec<String>,
    pub properties: Properties,
    /// Sorted, deduplicated.
    pub relationships: Vec<Sentence>,
    /// Related entities with no catalog entry anywhere in their identity
    /// class, rendered by raw URI. Sorted.
    pub unresolved: Vec<Uri>,
    pub anomalies: Vec<EncodingAnomaly>,
    /// Digest of the rendered content; independent of the epoch.
    pub digest: ContentId,
}

impl Snapshot {
    /// Whether nothing at all is known about the entity at `as_of`.
    pub fn is_minimal(&self) -> bool {
        self.types.is_empty() && self.properties.is_empty() && self.relationships.is_empty()
    }
}
