use serde::{Deserialize, Serialize};

use hg_crypto::ContentHasher;
use hg_types::{
    format_timestamp, ContentId, EntityRef, Literal, Predicate, PredicateClass, Uri, Validity,
};

use crate::error::{StoreError, StoreResult};

/// Content-derived identity of a stored fact.
pub type FactId = ContentId;

/// Object of a fact as supplied by ingestion: another entity or a literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectTerm {
    Uri(Uri),
    Literal(Literal),
}

impl ObjectTerm {
    pub fn as_uri(&self) -> Option<&Uri> {
        match self {
            Self::Uri(uri) => Some(uri),
            Self::Literal(_) => None,
        }
    }
}

/// A fact in URI space, before registration.
///
/// This is the form the store accepts, logs and hashes. Its id does not
/// depend on arena handles, so the same fact ingested by two processes gets
/// the same id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactRecord {
    pub subject: Uri,
    pub predicate: Predicate,
    pub object: ObjectTerm,
    pub validity: Validity,
}

impl FactRecord {
    pub fn new(subject: Uri, predicate: Predicate, object: ObjectTerm, validity: Validity) -> Self {
        Self {
            subject,
            predicate,
            object,
            validity,
        }
    }

    /// Check the object kind against the predicate and bring the fact into
    /// its stored direction.
    ///
    /// Inverse-side predicates are flipped onto the primary member of their
    /// pair. Symmetric facts put the smaller URI in subject position. After
    /// orientation, `(a P b)` and `(b P⁻¹ a)` are the same record.
    pub fn oriented(self) -> StoreResult<Self> {
        match (self.predicate.class(), &self.object) {
            (PredicateClass::Property, ObjectTerm::Uri(_)) => {
                return Err(StoreError::InvalidObject {
                    predicate: self.predicate,
                    reason: "property predicates take a literal",
                })
            }
            (PredicateClass::Identity, ObjectTerm::Literal(_)) => {
                return Err(StoreError::InvalidObject {
                    predicate: self.predicate,
                    reason: "identity predicates take an entity",
                })
            }
            _ => {}
        }

        if self.predicate.is_inverse_side() {
            let ObjectTerm::Uri(object) = self.object else {
                return Err(StoreError::InvalidObject {
                    predicate: self.predicate,
                    reason: "an inverse predicate cannot take a literal",
                });
            };
            return Ok(Self {
                subject: object,
                predicate: self.predicate.primary(),
                object: ObjectTerm::Uri(self.subject),
                validity: self.validity,
            });
        }

        if self.predicate.is_symmetric() {
            if let ObjectTerm::Uri(object) = &self.object {
                if *object < self.subject {
                    return Ok(Self {
                        subject: object.clone(),
                        predicate: self.predicate,
                        object: ObjectTerm::Uri(self.subject),
                        validity: self.validity,
                    });
                }
            }
        }
        Ok(self)
    }

    /// Domain-separated content id over every field.
    ///
    /// Call on an oriented record; both directions of a relationship then
    /// share one id.
    pub fn id(&self) -> FactId {
        let from = self.validity.from.as_ref().map(format_timestamp).unwrap_or_default();
        let to = self.validity.to.as_ref().map(format_timestamp).unwrap_or_default();
        let (kind, value, lang): (&[u8], &str, &str) = match &self.object {
            ObjectTerm::Uri(uri) => (b"uri".as_slice(), uri.as_str(), ""),
            ObjectTerm::Literal(lit) => (
                b"literal".as_slice(),
                lit.value.as_str(),
                lit.lang.as_deref().unwrap_or(""),
            ),
        };
        ContentHasher::FACT.hash_parts(&[
            self.subject.as_str().as_bytes(),
            self.predicate.phrase().as_bytes(),
            kind,
            value.as_bytes(),
            lang.as_bytes(),
            from.as_bytes(),
            to.as_bytes(),
        ])
    }
}

/// Object of a stored fact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FactObject {
    Entity(EntityRef),
    Literal(Literal),
}

impl FactObject {
    pub fn as_entity(&self) -> Option<EntityRef> {
        match self {
            Self::Entity(e) => Some(*e),
            Self::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Entity(_) => None,
            Self::Literal(lit) => Some(lit),
        }
    }
}

/// A fact as held in storage. Never mutated after insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fact {
    pub id: FactId,
    pub subject: EntityRef,
    pub predicate: Predicate,
    pub object: FactObject,
    /// Validity as ingested. Retractions are applied at read time.
    pub validity: Validity,
}

/// A fact as seen from one entity's neighborhood.
///
/// `derived` views are inverse directions computed at read time from a
/// stored fact; they share the stored fact's id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactView {
    pub fact: FactId,
    pub subject: EntityRef,
    pub predicate: Predicate,
    pub object: FactObject,
    /// Effective validity after retractions.
    pub validity: Validity,
    pub derived: bool,
}
