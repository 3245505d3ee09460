use serde::{Deserialize, Serialize};

use hg_store::{FactRecord, ObjectTerm};
use hg_types::{Literal, Predicate, Timestamp, Uri, Validity};

/// Descriptive metadata of one entity as delivered by ingestion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub uri: Uri,
    #[serde(default)]
    pub types: Vec<String>,
    /// The preferred label, without a language tag.
    #[serde(default)]
    pub label: Option<String>,
    /// Further labels, usually one per language.
    #[serde(default)]
    pub labels: Vec<Literal>,
    #[serde(default)]
    pub alt_labels: Vec<Literal>,
    #[serde(default)]
    pub comment: Option<String>,
    /// WKT text, kept verbatim.
    #[serde(default)]
    pub geometry: Option<String>,
    #[serde(default)]
    pub provenance: Option<String>,
    #[serde(default)]
    pub valid_from: Option<Timestamp>,
}

impl EntityMetadata {
    pub fn new(uri: Uri) -> Self {
        Self {
            uri,
            types: Vec::new(),
            label: None,
            labels: Vec::new(),
            alt_labels: Vec::new(),
            comment: None,
            geometry: None,
            provenance: None,
            valid_from: None,
        }
    }

    pub fn with_type(mut self, type_label: impl Into<String>) -> Self {
        self.types.push(type_label.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_tagged_label(mut self, value: impl Into<String>, lang: impl Into<String>) -> Self {
        self.labels.push(Literal::tagged(value, lang));
        self
    }

    pub fn with_alt_label(mut self, label: Literal) -> Self {
        self.alt_labels.push(label);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_geometry(mut self, wkt: impl Into<String>) -> Self {
        self.geometry = Some(wkt.into());
        self
    }

    pub fn with_provenance(mut self, source: impl Into<String>) -> Self {
        self.provenance = Some(source.into());
        self
    }

    /// The catalog facts this record stands for, in a stable order:
    /// types, labels, alternative labels, comment, geometry, provenance.
    pub fn to_facts(&self) -> Vec<FactRecord> {
        let uri = &self.uri;
        let validity = self.valid_from.map(Validity::starting).unwrap_or_default();
        let fact = |predicate: Predicate, literal: Literal| {
            FactRecord::new(uri.clone(), predicate, ObjectTerm::Literal(literal), validity)
        };

        let mut facts = Vec::new();
        for t in &self.types {
            facts.push(fact(Predicate::IsClassifiedAsType, Literal::plain(t.clone())));
        }
        if let Some(label) = &self.label {
            facts.push(fact(Predicate::HasLabel, Literal::plain(label.clone())));
        }
        for label in &self.labels {
            facts.push(fact(Predicate::HasLabel, label.clone()));
        }
        for alt in &self.alt_labels {
            facts.push(fact(Predicate::HasAlternativeLabel, alt.clone()));
        }
        if let Some(comment) = &self.comment {
            facts.push(fact(Predicate::HasComment, Literal::plain(comment.clone())));
        }
        if let Some(wkt) = &self.geometry {
            facts.push(fact(Predicate::HasGeometry, Literal::plain(wkt.clone())));
        }
        if let Some(source) = &self.provenance {
            facts.push(fact(Predicate::HasProvenance, Literal::plain(source.clone())));
        }
        facts
    }
}

/// Literal properties of an entity at one point in time.
///
/// Multi-valued keys keep every distinct value in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Properties {
    pub labels: Vec<Literal>,
    pub alt_labels: Vec<Literal>,
    pub comments: Vec<Literal>,
    pub geometry: Vec<Literal>,
    pub provenance: Vec<Literal>,
}

impl Properties {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
            && self.alt_labels.is_empty()
            && self.comments.is_empty()
            && self.geometry.is_empty()
            && self.provenance.is_empty()
    }

    /// Every literal held, for anomaly scanning.
    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.labels
            .iter()
            .chain(self.alt_labels.iter())
            .chain(self.comments.iter())
            .chain(self.geometry.iter())
            .chain(self.provenance.iter())
    }
}
