//! The closed relationship vocabulary.
//!
//! Predicates reach hgraph as English phrases or CIDOC-CRM codes. They are
//! resolved once, at load time, into [`Predicate`] so core logic never
//! threads raw strings, and the inverse of every predicate is known
//! statically.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// How a predicate is consumed by the catalog and snapshot engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateClass {
    /// Entity-to-entity or entity-to-literal relationship, rendered as a sentence.
    Relationship,
    /// Reserved "is classified as type" predicate feeding the Types section.
    Type,
    /// Reserved literal property (label, comment, geometry, ...).
    Property,
    /// Co-reference between identifiers.
    Identity,
}

macro_rules! predicates {
    ($( $variant:ident => $phrase:literal, $code:expr, $class:ident; )*) => {
        /// Relationship predicate drawn from the ontology vocabulary.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Predicate {
            $( $variant, )*
        }

        impl Predicate {
            /// Every predicate, in declaration order.
            pub const ALL: &'static [Predicate] = &[ $( Predicate::$variant, )* ];

            /// The English phrase used in rendered sentences.
            pub const fn phrase(self) -> &'static str {
                match self {
                    $( Predicate::$variant => $phrase, )*
                }
            }

            /// CIDOC-CRM property code, when the predicate has one.
            pub const fn crm_code(self) -> Option<&'static str> {
                match self {
                    $( Predicate::$variant => $code, )*
                }
            }

            pub const fn class(self) -> PredicateClass {
                match self {
                    $( Predicate::$variant => PredicateClass::$class, )*
                }
            }
        }
    };
}

predicates! {
    IsIdentifiedBy => "is identified by", Some("P1"), Relationship;
    Identifies => "identifies", Some("P1i"), Relationship;
    IsClassifiedAsType => "is classified as type", Some("P2"), Type;
    IsTypeOf => "is type of", Some("P2i"), Relationship;
    HasTimeSpan => "has time-span", Some("P4"), Relationship;
    IsTimeSpanOf => "is time-span of", Some("P4i"), Relationship;
    TookPlaceAt => "took place at", Some("P7"), Relationship;
    Witnessed => "witnessed", Some("P7i"), Relationship;
    CarriedOutBy => "carried out by", Some("P14"), Relationship;
    Performed => "performed", Some("P14i"), Relationship;
    Modified => "modified", Some("P31"), Relationship;
    WasModifiedBy => "was modified by", Some("P31i"), Relationship;
    IsComposedOf => "is composed of", Some("P46"), Relationship;
    FormsPartOf => "forms part of", Some("P46i"), Relationship;
    HasCurrentLocation => "has current location", Some("P55"), Relationship;
    CurrentlyHolds => "currently holds", Some("P55i"), Relationship;
    BearsFeature => "bears feature", Some("P56"), Relationship;
    IsFoundOn => "is found on", Some("P56i"), Relationship;
    Depicts => "depicts", Some("P62"), Relationship;
    IsDepictedBy => "is depicted by", Some("P62i"), Relationship;
    RefersTo => "refers to", Some("P67"), Relationship;
    IsReferredToBy => "is referred to by", Some("P67i"), Relationship;
    FallsWithin => "falls within", Some("P89"), Relationship;
    Contains => "contains", Some("P89i"), Relationship;
    Produced => "produced", Some("P108"), Relationship;
    WasProducedBy => "was produced by", Some("P108i"), Relationship;
    Represents => "represents", Some("P138"), Relationship;
    HasRepresentation => "has representation", Some("P138i"), Relationship;
    CarriesVisualItem => "carries visual item", None, Relationship;
    IsVisualItemOf => "is visual item of", None, Relationship;
    HasAttribute => "has iconographical attribute", None, Relationship;
    IsAttributeOf => "is iconographical attribute of", None, Relationship;
    IsSameAs => "is same as", None, Identity;
    HasLabel => "has label", None, Property;
    HasAlternativeLabel => "has alternative label", None, Property;
    HasComment => "has comment", None, Property;
    HasGeometry => "has geometry", None, Property;
    HasProvenance => "has provenance", None, Property;
}

impl Predicate {
    /// The declared inverse, if any. `is same as` is its own inverse.
    pub const fn inverse(self) -> Option<Predicate> {
        use Predicate::*;
        Some(match self {
            IsIdentifiedBy => Identifies,
            Identifies => IsIdentifiedBy,
            IsClassifiedAsType => IsTypeOf,
            IsTypeOf => IsClassifiedAsType,
            HasTimeSpan => IsTimeSpanOf,
            IsTimeSpanOf => HasTimeSpan,
            TookPlaceAt => Witnessed,
            Witnessed => TookPlaceAt,
            CarriedOutBy => Performed,
            Performed => CarriedOutBy,
            Modified => WasModifiedBy,
            WasModifiedBy => Modified,
            IsComposedOf => FormsPartOf,
            FormsPartOf => IsComposedOf,
            HasCurrentLocation => CurrentlyHolds,
            CurrentlyHolds => HasCurrentLocation,
            BearsFeature => IsFoundOn,
            IsFoundOn => BearsFeature,
            Depicts => IsDepictedBy,
            IsDepictedBy => Depicts,
            RefersTo => IsReferredToBy,
            IsReferredToBy => RefersTo,
            FallsWithin => Contains,
            Contains => FallsWithin,
            Produced => WasProducedBy,
            WasProducedBy => Produced,
            Represents => HasRepresentation,
            HasRepresentation => Represents,
            CarriesVisualItem => IsVisualItemOf,
            IsVisualItemOf => CarriesVisualItem,
            HasAttribute => IsAttributeOf,
            IsAttributeOf => HasAttribute,
            IsSameAs => IsSameAs,
            HasLabel | HasAlternativeLabel | HasComment | HasGeometry | HasProvenance => {
                return None
            }
        })
    }

    /// Whether the predicate is its own inverse.
    pub fn is_symmetric(self) -> bool {
        self.inverse() == Some(self)
    }

    /// Whether this is the secondary member of an inverse pair.
    ///
    /// Storage always holds the primary direction; the secondary direction
    /// is derived at read time. The primary member is the one declared first.
    pub fn is_inverse_side(self) -> bool {
        match self.inverse() {
            Some(inv) => inv != self && inv < self,
            None => false,
        }
    }

    /// The primary member of this predicate's inverse pair.
    pub fn primary(self) -> Predicate {
        if self.is_inverse_side() {
            self.inverse().unwrap_or(self)
        } else {
            self
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

/// Load-time mapping from ontology strings to [`Predicate`].
///
/// Resolves, case-insensitively: the English phrase (`is composed of`), the
/// CRM code (`P46`, `P46i`), CRM local names (`P46_is_composed_of`), and any
/// aliases registered by configuration.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    terms: HashMap<String, Predicate>,
}

impl Vocabulary {
    /// The built-in vocabulary with every phrase and CRM code.
    pub fn builtin() -> Self {
        let mut terms = HashMap::new();
        for &p in Predicate::ALL {
            terms.insert(p.phrase().to_string(), p);
            if let Some(code) = p.crm_code() {
                terms.insert(code.to_ascii_lowercase(), p);
            }
        }
        Self { terms }
    }

    /// Register `alias` as another spelling of the predicate `target`
    /// resolves to.
    pub fn with_alias(mut self, alias: &str, target: &str) -> Result<Self, TypeError> {
        let predicate = self.resolve(target)?;
        self.terms.insert(normalize_term(alias), predicate);
        Ok(self)
    }

    /// Resolve an ontology string into a predicate.
    pub fn resolve(&self, term: &str) -> Result<Predicate, TypeError> {
        let key = normalize_term(term);
        if let Some(p) = self.terms.get(&key) {
            return Ok(*p);
        }
        // CRM local names carry the code before the first underscore.
        if let Some((code, _)) = key.split_once('_') {
            if let Some(p) = self.terms.get(code) {
                return Ok(*p);
            }
        }
        Err(TypeError::UnknownPredicate(term.to_string()))
    }

    /// Number of resolvable terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
