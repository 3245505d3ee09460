use std::collections::{BTreeSet, HashMap};

use hg_types::{EntityRef, Predicate, Timestamp, Validity};

use crate::fact::{Fact, FactId, FactObject, FactView};

/// Append-only fact storage shared by the live store and sealed views.
#[derive(Clone, Debug, Default)]
pub(crate) struct FactTable {
    facts: Vec<Fact>,
    by_id: HashMap<FactId, usize>,
    /// Slots of every fact an entity takes part in, as subject or object.
    by_entity: HashMap<EntityRef, Vec<usize>>,
    /// Earliest retraction per fact.
    retractions: HashMap<FactId, Timestamp>,
}

impl FactTable {
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn contains(&self, id: &FactId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &FactId) -> Option<&Fact> {
        self.by_id.get(id).map(|&slot| &self.facts[slot])
    }

    pub fn insert(&mut self, fact: Fact) {
        let slot = self.facts.len();
        self.by_id.insert(fact.id, slot);
        self.by_entity.entry(fact.subject).or_default().push(slot);
        if let Some(object) = fact.object.as_entity() {
            if object != fact.subject {
                self.by_entity.entry(object).or_default().push(slot);
            }
        }
        self.facts.push(fact);
    }

    /// Whether retracting at `at` would close the fact earlier than any
    /// retraction already recorded.
    pub fn would_retract(&self, id: &FactId, at: &Timestamp) -> bool {
        self.retractions.get(id).map_or(true, |existing| at < existing)
    }

    /// Record a retraction. Returns `false` when an equal or earlier
    /// retraction already exists.
    pub fn retract(&mut self, id: FactId, at: Timestamp) -> bool {
        if !self.would_retract(&id, &at) {
            return false;
        }
        self.retractions.insert(id, at);
        true
    }

    pub fn effective_validity(&self, fact: &Fact) -> Validity {
        match self.retractions.get(&fact.id) {
            Some(at) => fact.validity.closed_at(*at),
            None => fact.validity,
        }
    }

    pub fn retraction_count(&self) -> usize {
        self.retractions.len()
    }

    /// Stored facts whose subject is exactly `entity`, valid at `as_of`.
    ///
    /// Aliases are not consulted; this is what the entity says about
    /// itself.
    pub fn outgoing(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<FactView> {
        let Some(slots) = self.by_entity.get(&entity) else {
            return Vec::new();
        };
        slots
            .iter()
            .map(|&slot| &self.facts[slot])
            .filter(|fact| fact.subject == entity)
            .filter_map(|fact| {
                let validity = self.effective_validity(fact);
                validity.contains(as_of).then(|| FactView {
                    fact: fact.id,
                    subject: fact.subject,
                    predicate: fact.predicate,
                    object: fact.object.clone(),
                    validity,
                    derived: false,
                })
            })
            .collect()
    }

    /// Members of the entity's identity class at `as_of`.
    ///
    /// Only `is same as` facts valid at `as_of` join entities, so a merge
    /// has no effect before it starts or after it is retracted.
    pub fn class_at(&self, entity: EntityRef, as_of: &Timestamp) -> BTreeSet<EntityRef> {
        let mut class = BTreeSet::from([entity]);
        let mut pending = vec![entity];
        while let Some(member) = pending.pop() {
            let Some(slots) = self.by_entity.get(&member) else {
                continue;
            };
            for &slot in slots {
                let fact = &self.facts[slot];
                if fact.predicate != Predicate::IsSameAs
                    || !self.effective_validity(fact).contains(as_of)
                {
                    continue;
                }
                let Some(object) = fact.object.as_entity() else {
                    continue;
                };
                let other = if fact.subject == member { object } else { fact.subject };
                if class.insert(other) {
                    pending.push(other);
                }
            }
        }
        class
    }

    /// Every fact touching the entity's identity class that is valid at
    /// `as_of`, in insertion order.
    ///
    /// A stored fact whose object is in the class also yields its inverse
    /// direction, marked `derived`. A fact with both ends in the class yields
    /// both.
    pub fn neighborhood(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<FactView> {
        let class = self.class_at(entity, as_of);
        let mut slots = BTreeSet::new();
        for alias in &class {
            if let Some(found) = self.by_entity.get(alias) {
                slots.extend(found.iter().copied());
            }
        }
        let in_class = |e: EntityRef| class.contains(&e);

        let mut views = Vec::new();
        for slot in slots {
            let fact = &self.facts[slot];
            let validity = self.effective_validity(fact);
            if !validity.contains(as_of) {
                continue;
            }
            let subject_in = in_class(fact.subject);
            let object_in = fact.object.as_entity().is_some_and(in_class);

            if subject_in {
                views.push(FactView {
                    fact: fact.id,
                    subject: fact.subject,
                    predicate: fact.predicate,
                    object: fact.object.clone(),
                    validity,
                    derived: false,
                });
            }
            if object_in {
                match (fact.predicate.inverse(), fact.object.as_entity()) {
                    (Some(inverse), Some(object)) => views.push(FactView {
                        fact: fact.id,
                        subject: object,
                        predicate: inverse,
                        object: FactObject::Entity(fact.subject),
                        validity,
                        derived: true,
                    }),
                    _ if !subject_in => views.push(FactView {
                        fact: fact.id,
                        subject: fact.subject,
                        predicate: fact.predicate,
                        object: fact.object.clone(),
                        validity,
                        derived: false,
                    }),
                    _ => {}
                }
            }
        }
        views
    }
}
