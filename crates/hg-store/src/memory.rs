use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use hg_registry::{IdentityRegistry, IdentityResolver};
use hg_types::{format_timestamp, EntityRef, Epoch, Predicate, PredicateClass, Timestamp, Uri, Validity};

use crate::error::{StoreError, StoreResult};
use crate::fact::{Fact, FactId, FactObject, FactRecord, FactView, ObjectTerm};
use crate::log::{FactLog, LogRecord, Recovery};
use crate::table::FactTable;
use crate::traits::{FactReader, FactWriter};
use crate::view::GraphView;

/// Outcome of rebuilding a store from its fact log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    /// Records applied to the store.
    pub applied: usize,
    /// Records read intact but rejected on replay (identity conflicts,
    /// unknown facts).
    pub rejected: usize,
    /// Entries skipped by the log on CRC or decode failure.
    pub skipped: usize,
    pub truncated_tail: bool,
}

/// In-memory relationship store, optionally backed by a [`FactLog`].
///
/// The store is the single write path during ingestion: URIs, facts,
/// identity merges and retractions all go through it, and each accepted
/// write bumps the epoch. [`seal`](Self::seal) freezes the current state
/// into a [`GraphView`] and rejects writes until [`unseal`](Self::unseal).
pub struct InMemoryFactStore {
    registry: Arc<IdentityRegistry>,
    log: Option<FactLog>,
    inner: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    table: FactTable,
    epoch: Epoch,
    sealed: Option<Arc<GraphView>>,
}

impl StoreState {
    fn ensure_open(&self) -> StoreResult<()> {
        match &self.sealed {
            Some(view) => Err(StoreError::Sealed(view.epoch())),
            None => Ok(()),
        }
    }

    fn bump(&mut self) {
        self.epoch = self.epoch.next();
    }
}

impl InMemoryFactStore {
    /// Create an empty store without durability.
    pub fn new(registry: Arc<IdentityRegistry>) -> Self {
        Self {
            registry,
            log: None,
            inner: RwLock::new(StoreState::default()),
        }
    }

    /// Rebuild a store from `log` and keep appending to it.
    pub fn recover(registry: Arc<IdentityRegistry>, log: FactLog) -> StoreResult<(Self, ReplayReport)> {
        let Recovery {
            records,
            skipped,
            truncated_tail,
        } = log.recover()?;
        let store = Self::new(registry);
        let mut report = ReplayReport {
            skipped,
            truncated_tail,
            ..ReplayReport::default()
        };
        {
            let mut state = store.inner.write().expect("lock poisoned");
            for record in &records {
                match store.apply(&mut state, record, None) {
                    Ok(()) => report.applied += 1,
                    Err(e) => {
                        warn!(error = %e, "rejected fact log record on replay");
                        report.rejected += 1;
                    }
                }
            }
        }
        info!(
            applied = report.applied,
            rejected = report.rejected,
            skipped = report.skipped,
            "replayed fact log"
        );
        Ok((
            Self {
                log: Some(log),
                ..store
            },
            report,
        ))
    }

    pub fn registry(&self) -> &Arc<IdentityRegistry> {
        &self.registry
    }

    pub fn log(&self) -> Option<&FactLog> {
        self.log.as_ref()
    }

    /// Freeze the current state for generation.
    ///
    /// Idempotent while sealed: every caller gets the same view.
    pub fn seal(&self) -> Arc<GraphView> {
        let mut state = self.inner.write().expect("lock poisoned");
        if let Some(view) = &state.sealed {
            return Arc::clone(view);
        }
        let view = Arc::new(GraphView::new(
            state.epoch,
            self.registry.freeze(),
            state.table.clone(),
        ));
        state.sealed = Some(Arc::clone(&view));
        info!(epoch = %state.epoch, facts = state.table.len(), "sealed graph");
        view
    }

    /// Return to the ingestion phase. Views already handed out stay valid.
    pub fn unseal(&self) {
        let mut state = self.inner.write().expect("lock poisoned");
        if state.sealed.take().is_some() {
            debug!(epoch = %state.epoch, "unsealed graph");
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.read().expect("lock poisoned").sealed.is_some()
    }

    /// Apply one record under the write lock, logging it first when `log`
    /// is given. Records that change nothing are neither logged nor
    /// counted against the epoch.
    fn apply(
        &self,
        state: &mut StoreState,
        record: &LogRecord,
        log: Option<&FactLog>,
    ) -> StoreResult<()> {
        match record {
            LogRecord::Register { uri } => {
                if self.registry.lookup(uri).is_some() {
                    return Ok(());
                }
                if let Some(log) = log {
                    log.append(record)?;
                }
                let entity = self.registry.register(uri)?;
                state.bump();
                debug!(%uri, %entity, epoch = %state.epoch, "registered");
                Ok(())
            }
            LogRecord::Fact { .. } => {
                let Some(fact) = record.to_fact() else {
                    return Ok(());
                };
                self.insert_fact(state, fact, log).map(|_| ())
            }
            LogRecord::Retract { fact, at } => self.retract_fact(state, fact, *at, log),
        }
    }

    fn insert_fact(
        &self,
        state: &mut StoreState,
        record: FactRecord,
        log: Option<&FactLog>,
    ) -> StoreResult<FactId> {
        let record = record.oriented()?;
        let id = record.id();
        if state.table.contains(&id) {
            debug!(fact = %id.short_hex(), "fact already stored");
            return Ok(id);
        }

        let merge = match (&record.object, record.predicate.class()) {
            (ObjectTerm::Uri(object), PredicateClass::Identity) => {
                // A rejected merge leaves no trace.
                self.registry.check_same_as(&record.subject, object)?;
                Some(object)
            }
            _ => None,
        };

        // The registry changes only once the record is durable.
        if let Some(log) = log {
            log.append(&LogRecord::from(&record))?;
        }
        if let Some(object) = merge {
            self.registry.declare_same_as(&record.subject, object)?;
        }
        let subject = self.registry.register(&record.subject)?;
        let object = match &record.object {
            ObjectTerm::Uri(uri) => FactObject::Entity(self.registry.register(uri)?),
            ObjectTerm::Literal(lit) => FactObject::Literal(lit.clone()),
        };
        if record.predicate == Predicate::IsClassifiedAsType {
            let type_key = match &record.object {
                ObjectTerm::Uri(uri) => uri.as_str(),
                ObjectTerm::Literal(lit) => lit.value.as_str(),
            };
            self.registry.note_primary_type(subject, type_key)?;
        }

        state.table.insert(Fact {
            id,
            subject,
            predicate: record.predicate,
            object,
            validity: record.validity,
        });
        state.bump();
        debug!(
            fact = %id.short_hex(),
            subject = %record.subject,
            predicate = %record.predicate,
            epoch = %state.epoch,
            "fact added"
        );
        Ok(id)
    }

    fn retract_fact(
        &self,
        state: &mut StoreState,
        fact: &FactId,
        at: Timestamp,
        log: Option<&FactLog>,
    ) -> StoreResult<()> {
        if !state.table.contains(fact) {
            return Err(StoreError::UnknownFact(*fact));
        }
        if !state.table.would_retract(fact, &at) {
            debug!(fact = %fact.short_hex(), "retraction already covered");
            return Ok(());
        }
        if let Some(log) = log {
            log.append(&LogRecord::Retract { fact: *fact, at })?;
        }
        state.table.retract(*fact, at);
        state.bump();
        debug!(fact = %fact.short_hex(), at = %format_timestamp(&at), "fact retracted");
        Ok(())
    }
}

impl FactWriter for InMemoryFactStore {
    fn register(&self, uri: &Uri) -> StoreResult<EntityRef> {
        let mut state = self.inner.write().expect("lock poisoned");
        state.ensure_open()?;
        self.apply(&mut state, &LogRecord::Register { uri: uri.clone() }, self.log.as_ref())?;
        Ok(self.registry.register(uri)?)
    }

    fn add_fact(&self, record: FactRecord) -> StoreResult<FactId> {
        let mut state = self.inner.write().expect("lock poisoned");
        state.ensure_open()?;
        self.insert_fact(&mut state, record, self.log.as_ref())
    }

    fn retract(&self, fact: &FactId, at: Timestamp) -> StoreResult<()> {
        let mut state = self.inner.write().expect("lock poisoned");
        state.ensure_open()?;
        self.retract_fact(&mut state, fact, at, self.log.as_ref())
    }

    fn supersede(
        &self,
        old: &FactId,
        replacement: FactRecord,
        at: Timestamp,
    ) -> StoreResult<FactId> {
        let mut state = self.inner.write().expect("lock poisoned");
        state.ensure_open()?;
        if !state.table.contains(old) {
            return Err(StoreError::UnknownFact(*old));
        }
        let id = self.insert_fact(&mut state, replacement, self.log.as_ref())?;
        self.retract_fact(&mut state, old, at, self.log.as_ref())?;
        Ok(id)
    }

    fn declare_same_as(&self, a: &Uri, b: &Uri) -> StoreResult<EntityRef> {
        let record = FactRecord::new(
            a.clone(),
            Predicate::IsSameAs,
            ObjectTerm::Uri(b.clone()),
            Validity::always(),
        );
        self.add_fact(record)?;
        Ok(self.registry.canonical_of(a)?)
    }
}

impl FactReader for InMemoryFactStore {
    fn epoch(&self) -> Epoch {
        self.inner.read().expect("lock poisoned").epoch
    }

    fn facts_for(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<FactView> {
        self.inner.read().expect("lock poisoned").table.neighborhood(entity, as_of)
    }

    fn aliases_at(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<EntityRef> {
        let state = self.inner.read().expect("lock poisoned");
        state.table.class_at(entity, as_of).into_iter().collect()
    }

    fn outgoing(&self, entity: EntityRef, as_of: &Timestamp) -> Vec<FactView> {
        self.inner.read().expect("lock poisoned").table.outgoing(entity, as_of)
    }

    fn fact(&self, id: &FactId) -> Option<Fact> {
        self.inner.read().expect("lock poisoned").table.get(id).cloned()
    }

    fn effective_validity(&self, id: &FactId) -> Option<Validity> {
        let state = self.inner.read().expect("lock poisoned");
        state.table.get(id).map(|f| state.table.effective_validity(f))
    }

    fn fact_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").table.len()
    }
}

impl IdentityResolver for InMemoryFactStore {
    fn uri_of(&self, entity: EntityRef) -> Option<Uri> {
        self.registry.uri_of(entity)
    }

    fn lookup(&self, uri: &Uri) -> Option<EntityRef> {
        self.registry.lookup(uri)
    }

    fn canonical(&self, entity: EntityRef) -> EntityRef {
        self.registry.canonical(entity)
    }

    fn aliases_of(&self, entity: EntityRef) -> Vec<EntityRef> {
        self.registry.aliases_of(entity)
    }

    fn entities(&self) -> Vec<EntityRef> {
        self.registry.entities()
    }
}

impl std::fmt::Debug for InMemoryFactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryFactStore")
            .field("fact_count", &self.fact_count())
            .field("epoch", &self.epoch())
            .field("sealed", &self.is_sealed())
            .field("durable", &self.log.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hg_registry::MergePolicy;
    use hg_types::{parse_timestamp, Literal};

    fn uri(s: &str) -> Uri {
        Uri::parse(s).unwrap()
    }

    fn ts(raw: &str) -> Timestamp {
        parse_timestamp(raw).unwrap()
    }

    fn store() -> InMemoryFactStore {
        InMemoryFactStore::new(Arc::new(IdentityRegistry::default()))
    }

    fn link(s: &str, p: Predicate, o: &str) -> FactRecord {
        FactRecord::new(uri(s), p, ObjectTerm::Uri(uri(o)), Validity::starting(ts("2020-01-01")))
    }

    fn label(s: &str, value: &str) -> FactRecord {
        FactRecord::new(
            uri(s),
            Predicate::HasLabel,
            ObjectTerm::Literal(Literal::plain(value)),
            Validity::always(),
        )
    }

    const CHURCH: &str = "https://ex.org/church";
    const BEMA: &str = "https://ex.org/bema";
    const NARTHEX: &str = "https://ex.org/narthex";

    // ---------------------------------------------------------------
    // Append and idempotence
    // ---------------------------------------------------------------

    #[test]
    fn add_fact_registers_endpoints() {
        let s = store();
        s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        assert!(s.registry().lookup(&uri(CHURCH)).is_some());
        assert!(s.registry().lookup(&uri(BEMA)).is_some());
        assert_eq!(s.fact_count(), 1);
    }

    #[test]
    fn readding_is_a_noop() {
        let s = store();
        let a = s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        let epoch = s.epoch();
        let b = s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        assert_eq!(a, b);
        assert_eq!(s.fact_count(), 1);
        assert_eq!(s.epoch(), epoch);
    }

    #[test]
    fn inverse_direction_is_the_same_fact() {
        let s = store();
        let a = s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        let b = s.add_fact(link(BEMA, Predicate::FormsPartOf, CHURCH)).unwrap();
        assert_eq!(a, b);
        assert_eq!(s.fact_count(), 1);
    }

    #[test]
    fn epoch_bumps_on_each_accepted_write() {
        let s = store();
        assert_eq!(s.epoch(), Epoch::zero());
        s.register(&uri(CHURCH)).unwrap();
        s.register(&uri(CHURCH)).unwrap();
        assert_eq!(s.epoch(), Epoch(1));
        s.add_fact(label(CHURCH, "Panagia Phorbiottisa")).unwrap();
        assert_eq!(s.epoch(), Epoch(2));
    }

    // ---------------------------------------------------------------
    // Neighborhood reads
    // ---------------------------------------------------------------

    #[test]
    fn object_side_sees_derived_inverse() {
        let s = store();
        s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        let bema = s.registry().lookup(&uri(BEMA)).unwrap();
        let church = s.registry().lookup(&uri(CHURCH)).unwrap();

        let views = s.facts_for(bema, &ts("2024-01-01"));
        assert_eq!(views.len(), 1);
        assert!(views[0].derived);
        assert_eq!(views[0].subject, bema);
        assert_eq!(views[0].predicate, Predicate::FormsPartOf);
        assert_eq!(views[0].object, FactObject::Entity(church));
    }

    #[test]
    fn subject_side_sees_stored_direction() {
        let s = store();
        s.add_fact(link(BEMA, Predicate::FormsPartOf, CHURCH)).unwrap();
        let church = s.registry().lookup(&uri(CHURCH)).unwrap();
        let views = s.facts_for(church, &ts("2024-01-01"));
        assert_eq!(views.len(), 1);
        assert!(!views[0].derived);
        assert_eq!(views[0].predicate, Predicate::IsComposedOf);
    }

    #[test]
    fn facts_outside_validity_are_hidden() {
        let s = store();
        s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        let church = s.registry().lookup(&uri(CHURCH)).unwrap();
        assert!(s.facts_for(church, &ts("2019-12-31")).is_empty());
        assert_eq!(s.facts_for(church, &ts("2020-01-01")).len(), 1);
    }

    #[test]
    fn aliases_share_a_neighborhood() {
        let s = store();
        let wd = "http://www.wikidata.org/entity/Q1340385";
        s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        s.declare_same_as(&uri(wd), &uri(CHURCH)).unwrap();
        let alias = s.registry().lookup(&uri(wd)).unwrap();

        let views = s.facts_for(alias, &ts("2024-01-01"));
        let predicates: Vec<Predicate> = views.iter().map(|v| v.predicate).collect();
        assert!(predicates.contains(&Predicate::IsComposedOf));
        // Both directions of the identity fact are visible.
        assert_eq!(
            predicates.iter().filter(|p| **p == Predicate::IsSameAs).count(),
            2
        );
    }

    #[test]
    fn unknown_entity_has_empty_neighborhood() {
        let s = store();
        assert!(s.facts_for(EntityRef::new(42), &ts("2024-01-01")).is_empty());
    }

    // ---------------------------------------------------------------
    // Corrections
    // ---------------------------------------------------------------

    #[test]
    fn retraction_closes_validity() {
        let s = store();
        let id = s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        s.retract(&id, ts("2023-01-01")).unwrap();
        let church = s.registry().lookup(&uri(CHURCH)).unwrap();
        assert_eq!(s.facts_for(church, &ts("2022-06-01")).len(), 1);
        assert!(s.facts_for(church, &ts("2023-06-01")).is_empty());
        // The stored fact itself is untouched.
        assert!(s.fact(&id).unwrap().validity.is_open());
        assert_eq!(s.effective_validity(&id).unwrap().to, Some(ts("2023-01-01")));
    }

    #[test]
    fn later_retraction_does_not_reopen() {
        let s = store();
        let id = s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        s.retract(&id, ts("2023-01-01")).unwrap();
        let epoch = s.epoch();
        s.retract(&id, ts("2024-01-01")).unwrap();
        assert_eq!(s.epoch(), epoch);
        assert_eq!(s.effective_validity(&id).unwrap().to, Some(ts("2023-01-01")));
    }

    #[test]
    fn retracting_unknown_fact_fails() {
        let s = store();
        let bogus = link(CHURCH, Predicate::IsComposedOf, BEMA).id();
        assert!(matches!(
            s.retract(&bogus, ts("2024-01-01")),
            Err(StoreError::UnknownFact(_))
        ));
    }

    #[test]
    fn supersede_swaps_facts_at_the_cut() {
        let s = store();
        let old = s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        let new = s
            .supersede(&old, link(CHURCH, Predicate::IsComposedOf, NARTHEX), ts("2022-01-01"))
            .unwrap();
        assert_ne!(old, new);
        let church = s.registry().lookup(&uri(CHURCH)).unwrap();
        let narthex = s.registry().lookup(&uri(NARTHEX)).unwrap();
        let bema = s.registry().lookup(&uri(BEMA)).unwrap();

        let before: Vec<_> = s.facts_for(church, &ts("2021-01-01")).into_iter().map(|v| v.object).collect();
        assert!(before.contains(&FactObject::Entity(bema)));
        let after: Vec<_> = s.facts_for(church, &ts("2023-01-01")).into_iter().map(|v| v.object).collect();
        assert_eq!(after, vec![FactObject::Entity(narthex)]);
        assert_eq!(s.fact_count(), 2);
    }

    // ---------------------------------------------------------------
    // Identity
    // ---------------------------------------------------------------

    #[test]
    fn contradictory_same_as_is_rejected_and_not_stored() {
        let s = InMemoryFactStore::new(Arc::new(IdentityRegistry::new(MergePolicy::Strict)));
        let class = |subject: &str, ty: &str| {
            FactRecord::new(
                uri(subject),
                Predicate::IsClassifiedAsType,
                ObjectTerm::Literal(Literal::plain(ty)),
                Validity::always(),
            )
        };
        s.add_fact(class(CHURCH, "Church")).unwrap();
        s.add_fact(class(BEMA, "Production")).unwrap();
        let count = s.fact_count();
        let err = s.declare_same_as(&uri(CHURCH), &uri(BEMA)).unwrap_err();
        assert!(matches!(err, StoreError::Registry(_)));
        assert_eq!(s.fact_count(), count);
    }

    #[test]
    fn identity_class_follows_same_as_validity() {
        let s = store();
        let wd = "http://www.wikidata.org/entity/Q1340385";
        s.add_fact(link(CHURCH, Predicate::Depicts, BEMA)).unwrap();
        let id = s
            .add_fact(FactRecord::new(
                uri(wd),
                Predicate::IsSameAs,
                ObjectTerm::Uri(uri(CHURCH)),
                Validity::starting(ts("2023-01-01")),
            ))
            .unwrap();
        let alias = s.registry().lookup(&uri(wd)).unwrap();
        let church = s.registry().lookup(&uri(CHURCH)).unwrap();

        assert_eq!(s.aliases_at(alias, &ts("2022-01-01")), vec![alias]);
        assert!(s.facts_for(alias, &ts("2022-01-01")).is_empty());
        let mut joined = s.aliases_at(alias, &ts("2024-01-01"));
        joined.sort();
        let mut expected = vec![alias, church];
        expected.sort();
        assert_eq!(joined, expected);
        assert!(s
            .facts_for(alias, &ts("2024-01-01"))
            .iter()
            .any(|v| v.predicate == Predicate::Depicts));

        s.retract(&id, ts("2025-01-01")).unwrap();
        assert_eq!(s.aliases_at(church, &ts("2025-06-01")), vec![church]);
        assert!(s
            .facts_for(alias, &ts("2025-06-01"))
            .iter()
            .all(|v| v.predicate != Predicate::Depicts));
    }

    // ---------------------------------------------------------------
    // Phase separation
    // ---------------------------------------------------------------

    #[test]
    fn sealed_store_rejects_writes() {
        let s = store();
        s.add_fact(label(CHURCH, "Asinou")).unwrap();
        let view = s.seal();
        assert!(s.is_sealed());
        assert!(matches!(
            s.add_fact(label(BEMA, "Bema")),
            Err(StoreError::Sealed(e)) if e == view.epoch()
        ));
        assert!(matches!(s.register(&uri(BEMA)), Err(StoreError::Sealed(_))));
        s.unseal();
        s.add_fact(label(BEMA, "Bema")).unwrap();
    }

    #[test]
    fn sealing_twice_returns_the_same_view() {
        let s = store();
        let a = s.seal();
        let b = s.seal();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn view_is_isolated_from_later_writes() {
        let s = store();
        s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
        let view = s.seal();
        s.unseal();
        s.add_fact(link(CHURCH, Predicate::IsComposedOf, NARTHEX)).unwrap();

        let church = view.lookup(&uri(CHURCH)).unwrap();
        assert_eq!(view.facts_for(church, &ts("2024-01-01")).len(), 1);
        assert_eq!(s.facts_for(church, &ts("2024-01-01")).len(), 2);
        assert!(view.epoch() < s.epoch());
        assert!(view.lookup(&uri(NARTHEX)).is_none());
    }

    // ---------------------------------------------------------------
    // Durability
    // ---------------------------------------------------------------

    #[test]
    fn recover_rebuilds_identical_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.log");
        let (first_ids, first_epoch) = {
            let log = FactLog::open(&path, false).unwrap();
            let (s, report) =
                InMemoryFactStore::recover(Arc::new(IdentityRegistry::default()), log).unwrap();
            assert_eq!(report, ReplayReport::default());
            let a = s.add_fact(link(CHURCH, Predicate::IsComposedOf, BEMA)).unwrap();
            let b = s.add_fact(label(CHURCH, "Asinou")).unwrap();
            s.declare_same_as(&uri("http://www.wikidata.org/entity/Q1340385"), &uri(CHURCH))
                .unwrap();
            s.retract(&a, ts("2023-01-01")).unwrap();
            (vec![a, b], s.epoch())
        };

        let log = FactLog::open(&path, false).unwrap();
        let (s, report) =
            InMemoryFactStore::recover(Arc::new(IdentityRegistry::default()), log).unwrap();
        assert_eq!(report.rejected, 0);
        assert_eq!(report.applied, 4);
        assert_eq!(s.fact_count(), 3);
        assert_eq!(s.epoch(), first_epoch);
        for id in &first_ids {
            assert!(s.fact(id).is_some());
        }
        assert_eq!(s.effective_validity(&first_ids[0]).unwrap().to, Some(ts("2023-01-01")));
        let wd = s.registry().lookup(&uri("http://www.wikidata.org/entity/Q1340385")).unwrap();
        let church = s.registry().lookup(&uri(CHURCH)).unwrap();
        assert_eq!(s.registry().canonical(wd), s.registry().canonical(church));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_log_append_leaves_no_trace() {
        let log = FactLog::open(std::path::Path::new("/dev/full"), false).unwrap();
        let (s, _) = InMemoryFactStore::recover(Arc::new(IdentityRegistry::default()), log).unwrap();
        let wd = uri("http://www.wikidata.org/entity/Q1340385");

        assert!(matches!(s.declare_same_as(&wd, &uri(CHURCH)), Err(StoreError::Io(_))));
        assert!(matches!(s.register(&uri(BEMA)), Err(StoreError::Io(_))));
        let typed = FactRecord::new(
            uri(CHURCH),
            Predicate::IsClassifiedAsType,
            ObjectTerm::Literal(Literal::plain("Church")),
            Validity::always(),
        );
        assert!(matches!(s.add_fact(typed), Err(StoreError::Io(_))));

        assert!(s.registry().is_empty());
        assert_eq!(s.fact_count(), 0);
        assert_eq!(s.epoch(), Epoch::zero());
    }

    #[test]
    fn noop_writes_are_not_logged() {
        let dir = tempfile::tempdir().unwrap();
        let log = FactLog::open(&dir.path().join("facts.log"), false).unwrap();
        let (s, _) = InMemoryFactStore::recover(Arc::new(IdentityRegistry::default()), log).unwrap();
        s.add_fact(label(CHURCH, "Asinou")).unwrap();
        let offset = s.log().unwrap().offset();
        s.add_fact(label(CHURCH, "Asinou")).unwrap();
        s.register(&uri(CHURCH)).unwrap();
        assert_eq!(s.log().unwrap().offset(), offset);
    }
}
