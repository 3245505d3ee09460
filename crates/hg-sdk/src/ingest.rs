//! JSON Lines ingestion.
//!
//! One record per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"entity","uri":"..","types":[".."],"label":"..","alt_labels":[{"value":"..","lang":"en"}]}
//! {"kind":"fact","subject":"..","predicate":"P46","object":{"uri":".."}}
//! {"kind":"same_as","a":"..","b":".."}
//! {"kind":"retract","subject":"..","predicate":"..","object":{"literal":".."},"at":"2024-01-01"}
//! ```
//!
//! A bad record is reported with its line number and skipped; it never
//! aborts the rest of the input.

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hg_catalog::EntityMetadata;
use hg_store::{FactRecord, FactWriter, ObjectTerm};
use hg_types::{parse_timestamp, Literal, Timestamp, Uri, Validity, Vocabulary};

use crate::error::{SdkError, SdkResult};

/// One line of ingestion input.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestRecord {
    Entity(EntityInput),
    Fact(FactInput),
    SameAs { a: String, b: String },
    Retract(RetractInput),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EntityInput {
    pub uri: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub labels: Vec<Literal>,
    #[serde(default)]
    pub alt_labels: Vec<Literal>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub geometry: Option<String>,
    #[serde(default)]
    pub provenance: Option<String>,
    #[serde(default)]
    pub valid_from: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FactInput {
    pub subject: String,
    pub predicate: String,
    pub object: ObjectInput,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_to: Option<String>,
}

/// Retraction of a previously ingested fact, identified by its content.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RetractInput {
    pub subject: String,
    pub predicate: String,
    pub object: ObjectInput,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_to: Option<String>,
    pub at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ObjectInput {
    Uri {
        uri: String,
    },
    Literal {
        literal: String,
        #[serde(default)]
        lang: Option<String>,
    },
}

/// What a single record did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Entity,
    Fact,
    SameAs,
    Retraction,
}

/// A record that was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngestFailure {
    /// 1-based line number.
    pub line: usize,
    pub error: String,
}

/// Outcome of ingesting one input stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub lines: usize,
    pub entities: usize,
    pub facts: usize,
    pub same_as: usize,
    pub retractions: usize,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn accepted(&self) -> usize {
        self.entities + self.facts + self.same_as + self.retractions
    }

    fn count(&mut self, applied: Applied) {
        match applied {
            Applied::Entity => self.entities += 1,
            Applied::Fact => self.facts += 1,
            Applied::SameAs => self.same_as += 1,
            Applied::Retraction => self.retractions += 1,
        }
    }
}

/// Turns ingestion records into store writes.
#[derive(Clone, Debug, Default)]
pub struct Ingestor {
    vocabulary: Vocabulary,
}

impl Ingestor {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Ingest every line of `reader`. Blank lines and lines starting with
    /// `#` are ignored.
    pub fn ingest_reader<W, R>(&self, writer: &W, reader: R) -> SdkResult<IngestReport>
    where
        W: FactWriter + ?Sized,
        R: BufRead,
    {
        let mut report = IngestReport::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| SdkError::Internal(format!("read error: {e}")))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            report.lines += 1;
            match self.ingest_line(writer, trimmed) {
                Ok(applied) => report.count(applied),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "rejected ingestion record");
                    report.failures.push(IngestFailure {
                        line: index + 1,
                        error: e.to_string(),
                    });
                }
            }
        }
        info!(
            records = report.lines,
            accepted = report.accepted(),
            failed = report.failures.len(),
            "ingestion finished"
        );
        Ok(report)
    }

    /// Parse and apply one JSON record.
    pub fn ingest_line<W: FactWriter + ?Sized>(&self, writer: &W, line: &str) -> SdkResult<Applied> {
        let record: IngestRecord = serde_json::from_str(line)?;
        self.apply(writer, record)
    }

    pub fn apply<W: FactWriter + ?Sized>(&self, writer: &W, record: IngestRecord) -> SdkResult<Applied> {
        match record {
            IngestRecord::Entity(input) => {
                let metadata = entity_metadata(input)?;
                hg_catalog::record(writer, &metadata)?;
                Ok(Applied::Entity)
            }
            IngestRecord::Fact(input) => {
                let fact = self.fact_record(
                    &input.subject,
                    &input.predicate,
                    input.object,
                    input.valid_from.as_deref(),
                    input.valid_to.as_deref(),
                )?;
                let id = writer.add_fact(fact)?;
                debug!(fact = %id.short_hex(), "ingested fact");
                Ok(Applied::Fact)
            }
            IngestRecord::SameAs { a, b } => {
                writer.declare_same_as(&Uri::parse(&a)?, &Uri::parse(&b)?)?;
                Ok(Applied::SameAs)
            }
            IngestRecord::Retract(input) => {
                let fact = self.fact_record(
                    &input.subject,
                    &input.predicate,
                    input.object,
                    input.valid_from.as_deref(),
                    input.valid_to.as_deref(),
                )?;
                let id = fact.oriented()?.id();
                writer.retract(&id, parse_timestamp(&input.at)?)?;
                Ok(Applied::Retraction)
            }
        }
    }

    fn fact_record(
        &self,
        subject: &str,
        predicate: &str,
        object: ObjectInput,
        valid_from: Option<&str>,
        valid_to: Option<&str>,
    ) -> SdkResult<FactRecord> {
        let predicate = self.vocabulary.resolve(predicate)?;
        let object = match object {
            ObjectInput::Uri { uri } => ObjectTerm::Uri(Uri::parse(&uri)?),
            ObjectInput::Literal { literal, lang } => ObjectTerm::Literal(Literal {
                value: literal,
                lang,
            }),
        };
        let validity = Validity::new(optional_timestamp(valid_from)?, optional_timestamp(valid_to)?)?;
        Ok(FactRecord::new(Uri::parse(subject)?, predicate, object, validity))
    }
}

fn entity_metadata(input: EntityInput) -> SdkResult<EntityMetadata> {
    Ok(EntityMetadata {
        uri: Uri::parse(&input.uri)?,
        types: input.types,
        label: input.label,
        labels: input.labels,
        alt_labels: input.alt_labels,
        comment: input.comment,
        geometry: input.geometry,
        provenance: input.provenance,
        valid_from: optional_timestamp(input.valid_from.as_deref())?,
    })
}

fn optional_timestamp(raw: Option<&str>) -> SdkResult<Option<Timestamp>> {
    Ok(raw.map(parse_timestamp).transpose()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use hg_registry::{IdentityRegistry, IdentityResolver};
    use hg_store::{FactReader, InMemoryFactStore};

    fn store() -> InMemoryFactStore {
        InMemoryFactStore::new(Arc::new(IdentityRegistry::default()))
    }

    fn ingest(store: &InMemoryFactStore, text: &str) -> IngestReport {
        Ingestor::default()
            .ingest_reader(store, Cursor::new(text.to_string()))
            .unwrap()
    }

    const CHURCH_JSONL: &str = r#"
{"kind":"entity","uri":"https://ex.org/church","types":["Church"],"label":"Panagia Phorbiottisa","alt_labels":[{"value":"Asinou","lang":"en"}],"valid_from":"1105-01-01"}
{"kind":"entity","uri":"https://ex.org/narthex","label":"Narthex"}
{"kind":"fact","subject":"https://ex.org/church","predicate":"P46","object":{"uri":"https://ex.org/narthex"}}
{"kind":"fact","subject":"https://ex.org/church","predicate":"has note","object":{"literal":"restored 1960s"}}
{"kind":"same_as","a":"http://www.wikidata.org/entity/Q1340385","b":"https://ex.org/church"}
"#;

    // -----------------------------------------------------------------------
    // Record kinds
    // -----------------------------------------------------------------------

    #[test]
    fn ingests_every_record_kind() {
        let store = store();
        let report = ingest(&store, CHURCH_JSONL);
        assert_eq!(report.lines, 5);
        assert_eq!(report.entities, 2);
        assert_eq!(report.facts, 1);
        assert_eq!(report.same_as, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].line, 5);
        assert!(report.failures[0].error.contains("unknown predicate"));
    }

    #[test]
    fn same_as_merges_classes() {
        let store = store();
        ingest(&store, CHURCH_JSONL);
        let wd = store
            .lookup(&Uri::parse("http://www.wikidata.org/entity/Q1340385").unwrap())
            .unwrap();
        assert_eq!(store.aliases_of(wd).len(), 2);
    }

    #[test]
    fn retract_closes_the_matching_fact() {
        let store = store();
        ingest(
            &store,
            r#"{"kind":"fact","subject":"https://ex.org/a","predicate":"is composed of","object":{"uri":"https://ex.org/b"}}
{"kind":"retract","subject":"https://ex.org/b","predicate":"forms part of","object":{"uri":"https://ex.org/a"},"at":"2020-01-01"}"#,
        );
        let a = store.lookup(&Uri::parse("https://ex.org/a").unwrap()).unwrap();
        assert_eq!(store.facts_for(a, &parse_timestamp("2019-06-01").unwrap()).len(), 1);
        assert!(store.facts_for(a, &parse_timestamp("2020-06-01").unwrap()).is_empty());
    }

    #[test]
    fn retract_of_unknown_fact_is_reported() {
        let store = store();
        let report = ingest(
            &store,
            r#"{"kind":"retract","subject":"https://ex.org/a","predicate":"depicts","object":{"uri":"https://ex.org/b"},"at":"2020-01-01"}"#,
        );
        assert_eq!(report.retractions, 0);
        assert_eq!(report.failures.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Failure isolation
    // -----------------------------------------------------------------------

    #[test]
    fn bad_lines_do_not_abort_the_batch() {
        let store = store();
        let report = ingest(
            &store,
            r#"not json
{"kind":"entity","uri":"no scheme"}
{"kind":"fact","subject":"https://ex.org/a","predicate":"has label","object":{"uri":"https://ex.org/b"}}
{"kind":"fact","subject":"https://ex.org/a","predicate":"depicts","object":{"uri":"https://ex.org/b"},"valid_from":"2020-01-01","valid_to":"2019-01-01"}
{"kind":"entity","uri":"https://ex.org/ok","label":"Ok"}
"#,
        );
        assert_eq!(report.lines, 5);
        assert_eq!(report.entities, 1);
        let lines: Vec<usize> = report.failures.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let store = store();
        let report = ingest(&store, "# header\n\n   \n");
        assert_eq!(report, IngestReport::default());
    }

    #[test]
    fn reingestion_is_idempotent() {
        let store = store();
        ingest(&store, CHURCH_JSONL);
        let before = (store.fact_count(), store.epoch());
        let report = ingest(&store, CHURCH_JSONL);
        assert_eq!(report.failures.len(), 1);
        assert_eq!((store.fact_count(), store.epoch()), before);
    }

    #[test]
    fn configured_alias_resolves() {
        let store = store();
        let vocabulary = Vocabulary::builtin()
            .with_alias("has note", "has comment")
            .unwrap();
        let ingestor = Ingestor::new(vocabulary);
        let applied = ingestor
            .ingest_line(
                &store,
                r#"{"kind":"fact","subject":"https://ex.org/a","predicate":"has note","object":{"literal":"restored","lang":"en"}}"#,
            )
            .unwrap();
        assert_eq!(applied, Applied::Fact);
        assert_eq!(store.fact_count(), 1);
    }
}
