use std::fmt::Write;

use tracing::debug;

use hg_catalog::Properties;
use hg_snapshot::Snapshot;
use hg_types::{format_timestamp, Literal};

use crate::document::{escape_separator, Document};
use crate::error::RenderResult;

/// Renders snapshots as markdown documents.
///
/// Stateless; one renderer can serve every worker of a run.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentRenderer;

impl DocumentRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render one snapshot.
    ///
    /// The output depends on nothing but the snapshot, so rendering the same
    /// snapshot twice is byte-identical.
    pub fn render(&self, snapshot: &Snapshot) -> RenderResult<Document> {
        let mut out = String::new();
        let generated = format_timestamp(&snapshot.as_of);

        writeln!(out, "---")?;
        writeln!(out, "URI: {}", snapshot.uri)?;
        writeln!(out, "Label: {}", snapshot.label)?;
        writeln!(out, "Generated: {generated}")?;
        writeln!(out, "---")?;
        writeln!(out)?;
        writeln!(out, "# {}", snapshot.label)?;
        writeln!(out)?;
        writeln!(out, "URI: {}", snapshot.uri)?;

        if !snapshot.types.is_empty() {
            writeln!(out)?;
            writeln!(out, "## Types")?;
            for t in &snapshot.types {
                writeln!(out, "- {t}")?;
            }
        }

        if !snapshot.properties.is_empty() {
            writeln!(out)?;
            writeln!(out, "## Properties")?;
            write_properties(&mut out, &snapshot.properties)?;
        }

        if !snapshot.relationships.is_empty() {
            writeln!(out)?;
            writeln!(out, "## Relationships")?;
            for sentence in &snapshot.relationships {
                writeln!(out, "- {sentence}")?;
            }
        }

        let body = escape_body(&out);
        debug!(
            uri = %snapshot.uri,
            bytes = body.len(),
            digest = %snapshot.digest.short_hex(),
            "rendered document"
        );
        Ok(Document {
            uri: snapshot.uri.clone(),
            label: snapshot.label.clone(),
            as_of: snapshot.as_of,
            digest: snapshot.digest,
            body,
        })
    }
}

fn write_properties(out: &mut String, props: &Properties) -> std::fmt::Result {
    write_values(out, "Label", &props.labels)?;
    if !props.alt_labels.is_empty() {
        writeln!(out, "- **Alternative labels**:")?;
        for lit in &props.alt_labels {
            writeln!(out, "  - {}", tagged(lit))?;
        }
    }
    write_values(out, "Comment", &props.comments)?;
    write_values(out, "Geometry", &props.geometry)?;
    write_values(out, "Provenance", &props.provenance)
}

/// One value renders inline; several become a sub-list with their
/// language tags.
fn write_values(out: &mut String, key: &str, values: &[Literal]) -> std::fmt::Result {
    match values {
        [] => Ok(()),
        [single] => writeln!(out, "- **{key}**: {}", single.value),
        many => {
            writeln!(out, "- **{key}**:")?;
            for lit in many {
                writeln!(out, "  - {}", tagged(lit))?;
            }
            Ok(())
        }
    }
}

fn tagged(lit: &Literal) -> String {
    match &lit.lang {
        Some(lang) => format!("{} ({lang})", lit.value),
        None => lit.value.clone(),
    }
}

fn escape_body(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (content, newline) = match line.strip_suffix('\n') {
            Some(content) => (content, "\n"),
            None => (line, ""),
        };
        out.push_str(&escape_separator(content));
        out.push_str(newline);
    }
    out
}
