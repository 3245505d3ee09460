use std::collections::BTreeMap;
use std::path::PathBuf;

use hg_render::{Document, DOCUMENT_SEPARATOR};

use crate::slug::file_name_for;

/// Group documents by output path.
///
/// Each path maps to every document whose label folds to that path's key,
/// ordered by URI. A URI seen twice keeps its last document.
pub fn assign_paths<I>(documents: I) -> BTreeMap<PathBuf, Vec<Document>>
where
    I: IntoIterator<Item = Document>,
{
    let mut groups: BTreeMap<PathBuf, Vec<Document>> = BTreeMap::new();
    for doc in documents {
        let group = groups.entry(PathBuf::from(file_name_for(&doc.label))).or_default();
        match group.iter_mut().find(|existing| existing.uri == doc.uri) {
            Some(existing) => *existing = doc,
            None => group.push(doc),
        }
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.uri.cmp(&b.uri));
    }
    groups
}

/// The file text of one group: bodies in order, separated by a blank line,
/// the separator line and another blank line.
pub fn join_documents(documents: &[Document]) -> String {
    let mut out = String::new();
    for (i, doc) in documents.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(DOCUMENT_SEPARATOR);
            out.push_str("\n\n");
        }
        out.push_str(&doc.body);
    }
    out
}

/// Split a grouped file back into document bodies.
///
/// Only lines exactly equal to the separator split; escaped separators in
/// literal text stay inside their block.
pub fn split_documents(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == DOCUMENT_SEPARATOR {
            blocks.push(finish_block(&current));
            current.clear();
        } else {
            current.push_str(line);
        }
    }
    blocks.push(finish_block(&current));
    blocks.retain(|block| !block.is_empty());
    blocks
}

fn finish_block(raw: &str) -> String {
    let trimmed = raw.trim_matches('\n');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hg_types::{parse_timestamp, ContentId, Uri};

    fn doc(uri: &str, label: &str) -> Document {
        let body = format!(
            "---\nURI: {uri}\nLabel: {label}\nGenerated: 2024-05-01T00:00:00Z\n---\n\n# {label}\n\nURI: {uri}\n"
        );
        Document {
            uri: Uri::parse(uri).unwrap(),
            label: label.to_string(),
            as_of: parse_timestamp("2024-05-01").unwrap(),
            digest: ContentId::from_hash([0; 32]),
            body,
        }
    }

    #[test]
    fn colliding_labels_share_one_path_in_uri_order() {
        let groups = assign_paths(vec![
            doc("https://ex.org/b/narthex", "Narthex"),
            doc("https://ex.org/a/narthex", "Narthex"),
            doc("https://ex.org/bema", "Bema"),
        ]);
        assert_eq!(groups.len(), 2);
        let narthex = &groups[&PathBuf::from(file_name_for("Narthex"))];
        let uris: Vec<&str> = narthex.iter().map(|d| d.uri.as_str()).collect();
        assert_eq!(uris, vec!["https://ex.org/a/narthex", "https://ex.org/b/narthex"]);
    }

    #[test]
    fn diacritic_variants_collide() {
        let groups = assign_paths(vec![
            doc("https://ex.org/1", "Panagia"),
            doc("https://ex.org/2", "Panagía"),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.values().next().unwrap().len(), 2);
    }

    #[test]
    fn same_uri_is_not_duplicated() {
        let groups = assign_paths(vec![
            doc("https://ex.org/narthex", "Narthex"),
            doc("https://ex.org/narthex", "Narthex"),
        ]);
        assert_eq!(groups.values().next().unwrap().len(), 1);
    }

    #[test]
    fn joined_file_splits_back_into_blocks() {
        let docs = vec![
            doc("https://ex.org/a/narthex", "Narthex"),
            doc("https://ex.org/b/narthex", "Narthex"),
        ];
        let text = join_documents(&docs);
        assert_eq!(text.matches(DOCUMENT_SEPARATOR).count(), 1);
        let blocks = split_documents(&text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], docs[0].body);
        assert_eq!(blocks[1], docs[1].body);
        assert!(blocks[0].contains("URI: https://ex.org/a/narthex"));
        assert!(blocks[1].contains("URI: https://ex.org/b/narthex"));
    }

    #[test]
    fn single_document_has_no_separator() {
        let d = doc("https://ex.org/bema", "Bema");
        let text = join_documents(std::slice::from_ref(&d));
        assert_eq!(text, d.body);
        assert_eq!(split_documents(&text), vec![d.body]);
    }

    #[test]
    fn escaped_separator_does_not_split() {
        let text = format!("---\nLabel: x\n---\n\n\\{DOCUMENT_SEPARATOR}\nmore\n");
        assert_eq!(split_documents(&text).len(), 1);
    }

    #[test]
    fn empty_text_has_no_blocks() {
        assert!(split_documents("").is_empty());
    }
}
