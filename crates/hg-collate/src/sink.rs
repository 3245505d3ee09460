use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, info, warn};

use hg_render::Document;
use hg_types::Uri;

use crate::error::{CollateError, CollateResult};
use crate::group::{assign_paths, join_documents};

/// Labels that folded to one key, grouped into one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub path: PathBuf,
    pub uris: Vec<Uri>,
}

/// A file that could not be written. Its documents stay in the sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub uris: Vec<Uri>,
    pub error: String,
}

/// Outcome of [`OutputSink::flush`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub files: usize,
    pub documents: usize,
    pub collisions: Vec<Collision>,
    pub failures: Vec<FileFailure>,
}

/// Collects documents from concurrent workers and writes them once.
///
/// The mutex is the only point of contention in a run. Nothing reaches the
/// file system before [`flush`](Self::flush), and every file is written to
/// a temporary sibling and renamed into place, so readers never see a
/// partial file.
#[derive(Debug, Default)]
pub struct OutputSink {
    documents: Mutex<BTreeMap<Uri, Document>>,
}

impl OutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one document. A second document for the same URI replaces the
    /// first.
    pub fn push(&self, document: Document) {
        let mut docs = self.documents.lock().expect("output sink mutex poisoned");
        docs.insert(document.uri.clone(), document);
    }

    pub fn len(&self) -> usize {
        self.documents.lock().expect("output sink mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every collected document, in URI order.
    pub fn drain(&self) -> Vec<Document> {
        let mut docs = self.documents.lock().expect("output sink mutex poisoned");
        std::mem::take(&mut *docs).into_values().collect()
    }

    /// Write all collected documents under `dir`.
    ///
    /// A file that fails to write is reported in
    /// [`FlushReport::failures`] and the remaining files are still written.
    /// Documents leave the sink only once their file is in place, so a
    /// later flush retries the failed ones.
    pub fn flush(&self, dir: &Path) -> CollateResult<FlushReport> {
        if dir.exists() && !dir.is_dir() {
            return Err(CollateError::NotADirectory(dir.to_path_buf()));
        }
        fs::create_dir_all(dir).map_err(|e| CollateError::io(dir, e))?;

        let pending: Vec<Document> = {
            let docs = self.documents.lock().expect("output sink mutex poisoned");
            docs.values().cloned().collect()
        };
        let groups = assign_paths(pending);
        let mut report = FlushReport::default();
        let mut written: Vec<&Document> = Vec::new();
        for (name, docs) in &groups {
            let path = dir.join(name);
            let uris: Vec<Uri> = docs.iter().map(|d| d.uri.clone()).collect();
            if let Err(e) = write_atomic(&path, &join_documents(docs)) {
                warn!(path = %path.display(), error = %e, "failed to write output file");
                report.failures.push(FileFailure {
                    path,
                    uris,
                    error: e.to_string(),
                });
                continue;
            }
            written.extend(docs.iter());
            report.files += 1;
            report.documents += docs.len();
            if docs.len() > 1 {
                debug!(path = %path.display(), documents = uris.len(), "grouped colliding labels");
                report.collisions.push(Collision { path, uris });
            }
        }

        {
            let mut docs = self.documents.lock().expect("output sink mutex poisoned");
            for doc in written {
                // A newer push for the same URI stays for the next flush.
                if docs.get(&doc.uri) == Some(doc) {
                    docs.remove(&doc.uri);
                }
            }
        }
        info!(
            dir = %dir.display(),
            files = report.files,
            documents = report.documents,
            collisions = report.collisions.len(),
            failed = report.failures.len(),
            "flushed output"
        );
        Ok(report)
    }
}

fn write_atomic(path: &Path, content: &str) -> CollateResult<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    fs::write(&temp, content).map_err(|e| CollateError::io(&temp, e))?;
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(CollateError::io(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use hg_types::{parse_timestamp, ContentId};

    use crate::group::split_documents;
    use crate::slug::file_name_for;

    fn doc(uri: &str, label: &str) -> Document {
        Document {
            uri: Uri::parse(uri).unwrap(),
            label: label.to_string(),
            as_of: parse_timestamp("2024-05-01").unwrap(),
            digest: ContentId::from_hash([0; 32]),
            body: format!("---\nURI: {uri}\nLabel: {label}\n---\n\n# {label}\n\nURI: {uri}\n"),
        }
    }

    // -----------------------------------------------------------------------
    // Flush
    // -----------------------------------------------------------------------

    #[test]
    fn flush_writes_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let sink = OutputSink::new();
        sink.push(doc("https://ex.org/church", "Panagia Phorbiottisa"));
        sink.push(doc("https://ex.org/bema", "Bema"));

        let report = sink.flush(dir.path()).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.documents, 2);
        assert!(report.collisions.is_empty());
        assert!(sink.is_empty());

        let text = fs::read_to_string(dir.path().join(file_name_for("Bema"))).unwrap();
        assert!(text.contains("URI: https://ex.org/bema"));
    }

    #[test]
    fn two_narthexes_share_a_file_without_loss() {
        let dir = tempfile::tempdir().unwrap();
        let sink = OutputSink::new();
        sink.push(doc("https://ex.org/b/narthex", "Narthex"));
        sink.push(doc("https://ex.org/a/narthex", "Narthex"));

        let report = sink.flush(dir.path()).unwrap();
        assert_eq!(report.files, 1);
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.collisions[0].uris.len(), 2);

        let text = fs::read_to_string(dir.path().join(file_name_for("Narthex"))).unwrap();
        let blocks = split_documents(&text);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("URI: https://ex.org/a/narthex"));
        assert!(blocks[1].contains("URI: https://ex.org/b/narthex"));
    }

    #[test]
    fn flush_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = OutputSink::new();
        sink.push(doc("https://ex.org/bema", "Bema"));
        sink.flush(dir.path()).unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".md"));
    }

    #[test]
    fn flush_into_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, "x").unwrap();
        let sink = OutputSink::new();
        sink.push(doc("https://ex.org/bema", "Bema"));
        assert!(matches!(sink.flush(&file), Err(CollateError::NotADirectory(_))));
    }

    #[test]
    fn failed_file_is_reported_and_kept_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the target path makes the rename fail.
        let blocked = dir.path().join(file_name_for("Bema"));
        fs::create_dir(&blocked).unwrap();
        let sink = OutputSink::new();
        sink.push(doc("https://ex.org/bema", "Bema"));
        sink.push(doc("https://ex.org/church", "Panagia Phorbiottisa"));
        sink.push(doc("https://ex.org/narthex", "Narthex"));

        let report = sink.flush(dir.path()).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, blocked);
        assert_eq!(report.failures[0].uris, vec![Uri::parse("https://ex.org/bema").unwrap()]);
        assert!(dir.path().join(file_name_for("Narthex")).is_file());

        let leftovers: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");

        assert_eq!(sink.len(), 1);
        fs::remove_dir(&blocked).unwrap();
        let retry = sink.flush(dir.path()).unwrap();
        assert_eq!(retry.files, 1);
        assert!(retry.failures.is_empty());
        assert!(sink.is_empty());
        assert!(blocked.is_file());
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_pushes_are_all_kept() {
        let sink = Arc::new(OutputSink::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..25 {
                        sink.push(doc(&format!("https://ex.org/{t}/{i}"), "Narthex"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.len(), 200);
        let drained = sink.drain();
        assert!(drained.windows(2).all(|w| w[0].uri < w[1].uri));
    }

    #[test]
    fn later_push_replaces_same_uri() {
        let sink = OutputSink::new();
        sink.push(doc("https://ex.org/bema", "Bema"));
        sink.push(doc("https://ex.org/bema", "Bema (sanctuary)"));
        let docs = sink.drain();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].label, "Bema (sanctuary)");
    }
}
