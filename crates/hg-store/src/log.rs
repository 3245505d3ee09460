use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use hg_types::{ContentId, Literal, Predicate, Timestamp, Uri, Validity};

use crate::error::{StoreError, StoreResult};
use crate::fact::{FactRecord, ObjectTerm};

/// One accepted ingestion write, in URI space.
///
/// On-disk framing:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized LogRecord)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogRecord {
    Register {
        uri: Uri,
    },
    Fact {
        subject: Uri,
        predicate: Predicate,
        object: LoggedObject,
        valid_from: Option<Timestamp>,
        valid_to: Option<Timestamp>,
    },
    Retract {
        fact: ContentId,
        at: Timestamp,
    },
}

/// Fact object in the log.
///
/// Kept separate from [`ObjectTerm`] because bincode needs every field
/// present, while the JSON form of [`Literal`] omits a missing language.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoggedObject {
    Uri(Uri),
    Literal { value: String, lang: Option<String> },
}

impl From<&FactRecord> for LogRecord {
    fn from(record: &FactRecord) -> Self {
        let object = match &record.object {
            ObjectTerm::Uri(uri) => LoggedObject::Uri(uri.clone()),
            ObjectTerm::Literal(lit) => LoggedObject::Literal {
                value: lit.value.clone(),
                lang: lit.lang.clone(),
            },
        };
        Self::Fact {
            subject: record.subject.clone(),
            predicate: record.predicate,
            object,
            valid_from: record.validity.from,
            valid_to: record.validity.to,
        }
    }
}

impl LogRecord {
    /// The fact carried by a `Fact` record.
    pub fn to_fact(&self) -> Option<FactRecord> {
        let Self::Fact {
            subject,
            predicate,
            object,
            valid_from,
            valid_to,
        } = self
        else {
            return None;
        };
        let object = match object {
            LoggedObject::Uri(uri) => ObjectTerm::Uri(uri.clone()),
            LoggedObject::Literal { value, lang } => ObjectTerm::Literal(Literal {
                value: value.clone(),
                lang: lang.clone(),
            }),
        };
        Some(FactRecord::new(
            subject.clone(),
            *predicate,
            object,
            Validity {
                from: *valid_from,
                to: *valid_to,
            },
        ))
    }
}

/// Result of reading a log front-to-back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recovery {
    pub records: Vec<LogRecord>,
    /// Entries skipped on CRC mismatch or undecodable payload.
    pub skipped: usize,
    /// Whether recovery stopped at a torn tail.
    pub truncated_tail: bool,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

struct LogWriter {
    writer: BufWriter<File>,
    offset: u64,
}

/// Durable, append-only fact log.
///
/// Every accepted write of the store is appended here before it becomes
/// visible. Recovery replays the file from the start; entries failing the
/// CRC are skipped, and a short tail from an interrupted write ends
/// recovery.
pub struct FactLog {
    path: PathBuf,
    writer: Mutex<LogWriter>,
    sync_every_write: bool,
}

impl FactLog {
    /// Open (or create) the log at `path`.
    pub fn open(path: &Path, sync_every_write: bool) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let offset = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(LogWriter {
                writer: BufWriter::new(file),
                offset,
            }),
            sync_every_write,
        })
    }

    /// Append one record. Returns its byte offset.
    pub fn append(&self, record: &LogRecord) -> StoreResult<u64> {
        let payload =
            bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| StoreError::Serialization("log record exceeds 4 GiB".into()))?;
        let crc = crc32fast::hash(&payload);

        let mut w = self.writer.lock().expect("fact log mutex poisoned");
        let entry_offset = w.offset;
        w.writer.write_all(&length.to_le_bytes())?;
        w.writer.write_all(&crc.to_le_bytes())?;
        w.writer.write_all(&payload)?;
        w.writer.flush()?;
        if self.sync_every_write {
            w.writer.get_ref().sync_all()?;
        }
        w.offset += HEADER_SIZE as u64 + payload.len() as u64;

        debug!(offset = entry_offset, len = payload.len(), "fact log append");
        Ok(entry_offset)
    }

    /// Read every intact record.
    pub fn recover(&self) -> StoreResult<Recovery> {
        let mut file = BufReader::new(File::open(&self.path)?);
        let file_len = file.get_ref().metadata()?.len();
        let mut recovery = Recovery::default();
        let mut offset: u64 = 0;

        while offset < file_len {
            if offset + HEADER_SIZE as u64 > file_len {
                warn!(offset, file_len, "torn fact log header; stopping recovery");
                recovery.truncated_tail = true;
                break;
            }
            let mut header = [0u8; HEADER_SIZE];
            match file.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    recovery.truncated_tail = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }
            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 || offset + HEADER_SIZE as u64 + length as u64 > file_len {
                warn!(offset, length, file_len, "invalid fact log entry length; stopping recovery");
                recovery.truncated_tail = true;
                break;
            }

            let mut payload = vec![0u8; length as usize];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(offset, "truncated fact log entry; stopping recovery");
                    recovery.truncated_tail = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }
            offset += HEADER_SIZE as u64 + length as u64;

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch; skipping fact log entry"
                );
                recovery.skipped += 1;
                continue;
            }

            match bincode::deserialize::<LogRecord>(&payload) {
                Ok(record) => recovery.records.push(record),
                Err(e) => {
                    warn!(offset, error = %e, "undecodable fact log entry; skipping");
                    recovery.skipped += 1;
                }
            }
        }

        debug!(
            recovered = recovery.records.len(),
            skipped = recovery.skipped,
            "fact log recovery complete"
        );
        Ok(recovery)
    }

    /// Bytes written so far.
    pub fn offset(&self) -> u64 {
        self.writer.lock().expect("fact log mutex poisoned").offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for FactLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactLog")
            .field("path", &self.path)
            .field("sync_every_write", &self.sync_every_write)
            .finish()
    }
}
