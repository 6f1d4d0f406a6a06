//! JSON file persistence for the entry collections.
//!
//! # Responsibility
//! - Encode the full state as one pretty-printed JSON document.
//! - Replace the file atomically (temp file in the same directory, fsync,
//!   rename) so a crash never leaves a partial document behind.
//! - Accept unversioned documents written by earlier tooling.
//!
//! # Invariants
//! - A missing file is `StoreLoad::Missing`; an unreadable one is an error.
//! - Saving a state loaded from a current document reproduces its bytes.

use crate::classify::classifier::classify;
use crate::model::entry::{Category, Entry, EntryId, EntryStatus, TIMESTAMP_FORMAT};
use crate::store::entry_store::{EntryStore, StoreError, StoreLoad, StoreResult};
use crate::store::state::StoreState;
use chrono::NaiveDateTime;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Version stamp written into every saved document.
pub const STORE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    formula_data: Vec<RawRecord>,
    #[serde(default)]
    trash_data: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<EntryId>,
    content: String,
    timestamp: String,
    status: EntryStatus,
    #[serde(default, rename = "type")]
    category: Option<Category>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    formula_data: &'a [Entry],
    trash_data: &'a [Entry],
}

/// File-backed store writing one JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_atomically(&self, bytes: &[u8]) -> StoreResult<()> {
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|source| StoreError::Io {
            path: parent.clone(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&parent).map_err(|err| self.io_error(err))?;
        tmp.write_all(bytes).map_err(|err| self.io_error(err))?;
        tmp.as_file().sync_all().map_err(|err| self.io_error(err))?;
        // The temp file is removed on drop if persist fails.
        tmp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

impl EntryStore for JsonFileStore {
    fn load(&self) -> StoreResult<StoreLoad> {
        let started_at = Instant::now();
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "event=store_load module=store status=ok mode=missing path={}",
                    self.path.display()
                );
                return Ok(StoreLoad::Missing);
            }
            Err(err) => {
                error!(
                    "event=store_load module=store status=error error_code=read_failed path={} error={}",
                    self.path.display(),
                    err
                );
                return Err(self.io_error(err));
            }
        };

        match decode_document(&self.path, &bytes) {
            Ok(loaded) => {
                let state = match &loaded {
                    StoreLoad::Current(state) | StoreLoad::Legacy(state) => Some(state),
                    StoreLoad::Missing => None,
                };
                info!(
                    "event=store_load module=store status=ok mode={} active={} trash={} duration_ms={}",
                    if loaded.needs_upgrade() { "legacy" } else { "current" },
                    state.map_or(0, |s| s.active().len()),
                    state.map_or(0, |s| s.trash().len()),
                    started_at.elapsed().as_millis()
                );
                Ok(loaded)
            }
            Err(err) => {
                error!(
                    "event=store_load module=store status=error error_code=decode_failed path={} error={}",
                    self.path.display(),
                    err
                );
                Err(err)
            }
        }
    }

    fn save(&self, state: &StoreState) -> StoreResult<()> {
        let started_at = Instant::now();
        let bytes = encode_document(state)?;
        match self.write_atomically(&bytes) {
            Ok(()) => {
                debug!(
                    "event=store_save module=store status=ok bytes={} duration_ms={}",
                    bytes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_save module=store status=error error_code=write_failed path={} error={}",
                    self.path.display(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Encodes `state` as the persisted JSON document, newline terminated.
pub fn encode_document(state: &StoreState) -> StoreResult<Vec<u8>> {
    let document = DocumentRef {
        version: STORE_FORMAT_VERSION,
        formula_data: state.active(),
        trash_data: state.trash(),
    };
    let mut bytes = serde_json::to_vec_pretty(&document).map_err(StoreError::Serialize)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn decode_document(path: &Path, bytes: &[u8]) -> StoreResult<StoreLoad> {
    let raw: RawDocument =
        serde_json::from_slice(bytes).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    let legacy = match raw.version {
        None => true,
        Some(STORE_FORMAT_VERSION) => false,
        Some(other) => {
            return Err(StoreError::invalid_data(
                path,
                format!("unsupported store version {other}; expected {STORE_FORMAT_VERSION}"),
            ));
        }
    };

    let active = parse_records(path, raw.formula_data, legacy)?;
    let trash = parse_records(path, raw.trash_data, legacy)?;
    let state =
        StoreState::from_parts(active, trash).map_err(|err| StoreError::from_validation(path, err))?;

    Ok(if legacy {
        StoreLoad::Legacy(state)
    } else {
        StoreLoad::Current(state)
    })
}

fn parse_records(path: &Path, records: Vec<RawRecord>, legacy: bool) -> StoreResult<Vec<Entry>> {
    records
        .into_iter()
        .map(|record| parse_record(path, record, legacy))
        .collect()
}

fn parse_record(path: &Path, record: RawRecord, legacy: bool) -> StoreResult<Entry> {
    let created_at = NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT)
        .map_err(|_| {
            StoreError::invalid_data(path, format!("invalid timestamp `{}`", record.timestamp))
        })?;

    let id = match (record.id, legacy) {
        (Some(id), _) => id,
        (None, true) => Uuid::new_v4(),
        (None, false) => return Err(StoreError::invalid_data(path, "entry record without `id`")),
    };

    let category = match (record.category, legacy) {
        (Some(category), _) => category,
        (None, true) => classify(&record.content),
        (None, false) => {
            return Err(StoreError::invalid_data(
                path,
                format!("entry {id} has no `type`"),
            ));
        }
    };

    Ok(Entry {
        id,
        content: record.content,
        created_at,
        status: record.status,
        category,
    })
}
