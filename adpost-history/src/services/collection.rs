// src/services/collection.rs
//! One collection = one pretty-printed JSON array file.
//!
//! Every operation is load -> mutate in memory -> full rewrite. A per-file
//! mutex serializes those cycles inside one process; separate processes on the
//! same file are not coordinated.
//!
//! Reads never fail. A missing, unreadable or non-array file takes the
//! recoverable-decode branch and yields an empty collection, with a log event
//! so the data loss is visible. Inside a well-formed array, an element that
//! does not decode is skipped on its own and the rest are kept. Writes go through `write_atomic` and their
//! errors are returned to the caller.

use std::{
    fmt::Display,
    fs,
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use serde_json::Value;

use crate::error::{HistoryError, Result};
use crate::records::HistoryRecord;
use crate::services::retention::format_timestamp;
use crate::utils::fsio::{ensure_file, write_atomic};

const EMPTY_ARRAY: &[u8] = b"[]";

pub struct JsonCollection<R> {
    path: PathBuf,
    lock: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R: HistoryRecord> JsonCollection<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file as `[]` if absent. Returns true when it was created.
    pub fn ensure_exists(&self) -> Result<bool> {
        let _guard = self.guard();
        ensure_file(&self.path, EMPTY_ARRAY).map_err(|source| HistoryError::WriteCollection {
            path: self.path.clone(),
            source,
        })
    }

    /// Snapshot of all records in file order.
    pub fn load(&self) -> Vec<R> {
        let _guard = self.guard();
        self.read_records()
    }

    /// Append one record built from the next id and a fresh timestamp.
    pub fn append_with<F>(&self, build: F) -> Result<R>
    where
        F: FnOnce(u64, String) -> R,
    {
        let appended = self.try_append_with(|_, id, ts| Ok::<_, std::convert::Infallible>(build(id, ts)))?;
        match appended {
            Ok(rec) => Ok(rec),
            Err(never) => match never {},
        }
    }

    /// Append unless `build` declines. `build` sees the current records, so a
    /// screen and the write happen under the same lock. `Err(reason)` from
    /// `build` leaves the file untouched and is handed back to the caller.
    pub fn try_append_with<F, E>(&self, build: F) -> Result<std::result::Result<R, E>>
    where
        F: FnOnce(&[R], u64, String) -> std::result::Result<R, E>,
    {
        let _guard = self.guard();
        let mut records = self.read_records();
        let next_id = records.len() as u64 + 1;
        let record = match build(&records, next_id, format_timestamp(Utc::now())) {
            Ok(rec) => rec,
            Err(reason) => return Ok(Err(reason)),
        };
        records.push(record.clone());
        self.write_records(&records)?;
        tracing::debug!(collection = R::COLLECTION, id = record.id(), "appended record");
        Ok(Ok(record))
    }

    /// Up to `limit` records, newest timestamp first. Equal timestamps keep
    /// their file order.
    pub fn recent(&self, limit: usize) -> Vec<R> {
        let mut records = self.load();
        records.sort_by(|a, b| b.timestamp().cmp(a.timestamp()));
        records.truncate(limit);
        records
    }

    /// Keep only records for which `keep` returns true and rewrite the file,
    /// even when nothing was dropped. Returns `(kept, removed)`.
    pub fn retain<F>(&self, mut keep: F) -> Result<(usize, usize)>
    where
        F: FnMut(&R) -> bool,
    {
        let _guard = self.guard();
        let mut records = self.read_records();
        let before = records.len();
        records.retain(|r| keep(r));
        self.write_records(&records)?;
        Ok((records.len(), before - records.len()))
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The mutex guards no data, so a poisoned lock is still usable.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_records(&self) -> Vec<R> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    collection = R::COLLECTION,
                    path = %self.path.display(),
                    "collection file missing; treating as empty"
                );
                return Vec::new();
            }
            Err(e) => return self.recover_empty(e),
        };
        let items = match serde_json::from_slice::<Vec<Value>>(&bytes) {
            Ok(items) => items,
            Err(e) => return self.recover_empty(e),
        };
        items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<R>(item) {
                Ok(rec) => Some(rec),
                Err(e) => {
                    tracing::warn!(
                        collection = R::COLLECTION,
                        path = %self.path.display(),
                        index,
                        error = %e,
                        "skipping malformed record"
                    );
                    None
                }
            })
            .collect()
    }

    /// Recoverable decode failure: the collection reads as empty.
    fn recover_empty(&self, reason: impl Display) -> Vec<R> {
        tracing::warn!(
            collection = R::COLLECTION,
            path = %self.path.display(),
            error = %reason,
            "unreadable collection file; treating as empty"
        );
        Vec::new()
    }

    fn write_records(&self, records: &[R]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(records).map_err(|source| {
            HistoryError::EncodeCollection {
                collection: R::COLLECTION,
                source,
            }
        })?;
        write_atomic(&self.path, &bytes).map_err(|source| HistoryError::WriteCollection {
            path: self.path.clone(),
            source,
        })
    }
}
