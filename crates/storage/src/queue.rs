// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL-backed durable queue of pending Manager updates.
//!
//! Each row is a single line of JSON: `{"rowid":N,"url":"...","payload":{...}}`.
//! The payload is kept as an opaque `serde_json::Value` rather than a typed
//! `TaskUpdate` so that a worker binary can be upgraded without the queue
//! file's schema blocking a clean read on the next startup (see the
//! self-describing-payload design note this is grounded on).
//!
//! Removal is implemented as a full-file rewrite (temp file + atomic
//! rename), mirroring a write-ahead log's compaction step: the store is
//! small and bounded (drain passes cap at 1000 items), so this keeps the
//! implementation simple rather than chasing in-place deletion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt queue entry at line {line}: {message}")]
    Corrupt { line: usize, message: String },
}

/// One row of the durable update queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedItem {
    pub rowid: u64,
    pub url: String,
    pub payload: serde_json::Value,
}

/// Durable FIFO store of `(url, payload)` rows, ordered by monotonic rowid.
///
/// Only the [`QueueStore`] itself reads or writes the backing file; callers
/// enqueue and remove rows through this type so enqueues never race a
/// compaction that's mid-rewrite.
pub struct QueueStore {
    path: PathBuf,
    next_rowid: u64,
    items: BTreeMap<u64, QueuedItem>,
}

impl QueueStore {
    /// Open (or create) the queue file at `path`, replaying any rows left
    /// over from a previous run.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let mut items = BTreeMap::new();
        let mut max_rowid = 0u64;

        match File::open(path) {
            Ok(file) => {
                let reader = BufReader::new(file);
                for (idx, line) in reader.lines().enumerate() {
                    let line = line.map_err(|source| StorageError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let item: QueuedItem =
                        serde_json::from_str(trimmed).map_err(|e| StorageError::Corrupt {
                            line: idx + 1,
                            message: e.to_string(),
                        })?;
                    max_rowid = max_rowid.max(item.rowid);
                    items.insert(item.rowid, item);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            next_rowid: max_rowid + 1,
            items,
        })
    }

    /// Push a row onto the queue. Durable once this returns `Ok`.
    pub fn enqueue(&mut self, url: impl Into<String>, payload: serde_json::Value) -> Result<u64, StorageError> {
        let rowid = self.next_rowid;
        let item = QueuedItem {
            rowid,
            url: url.into(),
            payload,
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })?;
        let mut line = serde_json::to_vec(&item).map_err(|e| StorageError::Corrupt {
            line: 0,
            message: e.to_string(),
        })?;
        line.push(b'\n');
        file.write_all(&line).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        file.sync_all().map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;

        self.items.insert(rowid, item);
        self.next_rowid += 1;
        Ok(rowid)
    }

    /// Number of undelivered rows.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate rows in rowid (FIFO) order.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedItem> {
        self.items.values()
    }

    /// Remove a batch of rowids and durably compact the backing file in one
    /// rewrite. A no-op (no rewrite) if `rowids` is empty.
    pub fn remove_many(&mut self, rowids: &[u64]) -> Result<(), StorageError> {
        if rowids.is_empty() {
            return Ok(());
        }
        for rowid in rowids {
            self.items.remove(rowid);
        }
        self.compact()
    }

    fn compact(&self) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = File::create(&tmp).map_err(|source| StorageError::Io {
                path: tmp.clone(),
                source,
            })?;
            for item in self.items.values() {
                let mut line = serde_json::to_vec(item).map_err(|e| StorageError::Corrupt {
                    line: 0,
                    message: e.to_string(),
                })?;
                line.push(b'\n');
                file.write_all(&line).map_err(|source| StorageError::Io {
                    path: tmp.clone(),
                    source,
                })?;
            }
            file.sync_all().map_err(|source| StorageError::Io {
                path: tmp.clone(),
                source,
            })?;
        }
        std::fs::rename(&tmp, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
