// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted worker identity.
//!
//! The identity file is the sole source of truth for `{worker_id,
//! access_token, platform}`. It is written exactly once, at first
//! registration, and read on every subsequent startup. Its absence is what
//! triggers re-registration with the Manager.

use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("identity file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// `{worker_id, access_token, platform}`, obtained at first registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerIdentity {
    pub worker_id: WorkerId,
    pub access_token: String,
    pub platform: String,
}

impl WorkerIdentity {
    /// Load the identity document from `path`.
    ///
    /// Returns `Ok(None)` if the file does not exist — the caller should
    /// treat this as "not yet registered" rather than an error. Any other
    /// I/O failure, or a file that fails to parse, is reported as
    /// [`IdentityError`]; identity corruption is one of the few conditions
    /// this worker treats as fatal (see the crate-level error policy).
    pub fn load(path: &Path) -> Result<Option<Self>, IdentityError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(IdentityError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let identity = serde_json::from_str(&raw).map_err(|e| IdentityError::Corrupt {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Some(identity))
    }

    /// Durably write the identity document to `path`.
    ///
    /// Writes to a sibling temp file and renames over the target so a crash
    /// mid-write can never leave a half-written identity file behind.
    pub fn save(&self, path: &Path) -> Result<(), IdentityError> {
        let io_err = |source| IdentityError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| IdentityError::Corrupt {
            path: path.to_path_buf(),
            source: e,
        })?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}
