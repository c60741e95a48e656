// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of the worker process, as reported to and requested by the Manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerStatus {
    /// Registering / signing on, before the first task fetch.
    Starting,
    /// Normal operation: fetching and running tasks.
    Awake,
    /// Not fetching tasks; periodically polling for a wake directive.
    Asleep,
    /// Flushing final updates before process exit.
    ShuttingDown,
    /// Unrecoverable condition (identity or queue-store corruption).
    Error,
}

impl WorkerStatus {
    /// Parse a status string as sent by the Manager (e.g. `status_requested`).
    ///
    /// Unrecognized strings are not an error here: the Manager may request
    /// statuses this worker doesn't model an internal transition for, and the
    /// caller decides whether to `ack-status-change` anyway.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "starting" => Some(Self::Starting),
            "awake" => Some(Self::Awake),
            "asleep" => Some(Self::Asleep),
            "shutting-down" => Some(Self::ShuttingDown),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Awake => "awake",
            Self::Asleep => "asleep",
            Self::ShuttingDown => "shutting-down",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
