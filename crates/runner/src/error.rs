// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io;
use thiserror::Error;

/// Outcome of a single command's execution, surfaced by the registry to the
/// task runner.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("bad command settings: {0}")]
    Validation(String),

    #[error("{0}")]
    Handler(String),

    #[error("child exited with status {code}")]
    ChildNonZero { code: i32 },

    #[error("child terminated by signal")]
    ChildKilled,

    #[error("command cancelled")]
    Cancelled,

    #[error("failed to spawn child process: {0}")]
    Spawn(#[source] io::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("unknown command {0:?}")]
    UnknownCommand(String),
}

impl CommandError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CommandError::Cancelled)
    }
}
