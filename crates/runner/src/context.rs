// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fw_core::TaskId;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Everything a command handler needs besides its own validated settings:
/// where to stage files, and how to notice it's been asked to stop.
#[derive(Clone)]
pub struct CommandContext {
    pub task_id: TaskId,
    pub scratch_dir: PathBuf,
    pub cancel: CancellationToken,
}

impl CommandContext {
    pub fn new(task_id: TaskId, scratch_dir: PathBuf, cancel: CancellationToken) -> Self {
        Self {
            task_id,
            scratch_dir,
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
