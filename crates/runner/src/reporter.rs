// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The callback surface a running command uses to stream progress and log
//! lines back out without knowing anything about the update queue.

use tokio::sync::mpsc;

/// One fragment of progress reported by a running command.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEvent {
    pub command_progress_percentage: Option<f32>,
    pub log: Option<String>,
}

/// Handed to every [`crate::CommandHandler::execute`] call. Cloning is cheap
/// — it's just a channel handle, so concurrent readers (e.g. the merged
/// stdout/stderr pump) can each hold one.
#[derive(Clone)]
pub struct Reporter {
    tx: mpsc::UnboundedSender<ReportEvent>,
}

impl Reporter {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ReportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report a log line with no progress change.
    pub fn log(&self, line: impl Into<String>) {
        let _ = self.tx.send(ReportEvent {
            command_progress_percentage: None,
            log: Some(line.into()),
        });
    }

    /// Report a progress percentage with no accompanying log line.
    pub fn progress(&self, percentage: f32) {
        let _ = self.tx.send(ReportEvent {
            command_progress_percentage: Some(percentage),
            log: None,
        });
    }

    /// Report both together (e.g. a parsed "Saved: <path>" line with the
    /// percentage it implies).
    pub fn report(&self, percentage: Option<f32>, line: Option<impl Into<String>>) {
        let _ = self.tx.send(ReportEvent {
            command_progress_percentage: percentage,
            log: line.map(Into::into),
        });
    }
}
