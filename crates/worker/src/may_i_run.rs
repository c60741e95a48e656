// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisory poller: periodically asks the Manager whether the current
//! task is still allowed to run.
//!
//! Runs only while a task is active — the caller starts one poller per
//! task and cancels it (via the task's own cancellation token) once the
//! task ends, since there is nothing to supervise otherwise.

use fw_core::TaskId;
use fw_upstream::UpstreamClient;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MayIRunResponse {
    pub may_keep_running: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub status_requested: Option<String>,
}

/// What the poller decided after one check (or a run of checks).
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    KeepRunning,
    ChangeStatusAndAbort { status: String, reason: Option<String> },
    Abort { reason: Option<String> },
}

/// Callbacks the poller drives when it decides the task must stop.
pub trait WorkerControl: Send + Sync {
    fn change_status(&self, status: &str);
    fn stop_current_task(&self);
}

pub struct MayIRunPoller<'a> {
    client: &'a UpstreamClient,
    task_id: TaskId,
    poll_interval: Duration,
}

impl<'a> MayIRunPoller<'a> {
    pub fn new(client: &'a UpstreamClient, task_id: TaskId) -> Self {
        Self {
            client,
            task_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[cfg(test)]
    pub fn with_interval(client: &'a UpstreamClient, task_id: TaskId, poll_interval: Duration) -> Self {
        Self {
            client,
            task_id,
            poll_interval,
        }
    }

    /// Issue one `GET /may-i-run/<task_id>` and classify the response.
    #[instrument(skip(self, cancel))]
    pub async fn check_once(&self, cancel: &CancellationToken) -> Verdict {
        let path = format!("may-i-run/{}", self.task_id.as_str());
        let body = match self.client.get(&path, cancel).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "may-i-run check failed, assuming keep-running");
                return Verdict::KeepRunning;
            }
        };
        let response: MayIRunResponse = match serde_json::from_value(body) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "malformed may-i-run response, assuming keep-running");
                return Verdict::KeepRunning;
            }
        };

        if response.may_keep_running {
            return Verdict::KeepRunning;
        }
        match response.status_requested {
            Some(status) => Verdict::ChangeStatusAndAbort {
                status,
                reason: response.reason,
            },
            None => Verdict::Abort { reason: response.reason },
        }
    }

    /// Poll on `poll_interval` until `cancel` fires or a check demands the
    /// task stop, in which case `control` is driven and the loop returns.
    pub async fn run(&self, control: &dyn WorkerControl, cancel: &CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(self.poll_interval) => {}
            }
            if cancel.is_cancelled() {
                return;
            }
            match self.check_once(cancel).await {
                Verdict::KeepRunning => continue,
                Verdict::ChangeStatusAndAbort { status, .. } => {
                    control.change_status(&status);
                    control.stop_current_task();
                    return;
                }
                Verdict::Abort { .. } => {
                    control.stop_current_task();
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "may_i_run_tests.rs"]
mod tests;
