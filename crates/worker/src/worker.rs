// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker lifecycle state machine: register → fetch → run → report →
//! sleep/shutdown.

use crate::drainer::{DrainError, Drainer};
use crate::may_i_run::{MayIRunPoller, WorkerControl};
use crate::task_runner::TaskRunner;
use fw_core::{Task, WorkerIdentity, WorkerStatus};
use fw_runner::CommandRegistry;
use fw_upstream::{UpstreamClient, UpstreamError};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// How often an `asleep` worker checks whether it should wake back up.
///
/// The fetch endpoint doubles as the wake signal: while asleep the worker
/// still calls it, just on this slower cadence, and a task body (rather than
/// 204) is what the Manager uses to put it back to work.
pub const SLEEP_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Pause after an empty fetch response, so an awake worker with no work
/// doesn't spin.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

const FETCH_BACKOFF_INITIAL: Duration = Duration::from_secs(1);
const FETCH_BACKOFF_MAX: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("manager rejected task fetch: {0}")]
    FetchRejected(#[source] UpstreamError),
    #[error("update queue persistence failure: {0}")]
    Queue(#[from] DrainError),
}

/// Drives the worker's main loop for the lifetime of the process.
pub struct Worker {
    identity: WorkerIdentity,
    client: UpstreamClient,
    drainer: Arc<Drainer>,
    registry: CommandRegistry,
    scratch_root: PathBuf,
    status: Mutex<WorkerStatus>,
    current_task_cancel: Mutex<Option<CancellationToken>>,
}

impl Worker {
    pub fn new(
        identity: WorkerIdentity,
        client: UpstreamClient,
        drainer: Arc<Drainer>,
        registry: CommandRegistry,
        scratch_root: PathBuf,
    ) -> Self {
        Self {
            identity,
            client,
            drainer,
            registry,
            scratch_root,
            status: Mutex::new(WorkerStatus::Starting),
            current_task_cancel: Mutex::new(None),
        }
    }

    pub fn status(&self) -> WorkerStatus {
        *self.status.lock()
    }

    /// Run until `shutdown` fires, then flush remaining updates and return.
    #[instrument(skip(self, shutdown), fields(worker_id = %self.identity.worker_id))]
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        *self.status.lock() = WorkerStatus::Awake;
        let mut backoff = FETCH_BACKOFF_INITIAL;

        while !shutdown.is_cancelled() {
            match self.status() {
                WorkerStatus::ShuttingDown | WorkerStatus::Error => break,
                WorkerStatus::Asleep => {
                    if wait(&shutdown, SLEEP_POLL_INTERVAL).await.is_break() {
                        break;
                    }
                }
                WorkerStatus::Starting | WorkerStatus::Awake => {}
            }
            if shutdown.is_cancelled() {
                break;
            }

            match self.fetch_task(&shutdown).await {
                Ok(Some(task)) => {
                    backoff = FETCH_BACKOFF_INITIAL;
                    self.run_task(task, &shutdown).await;
                }
                Ok(None) => {
                    backoff = FETCH_BACKOFF_INITIAL;
                    if wait(&shutdown, IDLE_POLL_INTERVAL).await.is_break() {
                        break;
                    }
                }
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, backoff = ?backoff, "task fetch failed, backing off");
                    if wait(&shutdown, backoff).await.is_break() {
                        break;
                    }
                    backoff = (backoff * 2).min(FETCH_BACKOFF_MAX);
                }
                Err(e) => {
                    error!(error = %e, "task fetch rejected, worker entering error state");
                    *self.status.lock() = WorkerStatus::Error;
                    return Err(WorkerError::FetchRejected(e));
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(&self) {
        *self.status.lock() = WorkerStatus::ShuttingDown;
        self.stop_current_task();
        let cancel = CancellationToken::new();
        self.drainer.flush_and_report(&cancel).await;
        info!("worker shut down cleanly");
    }

    async fn fetch_task(&self, cancel: &CancellationToken) -> Result<Option<Task>, UpstreamError> {
        let body = serde_json::json!({ "worker_id": self.identity.worker_id });
        let value = self.client.post("task", &body, cancel).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value).map(Some).map_err(UpstreamError::Decode)
    }

    #[instrument(skip(self, task, shutdown), fields(task_id = %task.task_id))]
    async fn run_task(&self, task: Task, shutdown: &CancellationToken) {
        let task_cancel = shutdown.child_token();
        *self.current_task_cancel.lock() = Some(task_cancel.clone());

        let task_runner = TaskRunner::new(
            self.registry.clone(),
            Arc::clone(&self.drainer),
            self.identity.worker_id.clone(),
        );
        let scratch_dir = self.scratch_root.join(task.task_id.as_str());
        let poller = MayIRunPoller::new(&self.client, task.task_id.clone());

        let runner_fut = async {
            let outcome = task_runner.run(&task, scratch_dir, task_cancel.clone()).await;
            // Whether the task finished on its own or was aborted, the
            // poller has nothing left to supervise.
            task_cancel.cancel();
            outcome
        };
        let poller_fut = poller.run(self, &task_cancel);

        let (outcome, ()) = tokio::join!(runner_fut, poller_fut);
        info!(?outcome, "task runner returned");

        *self.current_task_cancel.lock() = None;
    }
}

impl WorkerControl for Worker {
    fn change_status(&self, status: &str) {
        match WorkerStatus::parse(status) {
            Some(parsed) => *self.status.lock() = parsed,
            None => warn!(status, "manager requested an unrecognized worker status"),
        }
    }

    fn stop_current_task(&self) {
        if let Some(cancel) = self.current_task_cancel.lock().clone() {
            cancel.cancel();
        }
    }
}

/// Sleep for `duration`, or return early (as a break) if `shutdown` fires first.
async fn wait(shutdown: &CancellationToken, duration: Duration) -> std::ops::ControlFlow<()> {
    tokio::select! {
        biased;
        () = shutdown.cancelled() => std::ops::ControlFlow::Break(()),
        () = tokio::time::sleep(duration) => std::ops::ControlFlow::Continue(()),
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
