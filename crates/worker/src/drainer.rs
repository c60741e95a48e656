// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The update-queue drainer: repeatedly empties the durable store to the
//! Manager.
//!
//! One `tokio::sync::Mutex` guards the whole store so a drain pass and an
//! `enqueue` never interleave in a way that could delete a row out from
//! under an in-flight POST (see the shared-resources contract this is
//! grounded on).

use fw_core::TaskUpdate;
use fw_storage::{QueueStore, StorageError};
use fw_upstream::UpstreamClient;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{error, instrument, warn};

/// Default pause after a drain pass stops early on a non-conflict error.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Cap on items handled per pass, so a very deep queue doesn't starve other
/// work sharing the runtime.
pub const MAX_ITEMS_PER_PASS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum DrainError {
    #[error("update queue store failure: {0}")]
    Persistence(#[from] StorageError),
}

/// Drives the durable update queue against the Manager.
pub struct Drainer {
    store: Mutex<QueueStore>,
    client: UpstreamClient,
    notify: Notify,
    backoff: Duration,
}

impl Drainer {
    pub fn new(store: QueueStore, client: UpstreamClient) -> Self {
        Self {
            store: Mutex::new(store),
            client,
            notify: Notify::new(),
            backoff: DEFAULT_BACKOFF,
        }
    }

    #[cfg(test)]
    pub fn with_backoff(store: QueueStore, client: UpstreamClient, backoff: Duration) -> Self {
        Self {
            store: Mutex::new(store),
            client,
            notify: Notify::new(),
            backoff,
        }
    }

    /// Queue one update for delivery to `url`. Durable and non-blocking
    /// from the caller's point of view (the store write is the only
    /// suspension point).
    pub async fn enqueue(&self, url: impl Into<String>, update: &TaskUpdate) -> Result<u64, DrainError> {
        let payload = serde_json::to_value(update).unwrap_or(serde_json::Value::Null);
        let rowid = {
            let mut store = self.store.lock().await;
            store.enqueue(url, payload)?
        };
        self.notify.notify_one();
        Ok(rowid)
    }

    pub async fn queue_size(&self) -> usize {
        self.store.lock().await.len()
    }

    /// One drain pass. Returns `true` if the queue was already empty on
    /// entry.
    #[instrument(skip(self, cancel))]
    pub async fn flush(&self, cancel: &CancellationToken) -> Result<bool, DrainError> {
        let mut store = self.store.lock().await;
        let items: Vec<_> = store.iter().take(MAX_ITEMS_PER_PASS).cloned().collect();
        let was_empty = items.is_empty();
        let capped = items.len() >= MAX_ITEMS_PER_PASS;

        let mut to_remove = Vec::new();
        let mut stopped_early = false;
        for item in &items {
            if cancel.is_cancelled() {
                stopped_early = true;
                break;
            }
            match self.client.post(&item.url, &item.payload, cancel).await {
                Ok(_) => to_remove.push(item.rowid),
                Err(e) if e.is_conflict() => {
                    to_remove.push(item.rowid);
                }
                Err(e) => {
                    warn!(error = %e, url = %item.url, "drain pass stopped on error");
                    stopped_early = true;
                    break;
                }
            }
        }

        let before = store.len();
        if !to_remove.is_empty() {
            store.remove_many(&to_remove)?;
        }
        let after = store.len();
        if after > before {
            warn!(before, after, "update queue grew across a drain pass");
        }
        drop(store);

        if stopped_early {
            tokio::time::sleep(self.backoff).await;
        } else if capped {
            tokio::task::yield_now().await;
        }

        Ok(was_empty)
    }

    /// One best-effort drain pass used at shutdown. Errors are logged, not
    /// propagated — the worker is already on its way out.
    pub async fn flush_and_report(&self, cancel: &CancellationToken) {
        if let Err(e) = self.flush(cancel).await {
            error!("best-effort shutdown flush failed: {e}");
        }
    }

    /// Runs until `cancel` fires, repeatedly draining the queue and
    /// sleeping between passes only when it's empty.
    pub async fn drain_loop(&self, cancel: CancellationToken) {
        loop {
            match self.flush(&cancel).await {
                Ok(true) => {
                    if cancel.is_cancelled() {
                        return;
                    }
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return,
                        _ = self.notify.notified() => {}
                    }
                }
                Ok(false) => {
                    if cancel.is_cancelled() {
                        return;
                    }
                }
                Err(e) => {
                    error!("update queue persistence failure, worker must exit: {e}");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "drainer_tests.rs"]
mod tests;
