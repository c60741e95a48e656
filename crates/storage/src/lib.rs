// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fw-storage: durable persistence for the worker's pending update queue.
//!
//! The store itself knows nothing about HTTP; it only guarantees that
//! enqueued rows survive a process crash and are handed back out in FIFO
//! (rowid) order until explicitly removed. The drain loop that POSTs rows
//! to the Manager lives in `fw-worker`.

mod queue;

pub use queue::{QueueStore, QueuedItem, StorageError};
