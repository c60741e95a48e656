// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawns a child, reads its stdout and stderr line by line, and escalates
//! terminate→kill on cancellation or timeout.
//!
//! True fd-level merging of stdout/stderr (so interleaving exactly matches
//! what the child wrote) would need an `unsafe` duplicated file descriptor;
//! this workspace forbids `unsafe_code`, so the two streams are read on
//! separate tasks and interleaved by arrival instead. Each stream's internal
//! ordering is still exact, which is what callers depend on.

use crate::error::CommandError;
use crate::reporter::Reporter;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// How a raw output line is turned into a report. The default simply logs
/// the line verbatim; command-specific hooks (e.g. the Blender line parser)
/// can additionally call `report.progress(..)` for lines that carry a
/// progress signal.
pub trait LineHook: Fn(&str, &Reporter) + Send + Sync {}
impl<F: Fn(&str, &Reporter) + Send + Sync> LineHook for F {}

fn log_verbatim(line: &str, report: &Reporter) {
    report.log(line);
}

/// How long to wait after SIGTERM before escalating to SIGKILL.
pub const TERMINATE_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOutcome {
    Exited(i32),
    Killed,
    Cancelled,
}

/// Run `cmd` to completion, feeding every line of its merged output through
/// `hook` (which reports it via `report`), honoring `cancel` and an optional
/// wall-clock `timeout`.
pub async fn run_merged(
    mut cmd: Command,
    cancel: &tokio_util::sync::CancellationToken,
    timeout: Option<Duration>,
    report: Reporter,
) -> Result<ChildOutcome, CommandError> {
    run_merged_with_hook(cmd, cancel, timeout, report, log_verbatim).await
}

/// Like [`run_merged`], but lets the caller intercept each line (e.g. to
/// extract a progress percentage) before it's reported.
pub async fn run_merged_with_hook<H>(
    mut cmd: Command,
    cancel: &tokio_util::sync::CancellationToken,
    timeout: Option<Duration>,
    report: Reporter,
    hook: H,
) -> Result<ChildOutcome, CommandError>
where
    H: LineHook + 'static,
{
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(CommandError::Spawn)?;
    let hook = Arc::new(hook);

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_task = stdout.map(|out| {
        let report = report.clone();
        let hook = Arc::clone(&hook);
        tokio::spawn(async move {
            let mut lines = BufReader::new(out).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                hook(&line, &report);
            }
        })
    });
    let stderr_task = stderr.map(|err| {
        let report = report.clone();
        let hook = Arc::clone(&hook);
        tokio::spawn(async move {
            let mut lines = BufReader::new(err).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                hook(&line, &report);
            }
        })
    });

    let timeout_sleep = async {
        match timeout {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(timeout_sleep);

    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("task cancelled, terminating child");
            terminate_then_kill(&mut child).await
        }
        () = &mut timeout_sleep => {
            warn!("command timed out, terminating child");
            terminate_then_kill(&mut child).await
        }
        status = child.wait() => {
            match status {
                Ok(status) => status
                    .code()
                    .map(ChildOutcome::Exited)
                    .unwrap_or(ChildOutcome::Killed),
                Err(source) => return Err(CommandError::Spawn(source)),
            }
        }
    };

    if let Some(task) = stdout_task {
        let _ = task.await;
    }
    if let Some(task) = stderr_task {
        let _ = task.await;
    }

    Ok(outcome)
}

/// Send SIGTERM, wait [`TERMINATE_GRACE_PERIOD`], then SIGKILL if the child
/// is still alive.
async fn terminate_then_kill(child: &mut Child) -> ChildOutcome {
    if let Some(pid) = child.id() {
        let pid = Pid::from_raw(pid as i32);
        let _ = signal::kill(pid, Signal::SIGTERM);
    }

    match tokio::time::timeout(TERMINATE_GRACE_PERIOD, child.wait()).await {
        Ok(Ok(_status)) => ChildOutcome::Cancelled,
        Ok(Err(_)) | Err(_) => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            ChildOutcome::Cancelled
        }
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
