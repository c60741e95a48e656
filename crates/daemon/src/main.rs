// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flamenco Worker
//!
//! Registers (or reuses a persisted identity) with a Flamenco Manager, then
//! runs the worker state machine until it receives a shutdown signal.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;
use fw_daemon::{register_worker, rotate_log_if_needed, setup_logging, sign_off, sign_on, Config};
use fw_runner::CommandRegistry;
use fw_storage::QueueStore;
use fw_upstream::UpstreamClient;
use fw_worker::{Drainer, Worker};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "flamenco-worker", version, about = "Flamenco render-farm worker")]
struct Args {
    /// Base URL of the Flamenco Manager this worker reports to.
    #[arg(long, default_value = "http://localhost:8080/")]
    manager_url: String,

    /// Human-readable name shown in the Manager's worker list.
    #[arg(long, default_value_t = default_nickname())]
    nickname: String,

    /// Task types this worker can execute (e.g. blender-render).
    #[arg(long = "task-type", value_name = "TYPE")]
    task_types: Vec<String>,
}

fn default_nickname() -> String {
    hostname().unwrap_or_else(|| "flamenco-worker".to_string())
}

fn hostname() -> Option<String> {
    std::env::var("HOSTNAME").ok().or_else(|| {
        std::process::Command::new("hostname")
            .output()
            .ok()
            .and_then(|out| String::from_utf8(out.stdout).ok())
            .map(|s| s.trim().to_string())
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = Config::load()?;
    rotate_log_if_needed(&config.log_path);
    let _log_guard = setup_logging(&config)?;

    info!("starting flamenco-worker, manager = {}", args.manager_url);

    let base_url = reqwest::Url::parse(&args.manager_url)?;

    let identity = match fw_core::WorkerIdentity::load(&config.identity_path)? {
        Some(identity) => identity,
        None => {
            info!("no persisted identity, registering with manager");
            let bootstrap = UpstreamClient::new(base_url.clone(), "")?;
            let identity = register_worker(&bootstrap, std::env::consts::OS).await?;
            identity.save(&config.identity_path)?;
            identity
        }
    };

    let client = UpstreamClient::new(base_url, identity.access_token.clone())?;

    let shutdown = CancellationToken::new();
    sign_on(&client, &args.nickname, &args.task_types, &shutdown).await;

    std::fs::create_dir_all(&config.scratch_root)?;
    clean_scratch_dir(&config.scratch_root);

    let store = QueueStore::open(&config.queue_path)?;
    let drainer = Arc::new(Drainer::new(store, client.clone()));
    let worker = Arc::new(Worker::new(
        identity,
        client.clone(),
        Arc::clone(&drainer),
        CommandRegistry::builtin(),
        config.scratch_root.clone(),
    ));

    let drain_handle = tokio::spawn({
        let drainer = Arc::clone(&drainer);
        let shutdown = shutdown.clone();
        async move { drainer.drain_loop(shutdown).await }
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let run_handle = tokio::spawn({
        let worker = Arc::clone(&worker);
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
        result = run_handle => {
            if let Ok(Err(e)) = result {
                error!(error = %e, "worker exited with an error");
            }
            shutdown.cancel();
        }
    }

    shutdown.cancel();
    let _ = drain_handle.await;
    sign_off(&client, &CancellationToken::new()).await;

    info!("flamenco-worker stopped");
    Ok(())
}

/// Clear the scratch directory of everything from a previous run.
///
/// Best-effort: failures are logged, not fatal. There is no task executing
/// yet at this point in startup, so nothing is "currently interesting".
fn clean_scratch_dir(root: &std::path::Path) {
    let Ok(entries) = std::fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to clear scratch entry");
        }
    }
}
