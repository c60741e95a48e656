// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout and logging setup for the worker process.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a state directory for this platform")]
    NoStateDir,
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolved filesystem paths for one worker install.
///
/// Everything the worker persists lives under [`Config::state_dir`]; the
/// scratch directory is separate since it's disposable render-output
/// staging, not durable state.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub identity_path: PathBuf,
    pub queue_path: PathBuf,
    pub log_path: PathBuf,
    pub scratch_root: PathBuf,
}

impl Config {
    /// Resolve paths: `FLAMENCO_WORKER_STATE_DIR` overrides the OS default
    /// state directory (`~/.local/state/flamenco-worker` on Linux).
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = state_dir()?;
        Ok(Self {
            identity_path: state_dir.join("identity.json"),
            queue_path: state_dir.join("update-queue.jsonl"),
            log_path: state_dir.join("worker.log"),
            scratch_root: std::env::temp_dir().join("flamenco-worker"),
            state_dir,
        })
    }
}

fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("FLAMENCO_WORKER_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::state_dir()
        .or_else(dirs::home_dir)
        .map(|d| d.join("flamenco-worker"))
        .ok_or(ConfigError::NoStateDir)
}

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotate `worker.log` to `worker.log.1` if it has grown past [`MAX_LOG_SIZE`].
/// Best-effort: failures here must never prevent startup.
pub fn rotate_log_if_needed(log_path: &std::path::Path) {
    let Ok(metadata) = std::fs::metadata(log_path) else {
        return;
    };
    if metadata.len() < MAX_LOG_SIZE {
        return;
    }
    let rotated = log_path.with_extension("log.1");
    let _ = std::fs::rename(log_path, rotated);
}

/// Install a non-blocking file-backed `tracing` subscriber, filtered by
/// `RUST_LOG` (defaulting to `info`).
pub fn setup_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, ConfigError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(ConfigError::NoStateDir)?,
        config.log_path.file_name().ok_or(ConfigError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
