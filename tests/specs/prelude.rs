//! Test helpers for flamenco-worker behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::{Duration, Instant};

/// Resolves the path to a binary built by this workspace, checking the
/// standard target directory first and falling back to a path derived
/// from the test binary itself (covers non-standard CARGO_MANIFEST_DIR
/// setups, e.g. coverage runs).
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

pub fn worker_binary() -> PathBuf {
    binary_path("flamenco-worker")
}

/// A running `flamenco-worker` process pointed at a mocked Manager, with
/// its own isolated state directory.
pub struct WorkerProcess {
    child: Child,
    state_dir: tempfile::TempDir,
}

impl WorkerProcess {
    pub fn spawn(manager_url: &str, nickname: &str) -> Self {
        let state_dir = tempfile::tempdir().expect("temp dir for worker state");
        let child = Command::new(worker_binary())
            .args(["--manager-url", manager_url, "--nickname", nickname])
            .env("FLAMENCO_WORKER_STATE_DIR", state_dir.path())
            .env("RUST_LOG", "info")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .expect("flamenco-worker should spawn");
        Self { child, state_dir }
    }

    pub fn state_dir(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn identity_path(&self) -> PathBuf {
        self.state_dir.path().join("identity.json")
    }

    /// Send SIGTERM, matching the signal the daemon installs a handler for.
    pub fn terminate(&self) {
        let _ = Command::new("kill")
            .args(["-TERM", &self.child.id().to_string()])
            .status();
    }

    pub fn wait_for_exit(&mut self, timeout: Duration) -> Option<std::process::ExitStatus> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Ok(Some(status)) = self.child.try_wait() {
                return Some(status);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        None
    }
}

impl Drop for WorkerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Poll `condition` until it returns true or `timeout` elapses.
pub fn wait_for<F: FnMut() -> bool>(timeout: Duration, mut condition: F) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}
