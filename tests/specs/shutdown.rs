//! CLI surface and graceful-shutdown specs.

use crate::prelude::*;
use assert_cmd::Command as AssertCommand;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn help_flag_describes_flags_without_starting_a_worker() {
    let mut cmd = AssertCommand::new(worker_binary());
    cmd.arg("--help");
    let assertion = cmd.assert().success();
    let output = assertion.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--manager-url"));
    assert!(stdout.contains("--nickname"));
}

#[test]
fn version_flag_reports_the_crate_version() {
    let mut cmd = AssertCommand::new(worker_binary());
    cmd.arg("--version");
    let assertion = cmd.assert().success();
    let output = assertion.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("flamenco-worker"));
}

#[tokio::test]
async fn sigterm_drains_the_queue_and_signs_off_before_exiting() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register-worker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "worker_id": "w-shutdown",
            "access_token": "tok",
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sign-on"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/task"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sign-off"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut worker = WorkerProcess::spawn(&format!("{}/", server.uri()), "shutdown-bench");

    let identity_path = worker.identity_path();
    assert!(
        wait_for(Duration::from_secs(5), || identity_path.exists()),
        "worker should have registered and persisted an identity"
    );

    worker.terminate();
    let status = worker.wait_for_exit(Duration::from_secs(5));
    assert!(
        status.is_some_and(|s| s.success()),
        "worker should exit cleanly after SIGTERM"
    );
}
