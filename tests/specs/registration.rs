//! First-run registration specs (S7).

use crate::prelude::*;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn worker_registers_and_persists_identity_on_first_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register-worker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "worker_id": "w-1",
            "access_token": "tok",
        })))
        .expect(1)
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

    let mut worker = WorkerProcess::spawn(&format!("{}/", server.uri()), "test-bench");

    let identity_path = worker.identity_path();
    assert!(
        wait_for(Duration::from_secs(5), || identity_path.exists()),
        "identity file should appear after registration"
    );

    let contents = std::fs::read_to_string(&identity_path).expect("identity file readable");
    let identity: serde_json::Value = serde_json::from_str(&contents).expect("identity is JSON");
    assert_eq!(identity["worker_id"], "w-1");
    assert_eq!(identity["access_token"], "tok");
    assert_eq!(identity["platform"], std::env::consts::OS);

    worker.terminate();
    worker.wait_for_exit(Duration::from_secs(5));

    server.verify().await;
}

#[tokio::test]
async fn worker_restarted_with_existing_identity_never_registers_again() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register-worker"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
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

    let state_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        state_dir.path().join("identity.json"),
        serde_json::json!({
            "worker_id": "w-preexisting",
            "access_token": "preexisting-tok",
            "platform": std::env::consts::OS,
        })
        .to_string(),
    )
    .unwrap();

    let mut child = std::process::Command::new(worker_binary())
        .args(["--manager-url", &format!("{}/", server.uri())])
        .env("FLAMENCO_WORKER_STATE_DIR", state_dir.path())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .expect("flamenco-worker should spawn");

    // Give it time to pass through startup and begin its fetch loop.
    std::thread::sleep(Duration::from_millis(500));

    let _ = std::process::Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status();
    let _ = child.wait();

    server.verify().await;
}
