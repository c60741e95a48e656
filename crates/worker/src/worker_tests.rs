// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fw_core::TaskId;
use fw_storage::QueueStore;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn identity() -> WorkerIdentity {
    WorkerIdentity {
        worker_id: fw_core::WorkerId::new("w1"),
        access_token: "tok".into(),
        platform: "linux".into(),
    }
}

fn unique_path() -> std::path::PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    std::env::temp_dir().join(format!("worker-{}.jsonl", COUNTER.fetch_add(1, Ordering::Relaxed)))
}

async fn build(server: &MockServer, scratch: &std::path::Path) -> Worker {
    let base = reqwest::Url::parse(&format!("{}/", server.uri())).unwrap();
    let client = UpstreamClient::new(base, "tok").unwrap();
    let store_path = unique_path();
    let _ = std::fs::remove_file(&store_path);
    let store = QueueStore::open(&store_path).unwrap();
    let drainer = Arc::new(Drainer::new(store, client.clone()));
    Worker::new(identity(), client, drainer, CommandRegistry::builtin(), scratch.to_path_buf())
}

#[tokio::test]
async fn empty_fetch_response_is_treated_as_no_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/task"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let scratch = tempdir().unwrap();
    let worker = build(&server, scratch.path()).await;
    let shutdown = CancellationToken::new();
    assert!(worker.fetch_task(&shutdown).await.unwrap().is_none());
}

#[tokio::test]
async fn fetch_decodes_task_body() {
    let server = MockServer::start().await;
    let task_json = json!({
        "task_id": "t1",
        "job_id": "j1",
        "job_type": "render",
        "task_type": "generic",
        "commands": [],
    });
    Mock::given(method("POST"))
        .and(path("/task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json))
        .mount(&server)
        .await;

    let scratch = tempdir().unwrap();
    let worker = build(&server, scratch.path()).await;
    let shutdown = CancellationToken::new();
    let task = worker.fetch_task(&shutdown).await.unwrap().unwrap();
    assert_eq!(task.task_id, TaskId::new("t1"));
}

#[tokio::test]
async fn full_task_runs_to_completion_and_drains_updates() {
    let server = MockServer::start().await;
    let task_json = json!({
        "task_id": "t1",
        "job_id": "j1",
        "job_type": "render",
        "task_type": "generic",
        "commands": [{"name": "directory-create", "settings": {"path": scratch_path()}}],
    });
    Mock::given(method("POST"))
        .and(path("/tasks/t1/update"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let scratch = tempdir().unwrap();
    let worker = build(&server, scratch.path()).await;
    let shutdown = CancellationToken::new();
    let task: fw_core::Task = serde_json::from_value(task_json).unwrap();
    worker.run_task(task, &shutdown).await;
    assert!(worker.current_task_cancel.lock().is_none());
}

fn scratch_path() -> String {
    std::env::temp_dir().join("fw-worker-tests-scratch").to_string_lossy().to_string()
}

#[tokio::test]
async fn stop_current_task_cancels_the_stored_token() {
    let server = MockServer::start().await;
    let scratch = tempdir().unwrap();
    let worker = build(&server, scratch.path()).await;
    let token = CancellationToken::new();
    *worker.current_task_cancel.lock() = Some(token.clone());
    worker.stop_current_task();
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn change_status_parses_known_status_and_ignores_garbage() {
    let server = MockServer::start().await;
    let scratch = tempdir().unwrap();
    let worker = build(&server, scratch.path()).await;

    worker.change_status("asleep");
    assert_eq!(worker.status(), WorkerStatus::Asleep);

    worker.change_status("not-a-real-status");
    assert_eq!(worker.status(), WorkerStatus::Asleep, "unrecognized status leaves prior status in place");
}

#[tokio::test]
async fn shutdown_flushes_queue_best_effort() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    struct Counter(Arc<AtomicUsize>);
    impl Respond for Counter {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            self.0.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200)
        }
    }
    Mock::given(method("POST"))
        .and(path("/tasks/t1/update"))
        .respond_with(Counter(Arc::clone(&attempts)))
        .mount(&server)
        .await;

    let scratch = tempdir().unwrap();
    let worker = build(&server, scratch.path()).await;
    worker
        .drainer
        .enqueue("tasks/t1/update", &fw_core::TaskUpdate::new(fw_core::WorkerId::new("w1")))
        .await
        .unwrap();

    worker.shutdown().await;
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
