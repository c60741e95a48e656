// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! First-registration and sign-on/sign-off calls against the Manager.
//!
//! These happen outside the worker state machine proper (§4.6 only covers
//! the awake/asleep/shutdown loop once an identity exists); they're thin
//! enough not to warrant their own component.

use fw_core::{WorkerIdentity, WorkerId};
use fw_upstream::UpstreamClient;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("registration request failed: {0}")]
    Upstream(#[from] fw_upstream::UpstreamError),
    #[error("manager's registration response was malformed: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct RegisterResponse {
    worker_id: WorkerId,
    access_token: String,
}

/// Register as a brand-new worker and obtain a durable identity.
///
/// `client` should be built with a placeholder credential — the Manager
/// does not require (and the worker does not yet have) a bearer token for
/// this call.
#[instrument(skip(client))]
pub async fn register_worker(client: &UpstreamClient, platform: &str) -> Result<WorkerIdentity, RegistrationError> {
    let cancel = CancellationToken::new();
    let body = serde_json::json!({ "platform": platform });
    let response = client.post("register-worker", &body, &cancel).await?;
    let parsed: RegisterResponse = serde_json::from_value(response)?;
    Ok(WorkerIdentity {
        worker_id: parsed.worker_id,
        access_token: parsed.access_token,
        platform: platform.to_string(),
    })
}

/// Declare supported task types and a nickname at startup. Best-effort: a
/// failure here is logged, not fatal — the worker still tries to fetch
/// tasks afterward.
#[instrument(skip(client, cancel))]
pub async fn sign_on(client: &UpstreamClient, nickname: &str, supported_task_types: &[String], cancel: &CancellationToken) {
    let body = serde_json::json!({
        "nickname": nickname,
        "supported_task_types": supported_task_types,
    });
    if let Err(e) = client.post("sign-on", &body, cancel).await {
        warn!(error = %e, "sign-on failed, continuing anyway");
    }
}

/// Declare going away. Best-effort, called once during shutdown.
#[instrument(skip(client, cancel))]
pub async fn sign_off(client: &UpstreamClient, cancel: &CancellationToken) {
    let body = serde_json::Value::Null;
    if let Err(e) = client.post("sign-off", &body, cancel).await {
        warn!(error = %e, "sign-off failed, manager may think we're still around");
    }
}

#[cfg(test)]
#[path = "registration_tests.rs"]
mod tests;
