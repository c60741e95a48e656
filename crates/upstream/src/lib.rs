// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fw-upstream: thin HTTP client to the Manager.
//!
//! Every call classifies its outcome into one of four buckets a caller can
//! act on without inspecting status codes itself: unreachable (no
//! connection), retryable (5xx / network hiccup), terminal (4xx other than
//! 409), or conflict (409 — "not your task anymore", meaningful only to the
//! update queue). Callers drive cancellation with a [`CancellationToken`];
//! every operation races the request against it.

mod error;

pub use error::UpstreamError;

use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport to the Manager, authenticated with a worker's bearer
/// credential.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    access_token: String,
}

impl UpstreamClient {
    pub fn new(base_url: reqwest::Url, access_token: impl Into<String>) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(UpstreamError::Unreachable)?;
        Ok(Self {
            http,
            base_url,
            access_token: access_token.into(),
        })
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, UpstreamError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| UpstreamError::InvalidPath {
                path: path.to_string(),
                message: source.to_string(),
            })
    }

    /// POST `json` to `path`, returning the decoded JSON body on 2xx.
    #[instrument(skip(self, json, cancel), fields(path))]
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        json: &T,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, UpstreamError> {
        let url = self.url(path)?;
        let request = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(json)
            .send();

        let response = race(request, cancel).await?.map_err(classify_send_error)?;
        handle_response(response).await
    }

    /// GET `path`, returning the decoded JSON body on 2xx.
    #[instrument(skip(self, cancel), fields(path))]
    pub async fn get(&self, path: &str, cancel: &CancellationToken) -> Result<serde_json::Value, UpstreamError> {
        let url = self.url(path)?;
        let request = self.http.get(url).bearer_auth(&self.access_token).send();

        let response = race(request, cancel).await?.map_err(classify_send_error)?;
        handle_response(response).await
    }

    /// Stream the binary body of `path` to `dest`, overwriting it.
    #[instrument(skip(self, cancel), fields(path, dest = %dest.display()))]
    pub async fn download(
        &self,
        path: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), UpstreamError> {
        let url = self.url(path)?;
        let request = self.http.get(url).bearer_auth(&self.access_token).send();

        let response = race(request, cancel).await?.map_err(classify_send_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, response.text().await.unwrap_or_default()));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| UpstreamError::Io { path: dest.to_path_buf(), source })?;
        }
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|source| UpstreamError::Io { path: dest.to_path_buf(), source })?;

        let mut response = response;
        loop {
            let next = race(response.chunk(), cancel).await?;
            match next.map_err(classify_send_error)? {
                Some(chunk) => {
                    file.write_all(&chunk)
                        .await
                        .map_err(|source| UpstreamError::Io { path: dest.to_path_buf(), source })?;
                }
                None => break,
            }
        }
        file.flush()
            .await
            .map_err(|source| UpstreamError::Io { path: dest.to_path_buf(), source })?;
        debug!("download complete");
        Ok(())
    }
}

async fn race<F, T>(fut: F, cancel: &CancellationToken) -> Result<T, UpstreamError>
where
    F: std::future::Future<Output = T>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(UpstreamError::Cancelled),
        out = fut => Ok(out),
    }
}

async fn handle_response(response: reqwest::Response) -> Result<serde_json::Value, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        if response.content_length() == Some(0) {
            return Ok(serde_json::Value::Null);
        }
        let bytes = response.bytes().await.map_err(classify_send_error)?;
        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        return serde_json::from_slice(&bytes).map_err(UpstreamError::Decode);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, body))
}

fn classify_status(status: reqwest::StatusCode, body: String) -> UpstreamError {
    if status == reqwest::StatusCode::CONFLICT {
        return UpstreamError::Conflict;
    }
    if status.is_server_error() {
        return UpstreamError::Retryable { status, body };
    }
    UpstreamError::Terminal { status, body }
}

fn classify_send_error(source: reqwest::Error) -> UpstreamError {
    if source.is_connect() || source.is_timeout() {
        UpstreamError::Unreachable(source)
    } else if let Some(status) = source.status() {
        UpstreamError::Terminal {
            status,
            body: source.to_string(),
        }
    } else {
        UpstreamError::Retryable {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: source.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
