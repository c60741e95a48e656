// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Classification of an upstream call's outcome.
///
/// Callers match on this instead of inspecting status codes: [`Self::Retryable`]
/// and [`Self::Unreachable`] are worth retrying with backoff, [`Self::Terminal`]
/// is not, and [`Self::Conflict`] carries the update-queue's "discard, not
/// your task anymore" meaning.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("manager unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("manager returned {status}: {body}")]
    Retryable {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("manager rejected request with {status}: {body}")]
    Terminal {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("manager returned 409 conflict")]
    Conflict,

    #[error("invalid request path {path}: {message}")]
    InvalidPath { path: String, message: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,
}

impl UpstreamError {
    /// Whether a caller should retry this call after a backoff, rather than
    /// surface it as a terminal failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UpstreamError::Unreachable(_) | UpstreamError::Retryable { .. })
    }

    /// Whether this is the update-queue's "discard, not your task" signal.
    pub fn is_conflict(&self) -> bool {
        matches!(self, UpstreamError::Conflict)
    }
}
