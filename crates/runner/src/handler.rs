// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{CommandContext, CommandError, Reporter};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// The capability every command name in the registry implements.
///
/// `validate` runs before the command is dispatched so bad settings fail
/// fast with `activity = "bad command settings"`, matching the task
/// runner's error-handling contract, without spawning anything.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn validate(&self, settings: &Map<String, Value>) -> Result<(), CommandError>;

    async fn execute(
        &self,
        ctx: &CommandContext,
        settings: &Map<String, Value>,
        report: &Reporter,
    ) -> Result<(), CommandError>;
}

pub(crate) fn required_str<'a>(settings: &'a Map<String, Value>, key: &str) -> Result<&'a str, CommandError> {
    settings
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CommandError::Validation(format!("missing required string setting {key:?}")))
}

pub(crate) fn required_i64(settings: &Map<String, Value>, key: &str) -> Result<i64, CommandError> {
    settings
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| CommandError::Validation(format!("missing required integer setting {key:?}")))
}

pub(crate) fn optional_str<'a>(settings: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    settings.get(key).and_then(Value::as_str)
}
