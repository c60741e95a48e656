// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::handler::CommandHandler;
use crate::{CommandContext, CommandError, Reporter};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Writes a batch of small JSON documents to disk — settings carry a
/// `writes` array of `{path, data}` pairs written in order.
pub struct JsonWritesCommand;

#[async_trait]
impl CommandHandler for JsonWritesCommand {
    fn validate(&self, settings: &Map<String, Value>) -> Result<(), CommandError> {
        let writes = settings
            .get("writes")
            .and_then(Value::as_array)
            .ok_or_else(|| CommandError::Validation("missing required array setting \"writes\"".into()))?;
        if writes.is_empty() {
            return Err(CommandError::Validation("\"writes\" must not be empty".into()));
        }
        for (idx, entry) in writes.iter().enumerate() {
            entry
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| CommandError::Validation(format!("writes[{idx}] missing \"path\"")))?;
            if entry.get("data").is_none() {
                return Err(CommandError::Validation(format!("writes[{idx}] missing \"data\"")));
            }
        }
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        settings: &Map<String, Value>,
        report: &Reporter,
    ) -> Result<(), CommandError> {
        let writes = settings
            .get("writes")
            .and_then(Value::as_array)
            .ok_or_else(|| CommandError::Validation("missing required array setting \"writes\"".into()))?;
        let total = writes.len() as f32;

        for (idx, entry) in writes.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(CommandError::Cancelled);
            }
            let path = entry
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| CommandError::Validation(format!("writes[{idx}] missing \"path\"")))?;
            let data = entry
                .get("data")
                .ok_or_else(|| CommandError::Validation(format!("writes[{idx}] missing \"data\"")))?;

            if let Some(parent) = std::path::Path::new(path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let json = serde_json::to_vec_pretty(data)
                .map_err(|e| CommandError::Handler(format!("failed to encode {path}: {e}")))?;
            tokio::fs::write(path, json).await?;
            report.report(Some((idx as f32 + 1.0) / total), Some(format!("wrote {path}")));
        }
        Ok(())
    }
}
