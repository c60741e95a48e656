// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::handler::{required_str, CommandHandler};
use crate::{CommandContext, CommandError, Reporter};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Creates `path` (and any missing parents). Succeeds if it already exists.
pub struct DirectoryCreateCommand;

#[async_trait]
impl CommandHandler for DirectoryCreateCommand {
    fn validate(&self, settings: &Map<String, Value>) -> Result<(), CommandError> {
        required_str(settings, "path")?;
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        settings: &Map<String, Value>,
        report: &Reporter,
    ) -> Result<(), CommandError> {
        if ctx.is_cancelled() {
            return Err(CommandError::Cancelled);
        }
        let path = required_str(settings, "path")?;
        tokio::fs::create_dir_all(path).await?;
        report.report(Some(1.0), Some(format!("created directory {path}")));
        Ok(())
    }
}
