// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::handler::{required_str, CommandHandler};
use crate::{CommandContext, CommandError, Reporter};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Copies `src` to `dest`, creating `dest`'s parent directory if needed.
pub struct FileCopyCommand;

#[async_trait]
impl CommandHandler for FileCopyCommand {
    fn validate(&self, settings: &Map<String, Value>) -> Result<(), CommandError> {
        required_str(settings, "src")?;
        required_str(settings, "dest")?;
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
        let src = required_str(settings, "src")?;
        let dest = required_str(settings, "dest")?;

        if let Some(parent) = std::path::Path::new(dest).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(src, dest).await?;
        report.report(Some(1.0), Some(format!("copied {src} to {dest}")));
        Ok(())
    }
}
