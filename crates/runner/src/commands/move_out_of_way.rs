// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::handler::{required_str, CommandHandler};
use crate::{CommandContext, CommandError, Reporter};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Renames `path` to `path-<epoch-millis>` if it exists, so a later command
/// can write to `path` without clobbering old output. A no-op if `path`
/// does not exist.
pub struct MoveOutOfWayCommand;

#[async_trait]
impl CommandHandler for MoveOutOfWayCommand {
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
        let path = Path::new(required_str(settings, "path")?);
        if !path.exists() {
            report.log(format!("{} does not exist, nothing to move", path.display()));
            return Ok(());
        }

        let moved_to = out_of_way_path(path);
        tokio::fs::rename(path, &moved_to).await?;
        report.report(
            Some(1.0),
            Some(format!("moved {} to {}", path.display(), moved_to.display())),
        );
        Ok(())
    }
}

fn out_of_way_path(path: &Path) -> PathBuf {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("out-of-way");
    path.with_file_name(format!("{file_name}-{millis}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fw_core::TaskId;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn moves_existing_path_aside() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("render_output");
        std::fs::write(&target, b"old").unwrap();

        let mut settings = Map::new();
        settings.insert("path".into(), Value::from(target.to_string_lossy().to_string()));

        let ctx = CommandContext::new(TaskId::new("t1"), dir.path().to_path_buf(), CancellationToken::new());
        let (reporter, _rx) = Reporter::channel();
        MoveOutOfWayCommand.execute(&ctx, &settings, &reporter).await.unwrap();

        assert!(!target.exists());
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn missing_path_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let mut settings = Map::new();
        settings.insert("path".into(), Value::from(missing.to_string_lossy().to_string()));

        let ctx = CommandContext::new(TaskId::new("t1"), dir.path().to_path_buf(), CancellationToken::new());
        let (reporter, _rx) = Reporter::channel();
        MoveOutOfWayCommand.execute(&ctx, &settings, &reporter).await.unwrap();
    }
}
