// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::handler::{required_str, CommandHandler};
use crate::subprocess::{run_merged, ChildOutcome};
use crate::{CommandContext, CommandError, Reporter};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::process::Command;

/// Merges a set of EXR layers into one file via a bundled command-line
/// tool. Despite spawning a child, this is grouped with the in-process
/// commands because its output needs no line-by-line progress parsing —
/// only its exit status matters.
pub struct ExrMergeCommand {
    /// Path to the bundled merge tool. Overridable for tests.
    exe: String,
}

impl Default for ExrMergeCommand {
    fn default() -> Self {
        Self {
            exe: "merge-exr-layers".to_string(),
        }
    }
}

#[async_trait]
impl CommandHandler for ExrMergeCommand {
    fn validate(&self, settings: &Map<String, Value>) -> Result<(), CommandError> {
        let inputs = settings
            .get("input_files")
            .and_then(Value::as_array)
            .ok_or_else(|| CommandError::Validation("missing required array setting \"input_files\"".into()))?;
        if inputs.is_empty() {
            return Err(CommandError::Validation("\"input_files\" must not be empty".into()));
        }
        required_str(settings, "output_file")?;
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        settings: &Map<String, Value>,
        report: &Reporter,
    ) -> Result<(), CommandError> {
        let inputs = settings
            .get("input_files")
            .and_then(Value::as_array)
            .ok_or_else(|| CommandError::Validation("missing required array setting \"input_files\"".into()))?;
        let output = required_str(settings, "output_file")?;

        let mut cmd = Command::new(&self.exe);
        for input in inputs {
            let input = input
                .as_str()
                .ok_or_else(|| CommandError::Validation("input_files entries must be strings".into()))?;
            cmd.arg(input);
        }
        cmd.arg("-o").arg(output);

        match run_merged(cmd, &ctx.cancel, None, report.clone()).await? {
            ChildOutcome::Exited(0) => {
                report.report(Some(1.0), Some(format!("merged into {output}")));
                Ok(())
            }
            ChildOutcome::Exited(code) => Err(CommandError::ChildNonZero { code }),
            ChildOutcome::Killed | ChildOutcome::Cancelled => Err(CommandError::Cancelled),
        }
    }
}
