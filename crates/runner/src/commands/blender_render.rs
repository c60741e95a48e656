// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::handler::{required_i64, required_str, CommandHandler};
use crate::line_parser::{parse_blender_line, ParsedSignal};
use crate::subprocess::{run_merged_with_hook, ChildOutcome};
use crate::{CommandContext, CommandError, Reporter};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::process::Command;

fn progress_hook(frame_start: i64, frame_end: i64) -> impl Fn(&str, &Reporter) + Send + Sync + 'static {
    move |line: &str, report: &Reporter| match parse_blender_line(line, frame_start, frame_end) {
        Some(ParsedSignal::Progress(pct)) => report.report(Some(pct), Some(line.to_string())),
        Some(ParsedSignal::Saved { path }) => report.log(format!("Saved: {path}")),
        Some(ParsedSignal::Warning { message }) => report.log(format!("warning: {message}")),
        Some(ParsedSignal::Error { message }) => report.log(format!("error: {message}")),
        None => report.log(line.to_string()),
    }
}

/// Renders a frame range of a blend file to disk through Blender's own
/// `--render-frame` flag.
pub struct BlenderRenderCommand;

#[async_trait]
impl CommandHandler for BlenderRenderCommand {
    fn validate(&self, settings: &Map<String, Value>) -> Result<(), CommandError> {
        required_str(settings, "blender_cmd")?;
        required_str(settings, "filepath")?;
        required_str(settings, "render_format")?;
        required_str(settings, "render_output")?;
        required_i64(settings, "frame_start")?;
        required_i64(settings, "frame_end")?;
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        settings: &Map<String, Value>,
        report: &Reporter,
    ) -> Result<(), CommandError> {
        let blender_cmd = required_str(settings, "blender_cmd")?;
        let filepath = required_str(settings, "filepath")?;
        let render_format = required_str(settings, "render_format")?;
        let render_output = required_str(settings, "render_output")?;
        let frame_start = required_i64(settings, "frame_start")?;
        let frame_end = required_i64(settings, "frame_end")?;

        let mut argv = shlex::split(blender_cmd)
            .ok_or_else(|| CommandError::Validation("blender_cmd is not valid shell syntax".into()))?;
        if argv.is_empty() {
            return Err(CommandError::Validation("blender_cmd must not be empty".into()));
        }
        let exe = argv.remove(0);

        argv.push("--enable-autoexec".into());
        argv.push("-noaudio".into());
        argv.push("--background".into());
        argv.push(filepath.into());
        argv.push("--render-format".into());
        argv.push(render_format.into());
        argv.push("--render-output".into());
        argv.push(render_output.into());
        argv.push("--render-frame".into());
        argv.push(frame_range(frame_start, frame_end));

        let mut cmd = Command::new(exe);
        cmd.args(&argv);

        let hook = progress_hook(frame_start, frame_end);
        let outcome = run_merged_with_hook(cmd, &ctx.cancel, None, report.clone(), hook).await?;

        match outcome {
            ChildOutcome::Exited(0) => {
                report.report(Some(1.0), Some("finished rendering".to_string()));
                Ok(())
            }
            ChildOutcome::Exited(code) => Err(CommandError::ChildNonZero { code }),
            ChildOutcome::Killed | ChildOutcome::Cancelled => Err(CommandError::Cancelled),
        }
    }
}

fn frame_range(start: i64, end: i64) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}..{end}")
    }
}
