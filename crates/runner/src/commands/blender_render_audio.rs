// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::handler::{optional_str, required_i64, required_str, CommandHandler};
use crate::subprocess::{run_merged, ChildOutcome};
use crate::{CommandContext, CommandError, Reporter};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::process::Command;

/// The worker's designated Python exit code, used to tell "the embedded
/// mixdown script failed" apart from "Blender itself crashed" by exit
/// status alone.
const DEFAULT_PYTHON_EXIT_CODE: i64 = 47;

/// Renders a blend file's audio track to a standalone file via an embedded
/// Python script driving `bpy.ops.sound.mixdown`.
pub struct BlenderRenderAudioCommand;

#[async_trait]
impl CommandHandler for BlenderRenderAudioCommand {
    fn validate(&self, settings: &Map<String, Value>) -> Result<(), CommandError> {
        required_str(settings, "blender_cmd")?;
        required_str(settings, "filepath")?;
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
        let python_exit_code = settings
            .get("python_exit_code")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_PYTHON_EXIT_CODE);
        let render_output = required_str(settings, "render_output")?.to_string();
        let (exe, argv) = build_argv(settings)?;

        let mut cmd = Command::new(exe);
        cmd.args(&argv);

        match run_merged(cmd, &ctx.cancel, None, report.clone()).await? {
            ChildOutcome::Exited(0) => {
                report.report(Some(1.0), Some(format!("mixed down audio to {render_output}")));
                Ok(())
            }
            ChildOutcome::Exited(code) if code == python_exit_code as i32 => {
                Err(CommandError::Handler("embedded mixdown script failed".to_string()))
            }
            ChildOutcome::Exited(code) => Err(CommandError::ChildNonZero { code }),
            ChildOutcome::Killed | ChildOutcome::Cancelled => Err(CommandError::Cancelled),
        }
    }
}

/// Build the exe and argv for a mixdown invocation from validated settings,
/// without spawning anything — kept separate from `execute` so the exact
/// argument composition can be tested in isolation.
fn build_argv(settings: &Map<String, Value>) -> Result<(String, Vec<String>), CommandError> {
    let blender_cmd = required_str(settings, "blender_cmd")?;
    let filepath = required_str(settings, "filepath")?;
    let render_output = required_str(settings, "render_output")?;
    let frame_start = required_i64(settings, "frame_start")?;
    let frame_end = required_i64(settings, "frame_end")?;
    let codec = optional_str(settings, "codec").unwrap_or("FLAC");
    let container = optional_str(settings, "container").unwrap_or("FLAC");
    let accuracy = settings.get("accuracy").and_then(Value::as_i64).unwrap_or(128);
    let python_exit_code = settings
        .get("python_exit_code")
        .and_then(Value::as_i64)
        .unwrap_or(DEFAULT_PYTHON_EXIT_CODE);

    let mut argv = shlex::split(blender_cmd)
        .ok_or_else(|| CommandError::Validation("blender_cmd is not valid shell syntax".into()))?;
    if argv.is_empty() {
        return Err(CommandError::Validation("blender_cmd must not be empty".into()));
    }
    let exe = argv.remove(0);

    let script = mixdown_script(frame_start, frame_end, render_output, codec, container, accuracy);

    argv.push("--enable-autoexec".into());
    argv.push("-noaudio".into());
    argv.push("--background".into());
    argv.push(filepath.into());
    argv.push("--python-exit-code".into());
    argv.push(python_exit_code.to_string());
    argv.push("--python-expr".into());
    argv.push(script);

    Ok((exe, argv))
}

fn mixdown_script(
    frame_start: i64,
    frame_end: i64,
    render_output: &str,
    codec: &str,
    container: &str,
    accuracy: i64,
) -> String {
    format!(
        "import bpy\n\
         bpy.context.scene.frame_start = {frame_start}\n\
         bpy.context.scene.frame_end = {frame_end}\n\
         bpy.ops.sound.mixdown(filepath='{render_output}', codec='{codec}', container='{container}', accuracy={accuracy})\n\
         bpy.ops.wm.quit_blender()"
    )
}


#[cfg(test)]
#[path = "blender_render_audio_tests.rs"]
mod argv_tests;
