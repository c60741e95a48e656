// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and command documents as issued by the Manager.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

crate::define_id! {
    /// Unique identifier for a Manager-dispatched task.
    pub struct TaskId;
}

crate::define_id! {
    /// Unique identifier for the job a task was decomposed from.
    pub struct JobId;
}

/// An ordered step within a task.
///
/// `settings` is opaque to the runner: each command handler validates and
/// interprets its own keys. The runner only ever reads `name` to pick a
/// handler out of the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl Command {
    pub fn new(name: impl Into<String>, settings: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }
}

/// A Manager-issued unit of work, treated as immutable while executing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub job_id: JobId,
    pub job_type: String,
    pub task_type: String,
    pub commands: Vec<Command>,
    /// Opaque optimistic-concurrency token echoed back by the Manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl Task {
    /// Total number of commands, used for task-progress aggregation.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_settings_round_trip() {
        let raw = json!({
            "name": "blender-render",
            "settings": {"frame_start": 1, "frame_end": 47}
        });
        let cmd: Command = serde_json::from_value(raw).unwrap();
        assert_eq!(cmd.name, "blender-render");
        assert_eq!(cmd.settings.get("frame_end").unwrap(), 47);
    }

    #[test]
    fn command_missing_settings_defaults_empty() {
        let raw = json!({"name": "echo"});
        let cmd: Command = serde_json::from_value(raw).unwrap();
        assert!(cmd.settings.is_empty());
    }

    #[test]
    fn task_command_count() {
        let task = Task {
            task_id: TaskId::new("t1"),
            job_id: JobId::new("j1"),
            job_type: "render".into(),
            task_type: "blender-render".into(),
            commands: vec![
                Command::new("move-out-of-way", Map::new()),
                Command::new("blender-render", Map::new()),
            ],
            etag: None,
        };
        assert_eq!(task.command_count(), 2);
    }
}
