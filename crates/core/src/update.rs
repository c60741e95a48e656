// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Partial task-state patches pushed to the Manager.

use crate::task::TaskId;
use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};

/// Terminal (and active) task status values carried by a [`TaskUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Completed,
    Failed,
    Canceled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Active)
    }
}

/// A partial patch of task state, queued for delivery to the Manager.
///
/// Only fields that are `Some` are meaningful; absent fields are omitted
/// from the serialized form so a single update can carry just an activity
/// string, just a log line, or a full status transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_progress_percentage: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_progress_percentage: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    pub worker_id: WorkerId,
}

impl TaskUpdate {
    pub fn new(worker_id: WorkerId) -> Self {
        Self {
            worker_id,
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.task_status = Some(status);
        self
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }

    pub fn with_command_progress(mut self, pct: f32) -> Self {
        self.command_progress_percentage = Some(pct);
        self
    }

    pub fn with_task_progress(mut self, pct: f32) -> Self {
        self.task_progress_percentage = Some(pct);
        self
    }
}

/// The Manager endpoint path an update should be POSTed to.
pub fn update_path(task_id: &TaskId) -> String {
    format!("/tasks/{}/update", task_id.as_str())
}
