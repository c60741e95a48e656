// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives one task's commands end to end, enqueuing status and progress
//! updates as it goes.

use crate::drainer::Drainer;
use fw_core::{update_path, Task, TaskStatus, TaskUpdate, WorkerId};
use fw_runner::{CommandContext, CommandError, CommandRegistry, Reporter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Completed,
    Failed { reason: String },
    Canceled,
}

pub struct TaskRunner {
    registry: CommandRegistry,
    drainer: Arc<Drainer>,
    worker_id: WorkerId,
}

impl TaskRunner {
    pub fn new(registry: CommandRegistry, drainer: Arc<Drainer>, worker_id: WorkerId) -> Self {
        Self {
            registry,
            drainer,
            worker_id,
        }
    }

    /// Run every command in `task` in order, aborting early if `cancel`
    /// fires. Returns the task's terminal outcome; the caller (the worker
    /// state machine) is responsible for acting on it (e.g. sleeping).
    #[instrument(skip(self, task, scratch_dir, cancel), fields(task_id = %task.task_id))]
    pub async fn run(&self, task: &Task, scratch_dir: PathBuf, cancel: CancellationToken) -> TaskOutcome {
        let path = update_path(&task.task_id);

        self.enqueue(&path, TaskUpdate::new(self.worker_id.clone())
            .with_status(TaskStatus::Active)
            .with_activity(format!("started task {}", task.task_id)))
            .await;

        let total = task.commands.len().max(1) as f32;

        for (idx, command) in task.commands.iter().enumerate() {
            if cancel.is_cancelled() {
                self.enqueue(&path, TaskUpdate::new(self.worker_id.clone()).with_status(TaskStatus::Canceled))
                    .await;
                return TaskOutcome::Canceled;
            }

            self.enqueue(&path, TaskUpdate::new(self.worker_id.clone()).with_activity(command.name.clone()))
                .await;

            let handler = match self.registry.get(&command.name) {
                Ok(handler) => Arc::clone(handler),
                Err(_) => {
                    let reason = format!("unknown command {:?}", command.name);
                    self.enqueue(
                        &path,
                        TaskUpdate::new(self.worker_id.clone())
                            .with_status(TaskStatus::Failed)
                            .with_activity(reason.clone()),
                    )
                    .await;
                    return TaskOutcome::Failed { reason };
                }
            };

            if let Err(e) = handler.validate(&command.settings) {
                let reason = "bad command settings".to_string();
                self.enqueue(
                    &path,
                    TaskUpdate::new(self.worker_id.clone())
                        .with_status(TaskStatus::Failed)
                        .with_activity(reason.clone())
                        .with_log(e.to_string()),
                )
                .await;
                return TaskOutcome::Failed { reason };
            }

            let ctx = CommandContext::new(task.task_id.clone(), scratch_dir.clone(), cancel.clone());
            let result = self.execute_with_progress(&path, &*handler, &ctx, &command.settings, idx, total).await;

            match result {
                Ok(()) => continue,
                Err(e) if e.is_cancellation() => {
                    self.enqueue(&path, TaskUpdate::new(self.worker_id.clone()).with_status(TaskStatus::Canceled))
                        .await;
                    return TaskOutcome::Canceled;
                }
                Err(e) => {
                    let reason = e.to_string();
                    self.enqueue(
                        &path,
                        TaskUpdate::new(self.worker_id.clone())
                            .with_status(TaskStatus::Failed)
                            .with_activity(reason.clone()),
                    )
                    .await;
                    return TaskOutcome::Failed { reason };
                }
            }
        }

        self.enqueue(
            &path,
            TaskUpdate::new(self.worker_id.clone())
                .with_status(TaskStatus::Completed)
                .with_activity("finished"),
        )
        .await;
        TaskOutcome::Completed
    }

    async fn execute_with_progress(
        &self,
        path: &str,
        handler: &dyn fw_runner::CommandHandler,
        ctx: &CommandContext,
        settings: &serde_json::Map<String, serde_json::Value>,
        command_index: usize,
        total_commands: f32,
    ) -> Result<(), CommandError> {
        let (reporter, mut rx) = Reporter::channel();
        let drainer = Arc::clone(&self.drainer);
        let worker_id = self.worker_id.clone();
        let path = path.to_string();

        let pump = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let mut update = TaskUpdate::new(worker_id.clone());
                if let Some(log) = event.log {
                    update = update.with_log(log);
                }
                if let Some(pct) = event.command_progress_percentage {
                    let task_pct = (command_index as f32 + pct) / total_commands;
                    update = update.with_command_progress(pct).with_task_progress(task_pct);
                }
                let _ = drainer.enqueue(path.as_str(), &update).await;
            }
        });

        let result = handler.execute(ctx, settings, &reporter).await;
        drop(reporter);
        let _ = pump.await;
        result
    }

    async fn enqueue(&self, path: &str, update: TaskUpdate) {
        if let Err(e) = self.drainer.enqueue(path, &update).await {
            tracing::error!("failed to enqueue task update: {e}");
        }
    }
}

#[cfg(test)]
#[path = "task_runner_tests.rs"]
mod tests;
