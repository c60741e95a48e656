// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mapping from command name to handler, populated once at startup.

use crate::commands;
use crate::error::CommandError;
use crate::handler::CommandHandler;
use std::collections::HashMap;
use std::sync::Arc;

/// A flat registry of command handlers, keyed by the command name a task
/// names in its `commands` list (e.g. `"blender-render"`).
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn CommandHandler>, CommandError> {
        self.handlers
            .get(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// The registry populated with every built-in command this worker
    /// ships with.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("file-copy", Arc::new(commands::FileCopyCommand));
        registry.register("directory-create", Arc::new(commands::DirectoryCreateCommand));
        registry.register("move-out-of-way", Arc::new(commands::MoveOutOfWayCommand));
        registry.register("move-out-of-way-multifile", Arc::new(commands::MoveOutOfWayCommand));
        registry.register("json-writes", Arc::new(commands::JsonWritesCommand));
        registry.register("merge-exr", Arc::new(commands::ExrMergeCommand::default()));
        registry.register("blender-render", Arc::new(commands::BlenderRenderCommand));
        registry.register(
            "blender-render-audio",
            Arc::new(commands::BlenderRenderAudioCommand),
        );
        registry
    }
}
