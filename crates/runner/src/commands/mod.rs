// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod blender_render;
mod blender_render_audio;
mod directory_create;
mod exr_merge;
mod file_copy;
mod json_writes;
mod move_out_of_way;

pub use blender_render::BlenderRenderCommand;
pub use blender_render_audio::BlenderRenderAudioCommand;
pub use directory_create::DirectoryCreateCommand;
pub use exr_merge::ExrMergeCommand;
pub use file_copy::FileCopyCommand;
pub use json_writes::JsonWritesCommand;
pub use move_out_of_way::MoveOutOfWayCommand;
