//! # rf-av
//!
//! External media tool management for the reelforge pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support; child processes are killed when the future is dropped.
//! - **Probing** ([`probe_duration`]) -- container duration via ffprobe.
//! - **Offset sampling** ([`OffsetSampler`], [`RandomOffset`]) -- picks where
//!   in the background clip the short starts.
//! - **Command builders** ([`ComposeJob`], [`CaptionJob`]) -- ffmpeg argument
//!   lists for composing the short and burning captions into it.

pub mod captions;
pub mod command;
pub mod compose;
pub mod offset;
pub mod probe;
pub mod tools;

// ---- Re-exports for convenience ----

pub use captions::{escape_filter_path, CaptionJob};
pub use command::{ToolCommand, ToolOutput};
pub use compose::ComposeJob;
pub use offset::{choose_start_offset, OffsetSampler, RandomOffset};
pub use probe::probe_duration;
pub use tools::{ToolInfo, ToolRegistry};
