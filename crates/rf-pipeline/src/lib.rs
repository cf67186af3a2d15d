//! # rf-pipeline
//!
//! The reelforge pipeline: six dependent stages driven in a fixed order.
//!
//! This crate provides:
//!
//! - **Stage traits** ([`stage`]) -- one trait per collaborator role
//!   ([`SourceFetcher`], [`SpeechSynthesizer`], [`VideoComposer`],
//!   [`Transcriber`], [`CaptionBurner`], [`Publisher`]).
//! - **[`Orchestrator`]** -- runs Fetch, Synthesize, Compose, Transcribe,
//!   Caption and Publish in order under per-stage timeouts and a
//!   cancellation token, stopping at the first failure.
//! - **[`PipelineError`]** / **[`RunFailure`]** -- per-stage failure taxonomy.
//! - **ffmpeg adapters** ([`adapters`]) -- the composer and caption burner
//!   backed by external tools.

pub mod adapters;
pub mod error;
pub mod orchestrator;
pub mod stage;

pub use adapters::{FfmpegCaptionBurner, FfmpegComposer};
pub use error::{PipelineError, RunFailure};
pub use orchestrator::{Collaborators, Orchestrator, PipelineResult, RunReport};
pub use stage::{
    CaptionBurner, Publisher, SourceFetcher, SpeechSynthesizer, Transcriber, VideoComposer,
};
