//! Per-stage failure taxonomy.

use std::time::Duration;

use rf_core::{RunId, Stage};

/// Why a run stopped.
///
/// Collaborator failures carry the underlying [`rf_core::Error`]; timeouts
/// and cancellation record the stage that was in flight.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("content unavailable: {0}")]
    ContentUnavailable(rf_core::Error),

    #[error("speech synthesis failed: {0}")]
    Synthesis(rf_core::Error),

    #[error("video composition failed: {0}")]
    Composition(rf_core::Error),

    #[error("transcription failed: {0}")]
    Transcription(rf_core::Error),

    #[error("captioning failed: {0}")]
    Captioning(rf_core::Error),

    #[error("publishing failed: {0}")]
    Publish(rf_core::Error),

    #[error("{stage} stage timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },

    #[error("{stage} stage cancelled")]
    Cancelled { stage: Stage },
}

impl PipelineError {
    /// Wrap a collaborator error in the variant for `stage`.
    pub fn failed(stage: Stage, cause: rf_core::Error) -> Self {
        match stage {
            Stage::Fetch => PipelineError::ContentUnavailable(cause),
            Stage::Synthesize => PipelineError::Synthesis(cause),
            Stage::Compose => PipelineError::Composition(cause),
            Stage::Transcribe => PipelineError::Transcription(cause),
            Stage::Caption => PipelineError::Captioning(cause),
            Stage::Publish => PipelineError::Publish(cause),
        }
    }

    /// The stage the run stopped in.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::ContentUnavailable(_) => Stage::Fetch,
            PipelineError::Synthesis(_) => Stage::Synthesize,
            PipelineError::Composition(_) => Stage::Compose,
            PipelineError::Transcription(_) => Stage::Transcribe,
            PipelineError::Captioning(_) => Stage::Caption,
            PipelineError::Publish(_) => Stage::Publish,
            PipelineError::Timeout { stage, .. } | PipelineError::Cancelled { stage } => *stage,
        }
    }

    /// The collaborator error, if the stage itself failed.
    pub fn cause(&self) -> Option<&rf_core::Error> {
        match self {
            PipelineError::ContentUnavailable(e)
            | PipelineError::Synthesis(e)
            | PipelineError::Composition(e)
            | PipelineError::Transcription(e)
            | PipelineError::Captioning(e)
            | PipelineError::Publish(e) => Some(e),
            PipelineError::Timeout { .. } | PipelineError::Cancelled { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PipelineError::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled { .. })
    }
}

/// Failure half of a [`PipelineResult`](crate::PipelineResult).
#[derive(Debug, thiserror::Error)]
#[error("run {run_id} failed: {error}")]
pub struct RunFailure {
    pub run_id: RunId,
    pub error: PipelineError,
}

impl RunFailure {
    pub fn stage(&self) -> Stage {
        self.error.stage()
    }
}
