//! The pipeline orchestrator.
//!
//! A run is a linear state machine:
//!
//! ```text
//! Fetch -> Synthesize -> Compose -> Transcribe -> Caption -> Publish
//! ```
//!
//! Every stage call is raced against its configured time limit and the run's
//! cancellation token. The first failure ends the run; artifacts written by
//! earlier stages stay on disk.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use rf_core::config::PipelineConfig;
use rf_core::{Artifact, ArtifactNamer, ContentItem, PublishMetadata, PublishReceipt, RunId, Stage};

use crate::error::{PipelineError, RunFailure};
use crate::stage::{
    CaptionBurner, Publisher, SourceFetcher, SpeechSynthesizer, Transcriber, VideoComposer,
};

/// Terminal outcome of one run. There is no partial success.
pub type PipelineResult = Result<RunReport, RunFailure>;

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub content: ContentItem,
    /// Files written, in stage order.
    pub artifacts: Vec<Artifact>,
    pub receipt: PublishReceipt,
}

impl RunReport {
    /// The artifact `stage` produced, if any.
    pub fn artifact(&self, stage: Stage) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.stage == stage)
    }
}

/// The six collaborators a run drives.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn SourceFetcher>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub composer: Arc<dyn VideoComposer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub captioner: Arc<dyn CaptionBurner>,
    pub publisher: Arc<dyn Publisher>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("fetcher", &self.fetcher.name())
            .field("synthesizer", &self.synthesizer.name())
            .field("composer", &self.composer.name())
            .field("transcriber", &self.transcriber.name())
            .field("captioner", &self.captioner.name())
            .field("publisher", &self.publisher.name())
            .finish()
    }
}

/// Drives runs. Holds no per-run state, so one instance serves any number
/// of concurrent runs.
#[derive(Debug)]
pub struct Orchestrator {
    config: PipelineConfig,
    namer: ArtifactNamer,
    stages: Collaborators,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig, stages: Collaborators) -> Self {
        let namer = ArtifactNamer::new(config.output_dir.clone());
        Self {
            config,
            namer,
            stages,
        }
    }

    pub fn namer(&self) -> &ArtifactNamer {
        &self.namer
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Start a run under a fresh [`RunId`] and wait for its outcome.
    pub async fn run(&self, cancel: CancellationToken) -> PipelineResult {
        let run_id = self.namer.new_run_id();
        self.run_as(run_id, cancel).await
    }

    /// Execute a run under a caller-chosen identity.
    pub async fn run_as(&self, run_id: RunId, cancel: CancellationToken) -> PipelineResult {
        let span = tracing::info_span!("run", run_id = %run_id);
        let started = Instant::now();

        let outcome = self.execute(&run_id, &cancel).instrument(span.clone()).await;

        let _enter = span.enter();
        match outcome {
            Ok(report) => {
                tracing::info!(
                    video_id = %report.receipt.video_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Run completed"
                );
                Ok(report)
            }
            Err(error) => {
                tracing::error!(
                    stage = %error.stage(),
                    error = %error,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Run failed"
                );
                Err(RunFailure { run_id, error })
            }
        }
    }

    async fn execute(
        &self,
        run_id: &RunId,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let s = &self.stages;
        tracing::info!("Run started");

        let content = self
            .guard(Stage::Fetch, cancel, s.fetcher.fetch())
            .await?
            .ok_or_else(|| {
                PipelineError::ContentUnavailable(rf_core::Error::no_content(s.fetcher.name()))
            })?;
        tracing::info!(title = %content.title, "Fetched content");

        let mut artifacts = Vec::with_capacity(4);

        let dest = self.namer.path_for(run_id, Stage::Synthesize, "mp3");
        let speech = self
            .guard(
                Stage::Synthesize,
                cancel,
                s.synthesizer.synthesize(&content.body, &dest),
            )
            .await?;
        artifacts.push(self.artifact(run_id, Stage::Synthesize, &speech));

        let dest = self.namer.path_for(run_id, Stage::Compose, "mp4");
        let composed = self
            .guard(
                Stage::Compose,
                cancel,
                s.composer.compose(&speech, &self.config.background, &dest),
            )
            .await?;
        artifacts.push(self.artifact(run_id, Stage::Compose, &composed));

        let dest = self.namer.path_for(run_id, Stage::Transcribe, "srt");
        let captions = self
            .guard(
                Stage::Transcribe,
                cancel,
                s.transcriber.transcribe(&composed, &dest),
            )
            .await?;
        artifacts.push(self.artifact(run_id, Stage::Transcribe, &captions));

        let dest = self.namer.path_for(run_id, Stage::Caption, "mp4");
        let final_video = self
            .guard(
                Stage::Caption,
                cancel,
                s.captioner.burn(&composed, &captions, &dest),
            )
            .await?;
        artifacts.push(self.artifact(run_id, Stage::Caption, &final_video));

        let metadata = PublishMetadata::from_content(&content);
        let receipt = self
            .guard(
                Stage::Publish,
                cancel,
                s.publisher.publish(&final_video, &metadata),
            )
            .await?;

        Ok(RunReport {
            run_id: run_id.clone(),
            content,
            artifacts,
            receipt,
        })
    }

    fn artifact(&self, run_id: &RunId, stage: Stage, path: &Path) -> Artifact {
        Artifact::new(run_id.clone(), stage, path.to_path_buf())
    }

    /// Run one stage call under its time limit and the run's cancellation.
    ///
    /// Cancellation is checked first, so an already-cancelled run never
    /// starts another stage. The stage future is dropped on expiry or
    /// cancellation, which kills any child process it spawned.
    async fn guard<T, F>(
        &self,
        stage: Stage,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T, PipelineError>
    where
        F: Future<Output = rf_core::Result<T>>,
    {
        let limit = self.config.timeouts.for_stage(stage);
        let started = Instant::now();
        tracing::info!(stage = %stage, "Stage started");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(stage = %stage, "Stage cancelled");
                return Err(PipelineError::Cancelled { stage });
            }
            outcome = tokio::time::timeout(limit, call) => outcome,
        };

        match outcome {
            Ok(Ok(value)) => {
                tracing::info!(
                    stage = %stage,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Stage finished"
                );
                Ok(value)
            }
            Ok(Err(cause)) => Err(PipelineError::failed(stage, cause)),
            Err(_elapsed) => Err(PipelineError::Timeout {
                stage,
                after: limit,
            }),
        }
    }
}
