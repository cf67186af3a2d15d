//! Application context and collaborator wiring.
//!
//! [`AppContext`] is shared across all route handlers via Axum state. It
//! holds the configuration, the one [`Orchestrator`] every run goes through
//! and the shutdown token runs are cancelled by.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use rf_av::{RandomOffset, ToolRegistry};
use rf_core::config::{expand_secret, Config};
use rf_core::Stage;
use rf_pipeline::{Collaborators, FfmpegCaptionBurner, FfmpegComposer, Orchestrator};
use rf_providers::{AssemblyAiTranscriber, GoogleSpeechSynthesizer, RedditFetcher, YoutubePublisher};

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub orchestrator: Arc<Orchestrator>,
    /// Cancelled on server shutdown; every run gets a child of it.
    pub shutdown: CancellationToken,
    /// Resolved bearer token guarding `/process_video`, if any.
    pub api_key: Option<Arc<str>>,
}

impl AppContext {
    pub fn new(config: Config, orchestrator: Orchestrator) -> rf_core::Result<Self> {
        let api_key = match config.server.api_key.as_deref() {
            Some(raw) => Some(Arc::from(expand_secret(raw)?)),
            None => None,
        };
        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            shutdown: CancellationToken::new(),
            api_key,
        })
    }

    /// Wire the production collaborators described by `config`.
    pub fn from_config(config: Config) -> rf_core::Result<Self> {
        let tools = ToolRegistry::discover(&config.tools);
        let orchestrator = build_orchestrator(&config, &tools)?;
        Self::new(config, orchestrator)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("orchestrator", &self.orchestrator)
            .field("auth", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

/// Build the orchestrator with the Reddit / Google / ffmpeg / AssemblyAI /
/// YouTube collaborators.
pub fn build_orchestrator(config: &Config, tools: &ToolRegistry) -> rf_core::Result<Orchestrator> {
    let timeouts = &config.pipeline.timeouts;

    let collaborators = Collaborators {
        fetcher: Arc::new(RedditFetcher::new(&config.reddit)?),
        synthesizer: Arc::new(GoogleSpeechSynthesizer::new(&config.speech)?),
        composer: Arc::new(FfmpegComposer::new(
            tools,
            config.composition.clone(),
            Arc::new(RandomOffset::new()),
            timeouts.for_stage(Stage::Compose),
        )?),
        transcriber: Arc::new(AssemblyAiTranscriber::new(&config.transcription)?),
        captioner: Arc::new(FfmpegCaptionBurner::new(
            tools,
            timeouts.for_stage(Stage::Caption),
        )?),
        publisher: Arc::new(YoutubePublisher::new(&config.youtube)?),
    };
    tracing::debug!(?collaborators, "Collaborators wired");

    Ok(Orchestrator::new(config.pipeline.clone(), collaborators))
}
