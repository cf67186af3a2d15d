//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires an [`AppContext`] around scripted
//! in-memory stages, and [`Stages`], the fake that plays every collaborator.
//! The [`TestHarness::with_server`] constructor starts Axum on a random port
//! for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use rf_core::config::{BackgroundConfig, Config};
use rf_core::{ContentItem, PublishMetadata, PublishReceipt, Stage};
use rf_pipeline::{
    CaptionBurner, Collaborators, Orchestrator, Publisher, SourceFetcher, SpeechSynthesizer,
    Transcriber, VideoComposer,
};
use rf_server::context::AppContext;
use rf_server::router::build_router;

/// Scripted collaborator: writes a small file for every stage, optionally
/// failing or stalling at one of them.
#[derive(Debug, Default)]
pub struct Stages {
    pub fail_at: Option<Stage>,
    pub stall_at: Option<Stage>,
    pub published: AtomicUsize,
}

impl Stages {
    pub fn failing_at(stage: Stage) -> Self {
        Self {
            fail_at: Some(stage),
            ..Self::default()
        }
    }

    pub fn stalling_at(stage: Stage) -> Self {
        Self {
            stall_at: Some(stage),
            ..Self::default()
        }
    }

    async fn step(&self, stage: Stage) -> rf_core::Result<()> {
        if self.stall_at == Some(stage) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.fail_at == Some(stage) {
            return Err(rf_core::Error::remote(stage.as_str(), "scripted failure"));
        }
        Ok(())
    }

    async fn write(&self, stage: Stage, dest: &Path) -> rf_core::Result<PathBuf> {
        self.step(stage).await?;
        tokio::fs::write(dest, stage.as_str()).await?;
        Ok(dest.to_path_buf())
    }
}

#[async_trait]
impl SourceFetcher for Stages {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self) -> rf_core::Result<Option<ContentItem>> {
        self.step(Stage::Fetch).await?;
        Ok(Some(ContentItem::new("AITA for testing?", "A body.")))
    }
}

#[async_trait]
impl SpeechSynthesizer for Stages {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn synthesize(&self, _text: &str, dest: &Path) -> rf_core::Result<PathBuf> {
        self.write(Stage::Synthesize, dest).await
    }
}

#[async_trait]
impl VideoComposer for Stages {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn compose(
        &self,
        _audio: &Path,
        _background: &BackgroundConfig,
        dest: &Path,
    ) -> rf_core::Result<PathBuf> {
        self.write(Stage::Compose, dest).await
    }
}

#[async_trait]
impl Transcriber for Stages {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn transcribe(&self, _video: &Path, dest: &Path) -> rf_core::Result<PathBuf> {
        self.write(Stage::Transcribe, dest).await
    }
}

#[async_trait]
impl CaptionBurner for Stages {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn burn(&self, _video: &Path, _captions: &Path, dest: &Path) -> rf_core::Result<PathBuf> {
        self.write(Stage::Caption, dest).await
    }
}

#[async_trait]
impl Publisher for Stages {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn publish(
        &self,
        _video: &Path,
        _metadata: &PublishMetadata,
    ) -> rf_core::Result<PublishReceipt> {
        self.step(Stage::Publish).await?;
        let n = self.published.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PublishReceipt {
            video_id: format!("vid{n}"),
            url: Some(format!("https://youtube.com/shorts/vid{n}")),
        })
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] whose output
/// directory lives in a temp dir.
pub struct TestHarness {
    pub ctx: AppContext,
    pub stages: Arc<Stages>,
    pub dir: TempDir,
}

impl TestHarness {
    /// Create a harness whose stages all succeed.
    pub fn new() -> Self {
        Self::with_stages(Stages::default(), Config::default())
    }

    /// Create a harness around the given scripted stages and configuration.
    pub fn with_stages(stages: Stages, mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        config.pipeline.output_dir = dir.path().to_path_buf();

        let stages = Arc::new(stages);
        let collaborators = Collaborators {
            fetcher: stages.clone(),
            synthesizer: stages.clone(),
            composer: stages.clone(),
            transcriber: stages.clone(),
            captioner: stages.clone(),
            publisher: stages.clone(),
        };
        let orchestrator = Orchestrator::new(config.pipeline.clone(), collaborators);
        let ctx = AppContext::new(config, orchestrator).expect("failed to build context");

        Self { ctx, stages, dir }
    }

    /// Files currently present in the output directory.
    pub fn output_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.dir.path())
            .expect("failed to read output dir")
            .map(|e| e.expect("bad dir entry").path())
            .collect();
        files.sort();
        files
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    /// Start this harness's router on a random port.
    pub async fn serve(self) -> (Self, SocketAddr) {
        let app = build_router(self.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }
}

/// Read a response body to a JSON value.
pub async fn body_json(body: axum::body::Body) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = body
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is not JSON")
}
