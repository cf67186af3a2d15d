//! Collaborator traits, one per pipeline stage.
//!
//! Each trait wraps one external system or tool behind a narrow contract.
//! Implementations write their output to the destination path chosen by the
//! orchestrator and return the path they actually wrote.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use rf_core::config::BackgroundConfig;
use rf_core::{ContentItem, PublishMetadata, PublishReceipt};

/// Produces the text post a run is built from.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Short name used in logs (e.g. "reddit").
    fn name(&self) -> &'static str;

    /// Fetch one content item, or `None` when the source has nothing to offer.
    async fn fetch(&self) -> rf_core::Result<Option<ContentItem>>;
}

/// Turns text into narration audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn synthesize(&self, text: &str, dest: &Path) -> rf_core::Result<PathBuf>;
}

/// Lays narration over a window of the background clip.
#[async_trait]
pub trait VideoComposer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn compose(
        &self,
        audio: &Path,
        background: &BackgroundConfig,
        dest: &Path,
    ) -> rf_core::Result<PathBuf>;
}

/// Produces an SRT caption track for a video.
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &'static str;

    async fn transcribe(&self, video: &Path, dest: &Path) -> rf_core::Result<PathBuf>;
}

/// Renders a caption track into a video.
#[async_trait]
pub trait CaptionBurner: Send + Sync {
    fn name(&self) -> &'static str;

    async fn burn(&self, video: &Path, captions: &Path, dest: &Path) -> rf_core::Result<PathBuf>;
}

/// Uploads the finished short.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn publish(
        &self,
        video: &Path,
        metadata: &PublishMetadata,
    ) -> rf_core::Result<PublishReceipt>;
}
