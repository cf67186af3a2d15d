use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use rf_av::{CaptionJob, ToolRegistry};

use crate::stage::CaptionBurner;

/// Burns an SRT track into the composed video with ffmpeg.
#[derive(Debug)]
pub struct FfmpegCaptionBurner {
    ffmpeg: PathBuf,
    command_timeout: Duration,
}

impl FfmpegCaptionBurner {
    pub fn new(tools: &ToolRegistry, command_timeout: Duration) -> rf_core::Result<Self> {
        Ok(Self {
            ffmpeg: tools.require("ffmpeg")?.to_path_buf(),
            command_timeout,
        })
    }
}

#[async_trait]
impl CaptionBurner for FfmpegCaptionBurner {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn burn(&self, video: &Path, captions: &Path, dest: &Path) -> rf_core::Result<PathBuf> {
        if !tokio::fs::try_exists(captions).await? {
            return Err(rf_core::Error::Validation(format!(
                "caption track {} does not exist",
                captions.display()
            )));
        }

        CaptionJob::new(video, captions, dest)
            .run(&self.ffmpeg, self.command_timeout)
            .await?;
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burner() -> FfmpegCaptionBurner {
        let tools = ToolRegistry::with_paths([(
            "ffmpeg".to_string(),
            PathBuf::from("/nonexistent/bin/ffmpeg"),
        )]);
        FfmpegCaptionBurner::new(&tools, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn ffmpeg_is_required() {
        let err = FfmpegCaptionBurner::new(&ToolRegistry::default(), Duration::from_secs(5))
            .unwrap_err();
        assert!(err.to_string().contains("ffmpeg"));
    }

    #[tokio::test]
    async fn missing_caption_track_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = burner()
            .burn(
                Path::new("video.mp4"),
                &tmp.path().join("missing.srt"),
                &tmp.path().join("out.mp4"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, rf_core::Error::Validation(_)));
    }

    #[tokio::test]
    async fn spawn_failure_is_a_tool_error() {
        let tmp = tempfile::tempdir().unwrap();
        let srt = tmp.path().join("captions.srt");
        std::fs::write(&srt, "1\n00:00:00,000 --> 00:00:01,000\nhi\n").unwrap();
        let err = burner()
            .burn(Path::new("video.mp4"), &srt, &tmp.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, rf_core::Error::Tool { .. }));
    }
}
