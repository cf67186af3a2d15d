use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use rf_av::{choose_start_offset, probe_duration, ComposeJob, OffsetSampler, ToolRegistry};
use rf_core::config::{BackgroundConfig, CompositionConfig};

use crate::stage::VideoComposer;

/// Cuts a random window out of the background clip and lays the narration
/// over it.
pub struct FfmpegComposer {
    ffmpeg: PathBuf,
    ffprobe: Option<PathBuf>,
    settings: CompositionConfig,
    sampler: Arc<dyn OffsetSampler>,
    /// Probed lengths, by background path.
    probed: Mutex<HashMap<PathBuf, Duration>>,
    command_timeout: Duration,
}

impl FfmpegComposer {
    /// Build from discovered tools. ffmpeg is required; ffprobe only when the
    /// background duration is not configured.
    pub fn new(
        tools: &ToolRegistry,
        settings: CompositionConfig,
        sampler: Arc<dyn OffsetSampler>,
        command_timeout: Duration,
    ) -> rf_core::Result<Self> {
        Ok(Self {
            ffmpeg: tools.require("ffmpeg")?.to_path_buf(),
            ffprobe: tools.require("ffprobe").ok().map(Path::to_path_buf),
            settings,
            sampler,
            probed: Mutex::new(HashMap::new()),
            command_timeout,
        })
    }

    /// Usable length of the background clip.
    async fn background_duration(&self, background: &BackgroundConfig) -> rf_core::Result<Duration> {
        if let Some(secs) = background.usable_duration_secs {
            return Duration::try_from_secs_f64(secs).map_err(|e| {
                rf_core::Error::Validation(format!("invalid background duration {secs}: {e}"))
            });
        }

        // Held across the probe so concurrent runs probe a clip once.
        let mut probed = self.probed.lock().await;
        if let Some(duration) = probed.get(&background.path) {
            return Ok(*duration);
        }

        let ffprobe = self.ffprobe.as_deref().ok_or_else(|| {
            rf_core::Error::tool(
                "ffprobe",
                "ffprobe not found and pipeline.background.usable_duration_secs is unset",
            )
        })?;
        let duration = probe_duration(ffprobe, &background.path).await?;
        tracing::info!(
            "Background {} is {:?} long",
            background.path.display(),
            duration
        );
        probed.insert(background.path.clone(), duration);
        Ok(duration)
    }
}

impl std::fmt::Debug for FfmpegComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegComposer")
            .field("ffmpeg", &self.ffmpeg)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VideoComposer for FfmpegComposer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn compose(
        &self,
        audio: &Path,
        background: &BackgroundConfig,
        dest: &Path,
    ) -> rf_core::Result<PathBuf> {
        let source = self.background_duration(background).await?;
        let start = choose_start_offset(self.sampler.as_ref(), source, self.settings.window())?;

        ComposeJob::new(&background.path, audio, dest, start, &self.settings)
            .run(&self.ffmpeg, self.command_timeout)
            .await?;
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_av::RandomOffset;

    fn registry(with_ffprobe: bool) -> ToolRegistry {
        let mut paths = vec![(
            "ffmpeg".to_string(),
            PathBuf::from("/nonexistent/bin/ffmpeg"),
        )];
        if with_ffprobe {
            paths.push((
                "ffprobe".to_string(),
                PathBuf::from("/nonexistent/bin/ffprobe"),
            ));
        }
        ToolRegistry::with_paths(paths)
    }

    fn composer(with_ffprobe: bool) -> FfmpegComposer {
        FfmpegComposer::new(
            &registry(with_ffprobe),
            CompositionConfig::default(),
            Arc::new(RandomOffset::seeded(3)),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn background(secs: Option<f64>) -> BackgroundConfig {
        BackgroundConfig {
            path: PathBuf::from("/nonexistent/minecraft.mp4"),
            usable_duration_secs: secs,
        }
    }

    #[test]
    fn ffmpeg_is_required() {
        let err = FfmpegComposer::new(
            &ToolRegistry::default(),
            CompositionConfig::default(),
            Arc::new(RandomOffset::seeded(1)),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, rf_core::Error::Tool { .. }));
    }

    #[tokio::test]
    async fn configured_duration_skips_probing() {
        let c = composer(false);
        let d = c.background_duration(&background(Some(538.0))).await.unwrap();
        assert_eq!(d, Duration::from_secs(538));
    }

    #[tokio::test]
    async fn missing_ffprobe_without_configured_duration_fails() {
        let c = composer(false);
        let err = c.background_duration(&background(None)).await.unwrap_err();
        assert!(err.to_string().contains("usable_duration_secs"));
    }

    #[tokio::test]
    async fn probed_duration_is_cached_per_background() {
        let c = composer(false);
        c.probed
            .lock()
            .await
            .insert(PathBuf::from("/nonexistent/minecraft.mp4"), Duration::from_secs(600));

        let d = c.background_duration(&background(None)).await.unwrap();
        assert_eq!(d, Duration::from_secs(600));

        // A different clip is not served from the first clip's entry.
        let other = BackgroundConfig {
            path: PathBuf::from("/nonexistent/parkour.mp4"),
            usable_duration_secs: None,
        };
        let err = c.background_duration(&other).await.unwrap_err();
        assert!(matches!(err, rf_core::Error::Tool { .. }));
    }

    #[tokio::test]
    async fn background_shorter_than_window_fails_before_ffmpeg() {
        let c = composer(true);
        let err = c
            .compose(
                Path::new("speech.mp3"),
                &background(Some(10.0)),
                Path::new("out.mp4"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, rf_core::Error::Validation(_)));
    }

    #[tokio::test]
    async fn ffmpeg_spawn_failure_surfaces_as_tool_error() {
        let c = composer(true);
        let err = c
            .compose(
                Path::new("speech.mp3"),
                &background(Some(538.0)),
                Path::new("out.mp4"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, rf_core::Error::Tool { .. }));
    }
}
