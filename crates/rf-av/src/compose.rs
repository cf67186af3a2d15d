//! Compose the short: a window of the background clip with the narration
//! laid over it, rescaled to a vertical frame.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rf_core::config::CompositionConfig;

use crate::command::ToolCommand;

/// One ffmpeg invocation producing the composed (uncaptioned) short.
#[derive(Debug, Clone)]
pub struct ComposeJob {
    pub background: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    /// Where in the background the window starts.
    pub start: Duration,
    pub window: Duration,
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub audio_codec: String,
}

impl ComposeJob {
    pub fn new(
        background: &Path,
        audio: &Path,
        output: &Path,
        start: Duration,
        settings: &CompositionConfig,
    ) -> Self {
        Self {
            background: background.to_path_buf(),
            audio: audio.to_path_buf(),
            output: output.to_path_buf(),
            start,
            window: settings.window(),
            width: settings.width,
            height: settings.height,
            video_codec: settings.video_codec.clone(),
            audio_codec: settings.audio_codec.clone(),
        }
    }

    /// ffmpeg argument list.
    ///
    /// The seek is placed before the background input so ffmpeg jumps
    /// straight to the window instead of decoding from the start.
    pub fn args(&self) -> Vec<String> {
        let window = seconds(self.window);
        vec![
            "-y".into(),
            "-ss".into(),
            seconds(self.start),
            "-t".into(),
            window.clone(),
            "-i".into(),
            self.background.to_string_lossy().into_owned(),
            "-i".into(),
            self.audio.to_string_lossy().into_owned(),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
            "-vf".into(),
            format!("scale={}:{}", self.width, self.height),
            "-c:v".into(),
            self.video_codec.clone(),
            "-c:a".into(),
            self.audio_codec.clone(),
            "-t".into(),
            window,
            self.output.to_string_lossy().into_owned(),
        ]
    }

    /// Run ffmpeg. The caller bounds the overall time; the command itself is
    /// only guarded by `limit`.
    pub async fn run(&self, ffmpeg: &Path, limit: Duration) -> rf_core::Result<()> {
        tracing::info!(
            "Composing {} from {} at {:?} (+{:?})",
            self.output.display(),
            self.background.display(),
            self.start,
            self.window
        );

        let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
        cmd.args(self.args()).timeout(limit);
        cmd.execute().await?;
        Ok(())
    }
}

/// Seconds with millisecond precision, as ffmpeg time syntax.
fn seconds(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64())
}
