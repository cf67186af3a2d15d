//! Burn a subtitle file into a video with ffmpeg's `subtitles` filter.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::ToolCommand;

/// One ffmpeg invocation rendering captions onto the composed video.
#[derive(Debug, Clone)]
pub struct CaptionJob {
    pub video: PathBuf,
    pub captions: PathBuf,
    pub output: PathBuf,
}

impl CaptionJob {
    pub fn new(video: &Path, captions: &Path, output: &Path) -> Self {
        Self {
            video: video.to_path_buf(),
            captions: captions.to_path_buf(),
            output: output.to_path_buf(),
        }
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "-y".into(),
            "-i".into(),
            self.video.to_string_lossy().into_owned(),
            "-vf".into(),
            format!(
                "subtitles={}",
                escape_filter_path(&self.captions.to_string_lossy())
            ),
            "-c:a".into(),
            "copy".into(),
            self.output.to_string_lossy().into_owned(),
        ]
    }

    pub async fn run(&self, ffmpeg: &Path, limit: Duration) -> rf_core::Result<()> {
        tracing::info!(
            "Burning captions {} into {}",
            self.captions.display(),
            self.output.display()
        );

        let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
        cmd.args(self.args()).timeout(limit);
        cmd.execute().await?;
        Ok(())
    }
}

/// Escape a path for use as a filter option inside an ffmpeg filtergraph.
///
/// Two levels apply: the option value (`\`, `:`, `'`) and then the
/// filtergraph itself (`\`, `'`, `[`, `]`, `,`, `;`).
pub fn escape_filter_path(path: &str) -> String {
    let option = escape_chars(path, &['\\', ':', '\'']);
    escape_chars(&option, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
