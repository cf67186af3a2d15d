//! Container duration probing via ffprobe.

use std::path::Path;
use std::time::Duration;

use crate::command::ToolCommand;

/// Return the container duration of `file`.
pub async fn probe_duration(ffprobe: &Path, file: &Path) -> rf_core::Result<Duration> {
    let mut cmd = ToolCommand::new(ffprobe.to_path_buf());
    cmd.args([
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]);
    cmd.arg(file.to_string_lossy().as_ref());
    cmd.timeout(Duration::from_secs(30));

    let output = cmd.execute().await?;
    let duration = parse_duration_output(&output.stdout)?;
    tracing::debug!("Probed {}: {:?}", file.display(), duration);
    Ok(duration)
}

/// Parse the single `duration` value ffprobe prints in `nokey` mode.
pub(crate) fn parse_duration_output(stdout: &str) -> rf_core::Result<Duration> {
    let raw = stdout.trim();
    let secs: f64 = raw
        .parse()
        .map_err(|_| rf_core::Error::tool("ffprobe", format!("unparseable duration {raw:?}")))?;

    if !secs.is_finite() || secs < 0.0 {
        return Err(rf_core::Error::tool(
            "ffprobe",
            format!("invalid duration {secs}"),
        ));
    }

    Ok(Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fractional_seconds() {
        let d = parse_duration_output("538.421333\n").unwrap();
        assert_eq!(d, Duration::from_secs_f64(538.421333));
    }

    #[test]
    fn rejects_na() {
        assert!(parse_duration_output("N/A\n").is_err());
    }

    #[test]
    fn rejects_negative() {
        assert!(parse_duration_output("-1.0").is_err());
    }

    #[tokio::test]
    async fn missing_ffprobe_is_a_tool_error() {
        let result = probe_duration(
            Path::new("/nonexistent/ffprobe"),
            Path::new("background.mp4"),
        )
        .await;
        assert!(matches!(result, Err(rf_core::Error::Tool { .. })));
    }
}
