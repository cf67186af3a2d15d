//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML and carries all
//! sub-configs for the server, the pipeline, media composition, external
//! tools and each remote provider. Every section defaults sensibly so a
//! completely empty file is valid.
//!
//! Credential fields may reference environment variables (`"$REDDIT_PASSWORD"`
//! or `"${YOUTUBE_REFRESH_TOKEN}"`); they are resolved with [`expand_secret`]
//! when the providers are built, never when the file is parsed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::artifact::Stage;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub composition: CompositionConfig,
    pub tools: ToolsConfig,
    pub reddit: RedditConfig,
    pub speech: SpeechConfig,
    pub transcription: TranscriptionConfig,
    pub youtube: YoutubeConfig,
}

impl Config {
    /// Deserialize and check a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))?;
        config.check()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    fn check(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Validation("server.port cannot be 0".into()));
        }
        if self.composition.window_secs == 0 {
            return Err(Error::Validation(
                "composition.window_secs must be positive".into(),
            ));
        }
        if self.composition.width == 0 || self.composition.height == 0 {
            return Err(Error::Validation(
                "composition width and height must be positive".into(),
            ));
        }
        if let Some(d) = self.pipeline.background.usable_duration_secs {
            if !d.is_finite() || d < self.composition.window_secs as f64 {
                return Err(Error::Validation(format!(
                    "pipeline.background.usable_duration_secs ({d}) is shorter than composition.window_secs ({})",
                    self.composition.window_secs
                )));
            }
        }
        if self.transcription.poll_interval_ms == 0 {
            return Err(Error::Validation(
                "transcription.poll_interval_ms must be positive".into(),
            ));
        }
        for stage in Stage::ALL {
            if self.pipeline.timeouts.for_stage(stage).is_zero() {
                return Err(Error::Validation(format!(
                    "pipeline.timeouts.{stage}_secs must be positive"
                )));
            }
        }
        Ok(())
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.pipeline.background.path.exists() {
            warnings.push(format!(
                "pipeline.background.path {} does not exist",
                self.pipeline.background.path.display()
            ));
        }

        let reddit = &self.reddit;
        for (field, value) in [
            ("reddit.client_id", &reddit.client_id),
            ("reddit.client_secret", &reddit.client_secret),
            ("reddit.username", &reddit.username),
            ("reddit.password", &reddit.password),
            ("speech.api_key", &self.speech.api_key),
            ("transcription.api_key", &self.transcription.api_key),
            ("youtube.client_id", &self.youtube.client_id),
            ("youtube.client_secret", &self.youtube.client_secret),
            ("youtube.refresh_token", &self.youtube.refresh_token),
        ] {
            if value.is_empty() {
                warnings.push(format!("{field} is empty"));
            }
        }

        if self.reddit.limit == 0 {
            warnings.push("reddit.limit is 0; every fetch will come back empty".into());
        }

        let valid_privacy = ["public", "unlisted", "private"];
        if !valid_privacy.contains(&self.youtube.privacy_status.as_str()) {
            warnings.push(format!(
                "youtube.privacy_status '{}' is not recognized (valid: {})",
                self.youtube.privacy_status,
                valid_privacy.join(", ")
            ));
        }

        warnings
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Validation(format!("failed to read config file {}: {e}", path.display()))
    })?;
    Config::from_toml(&content)
}

/// Load config from an explicit path, else from the default locations, else
/// return the default config.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./reelforge.toml",
        "./config.toml",
        "~/.config/reelforge/config.toml",
        "/etc/reelforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::info!("Loading config from {}", path.display());
            return load_config(path);
        }
    }

    tracing::info!("No config file found; using defaults");
    Ok(Config::default())
}

/// Resolve `$VAR` / `${VAR}` references in a credential value.
pub fn expand_secret(value: &str) -> Result<String> {
    shellexpand::env(value)
        .map(|s| s.into_owned())
        .map_err(|e| Error::Validation(format!("cannot resolve {}: {}", e.var_name, e.cause)))
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP trigger server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// When set, `/process_video` requires `Authorization: Bearer <api_key>`.
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            api_key: None,
        }
    }
}

/// Settings handed to the orchestrator at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory every artifact is written to.
    pub output_dir: PathBuf,
    pub background: BackgroundConfig,
    pub timeouts: StageTimeouts,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated"),
            background: BackgroundConfig::default(),
            timeouts: StageTimeouts::default(),
        }
    }
}

/// The background clip speech is laid over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub path: PathBuf,
    /// Usable length of the clip in seconds. Probed with ffprobe when unset.
    pub usable_duration_secs: Option<f64>,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("minecraft.mp4"),
            usable_duration_secs: None,
        }
    }
}

/// Per-stage time limits, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTimeouts {
    pub fetch_secs: u64,
    pub synthesize_secs: u64,
    pub compose_secs: u64,
    pub transcribe_secs: u64,
    pub caption_secs: u64,
    pub publish_secs: u64,
}

impl StageTimeouts {
    /// Time limit for `stage`.
    pub fn for_stage(&self, stage: Stage) -> Duration {
        let secs = match stage {
            Stage::Fetch => self.fetch_secs,
            Stage::Synthesize => self.synthesize_secs,
            Stage::Compose => self.compose_secs,
            Stage::Transcribe => self.transcribe_secs,
            Stage::Caption => self.caption_secs,
            Stage::Publish => self.publish_secs,
        };
        Duration::from_secs(secs)
    }
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            fetch_secs: 30,
            synthesize_secs: 120,
            compose_secs: 600,
            transcribe_secs: 1200,
            caption_secs: 600,
            publish_secs: 1200,
        }
    }
}

/// Output shape of the composed short.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Length of the extracted background window, in seconds.
    pub window_secs: u32,
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub audio_codec: String,
}

impl CompositionConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(u64::from(self.window_secs))
    }
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            window_secs: 58,
            width: 1080,
            height: 1920,
            video_codec: "libx264".into(),
            audio_codec: "aac".into(),
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Reddit content source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub subreddit: String,
    /// Number of newest posts to inspect per fetch.
    pub limit: u32,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    pub auth_url: String,
    pub api_url: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            subreddit: "AmItheAsshole".into(),
            limit: 1,
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: concat!("reelforge/", env!("CARGO_PKG_VERSION")).into(),
            auth_url: "https://www.reddit.com".into(),
            api_url: "https://oauth.reddit.com".into(),
        }
    }
}

/// Google Cloud Text-to-Speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub api_key: String,
    pub language_code: String,
    /// SSML gender: NEUTRAL, MALE or FEMALE.
    pub voice_gender: String,
    /// Specific voice name (e.g. "en-US-Neural2-D"); provider default when unset.
    pub voice_name: Option<String>,
    pub base_url: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language_code: "en-US".into(),
            voice_gender: "NEUTRAL".into(),
            voice_name: None,
            base_url: "https://texttospeech.googleapis.com".into(),
        }
    }
}

/// AssemblyAI transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub api_key: String,
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub chars_per_caption: u32,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.assemblyai.com".into(),
            poll_interval_ms: 3000,
            chars_per_caption: 32,
        }
    }
}

/// YouTube Data API publishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_url: String,
    pub upload_url: String,
    pub category_id: String,
    pub privacy_status: String,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            token_url: "https://oauth2.googleapis.com/token".into(),
            upload_url: "https://www.googleapis.com/upload/youtube/v3/videos".into(),
            category_id: "22".into(),
            privacy_status: "public".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.pipeline.output_dir, PathBuf::from("generated"));
        assert_eq!(cfg.pipeline.background.path, PathBuf::from("minecraft.mp4"));
        assert_eq!(cfg.composition.window_secs, 58);
        assert_eq!((cfg.composition.width, cfg.composition.height), (1080, 1920));
        assert_eq!(cfg.reddit.subreddit, "AmItheAsshole");
        assert_eq!(cfg.youtube.category_id, "22");
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.composition.video_codec, "libx264");
    }

    #[test]
    fn parse_nested_sections() {
        let toml = r#"
            [server]
            port = 9090

            [pipeline]
            output_dir = "/srv/shorts"

            [pipeline.background]
            path = "/srv/bg/parkour.mp4"
            usable_duration_secs = 538.0

            [pipeline.timeouts]
            compose_secs = 42
        "#;
        let cfg = Config::from_toml(toml).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.pipeline.output_dir, PathBuf::from("/srv/shorts"));
        assert_eq!(cfg.pipeline.background.usable_duration_secs, Some(538.0));
        assert_eq!(
            cfg.pipeline.timeouts.for_stage(Stage::Compose),
            Duration::from_secs(42)
        );
        // Untouched timeouts keep their defaults.
        assert_eq!(
            cfg.pipeline.timeouts.for_stage(Stage::Fetch),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn port_zero_is_rejected() {
        let err = Config::from_toml("[server]\nport = 0").unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn background_shorter_than_window_is_rejected() {
        let toml = "[pipeline.background]\nusable_duration_secs = 10.0";
        let err = Config::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("usable_duration_secs"));
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(Config::from_toml("[composition]\nwindow_secs = 0").is_err());
    }

    #[test]
    fn zero_stage_timeout_is_rejected() {
        let err = Config::from_toml("[pipeline.timeouts]\ntranscribe_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("pipeline.timeouts.transcribe_secs"));
    }

    #[test]
    fn partial_timeouts_keep_defaults() {
        let cfg = Config::from_toml("[pipeline.timeouts]\nfetch_secs = 5\n").unwrap();
        assert_eq!(cfg.pipeline.timeouts.for_stage(Stage::Fetch), Duration::from_secs(5));
        assert_eq!(
            cfg.pipeline.timeouts.for_stage(Stage::Publish),
            Duration::from_secs(1200)
        );
    }

    #[test]
    fn default_config_warns_about_credentials() {
        let warnings = Config::default().validate();
        assert!(warnings.iter().any(|w| w.contains("reddit.client_id")));
        assert!(warnings.iter().any(|w| w.contains("youtube.refresh_token")));
    }

    #[test]
    fn unknown_privacy_status_warns() {
        let mut cfg = Config::default();
        cfg.youtube.privacy_status = "secret".into();
        assert!(cfg.validate().iter().any(|w| w.contains("privacy_status")));
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reelforge.toml");
        std::fs::write(&path, "[reddit]\nsubreddit = \"tifu\"\nlimit = 5\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.reddit.subreddit, "tifu");
        assert_eq!(cfg.reddit.limit, 5);
    }

    #[test]
    fn load_config_missing_file_errors() {
        assert!(load_config(Path::new("/nonexistent/reelforge.toml")).is_err());
    }

    #[test]
    fn load_explicit_path_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[server]\nport = 7000\n").unwrap();
        let cfg = load_config_or_default(Some(&path)).unwrap();
        assert_eq!(cfg.server.port, 7000);
    }

    #[test]
    fn expand_secret_passes_literals_through() {
        assert_eq!(expand_secret("plain-value").unwrap(), "plain-value");
    }

    #[test]
    fn expand_secret_reports_missing_variable() {
        let err = expand_secret("$REELFORGE_TEST_SURELY_UNSET_VAR").unwrap_err();
        assert!(err.to_string().contains("REELFORGE_TEST_SURELY_UNSET_VAR"));
    }
}
