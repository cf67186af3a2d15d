//! YouTube Data API publishing.
//!
//! Exchanges a stored refresh token for an access token, then uploads the
//! video through a resumable upload session: one request carrying the
//! metadata opens the session, a second carries the bytes.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use rf_core::config::{expand_secret, YoutubeConfig};
use rf_core::content::{DESCRIPTION_SUFFIX, TITLE_SUFFIX};
use rf_core::{PublishMetadata, PublishReceipt};
use rf_pipeline::Publisher;

use crate::http::{self, TokenCache, TokenResponse};

const SERVICE: &str = "youtube";

/// Longest title the Data API accepts, in characters.
pub const MAX_TITLE_CHARS: usize = 100;
/// Longest description the Data API accepts, in bytes.
pub const MAX_DESCRIPTION_BYTES: usize = 5000;

pub struct YoutubePublisher {
    http: Client,
    config: YoutubeConfig,
    token: TokenCache,
}

impl YoutubePublisher {
    pub fn new(config: &YoutubeConfig) -> rf_core::Result<Self> {
        let mut config = config.clone();
        config.client_id = expand_secret(&config.client_id)?;
        config.client_secret = expand_secret(&config.client_secret)?;
        config.refresh_token = expand_secret(&config.refresh_token)?;
        Ok(Self {
            http: http::build_client(SERVICE, &http::default_user_agent())?,
            config,
            token: TokenCache::default(),
        })
    }

    async fn access_token(&self) -> rf_core::Result<String> {
        if let Some(token) = self.token.get() {
            return Ok(token);
        }

        let resp = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(http::transport(SERVICE))?;

        let token: TokenResponse = http::check(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(http::decode(SERVICE))?;
        self.token.store(&token);
        Ok(token.access_token)
    }

    /// Open a resumable upload session and return its URL.
    async fn start_session(
        &self,
        token: &str,
        metadata: &PublishMetadata,
        length: usize,
    ) -> rf_core::Result<String> {
        let title = fit_title(&metadata.title);
        let description = fit_description(&metadata.description);
        let body = VideoResource {
            snippet: Snippet {
                title: &title,
                description: &description,
                category_id: &self.config.category_id,
            },
            status: Status {
                privacy_status: &self.config.privacy_status,
                self_declared_made_for_kids: false,
            },
        };

        let resp = self
            .http
            .post(&self.config.upload_url)
            .bearer_auth(token)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .header("X-Upload-Content-Type", "video/*")
            .header("X-Upload-Content-Length", length.to_string())
            .json(&body)
            .send()
            .await
            .map_err(http::transport(SERVICE))?;

        let resp = http::check(SERVICE, resp).await?;
        resp.headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| rf_core::Error::remote(SERVICE, "upload session has no Location header"))
    }
}

impl std::fmt::Debug for YoutubePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubePublisher")
            .field("category_id", &self.config.category_id)
            .field("privacy_status", &self.config.privacy_status)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Publisher for YoutubePublisher {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn publish(
        &self,
        video: &Path,
        metadata: &PublishMetadata,
    ) -> rf_core::Result<PublishReceipt> {
        let bytes = tokio::fs::read(video).await?;
        let token = self.access_token().await?;
        let session = self.start_session(&token, metadata, bytes.len()).await?;
        tracing::debug!("Uploading {} bytes", bytes.len());

        let resp = self
            .http
            .put(&session)
            .bearer_auth(&token)
            .header("Content-Type", "video/*")
            .body(bytes)
            .send()
            .await
            .map_err(http::transport(SERVICE))?;

        let uploaded: UploadedVideo = http::check(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(http::decode(SERVICE))?;

        tracing::info!(video_id = %uploaded.id, title = %metadata.title, "Published");
        Ok(PublishReceipt {
            url: Some(shorts_url(&uploaded.id)),
            video_id: uploaded.id,
        })
    }
}

/// Clamp a title to [`MAX_TITLE_CHARS`]. A trailing [`TITLE_SUFFIX`] is
/// kept and the text before it shortened.
pub(crate) fn fit_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    match title.strip_suffix(TITLE_SUFFIX) {
        Some(text) => {
            let budget = MAX_TITLE_CHARS - TITLE_SUFFIX.chars().count();
            format!("{}{TITLE_SUFFIX}", truncate_chars(text, budget))
        }
        None => truncate_chars(title, MAX_TITLE_CHARS).to_string(),
    }
}

/// Clamp a description to [`MAX_DESCRIPTION_BYTES`], keeping a trailing
/// [`DESCRIPTION_SUFFIX`].
pub(crate) fn fit_description(description: &str) -> String {
    if description.len() <= MAX_DESCRIPTION_BYTES {
        return description.to_string();
    }
    match description.strip_suffix(DESCRIPTION_SUFFIX) {
        Some(text) => {
            let budget = MAX_DESCRIPTION_BYTES - DESCRIPTION_SUFFIX.len();
            format!("{}{DESCRIPTION_SUFFIX}", truncate_bytes(text, budget))
        }
        None => truncate_bytes(description, MAX_DESCRIPTION_BYTES).to_string(),
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end(),
        None => s,
    }
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].trim_end()
}

pub(crate) fn shorts_url(video_id: &str) -> String {
    format!("https://youtube.com/shorts/{video_id}")
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct VideoResource<'a> {
    snippet: Snippet<'a>,
    status: Status<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet<'a> {
    title: &'a str,
    description: &'a str,
    category_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    privacy_status: &'a str,
    self_declared_made_for_kids: bool,
}

#[derive(Deserialize)]
struct UploadedVideo {
    id: String,
}
