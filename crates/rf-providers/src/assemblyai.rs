//! AssemblyAI transcription.
//!
//! Upload the media, create a transcript job, poll it until it settles and
//! download the result as SRT. Polling has no attempt limit of its own; the
//! stage timeout ends it by dropping the future.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use rf_core::config::{expand_secret, TranscriptionConfig};
use rf_pipeline::Transcriber;

use crate::http;

const SERVICE: &str = "assemblyai";

pub struct AssemblyAiTranscriber {
    http: Client,
    config: TranscriptionConfig,
}

impl AssemblyAiTranscriber {
    pub fn new(config: &TranscriptionConfig) -> rf_core::Result<Self> {
        let mut config = config.clone();
        config.api_key = expand_secret(&config.api_key)?;
        Ok(Self {
            http: http::build_client(SERVICE, &http::default_user_agent())?,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        http::endpoint(&self.config.base_url, path)
    }

    async fn upload(&self, media: &Path) -> rf_core::Result<String> {
        let bytes = tokio::fs::read(media).await?;
        tracing::debug!("Uploading {} ({} bytes)", media.display(), bytes.len());

        let resp = self
            .http
            .post(self.url("/v2/upload"))
            .header("authorization", &self.config.api_key)
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(http::transport(SERVICE))?;

        let uploaded: UploadResponse = http::check(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(http::decode(SERVICE))?;
        Ok(uploaded.upload_url)
    }

    async fn create(&self, audio_url: &str) -> rf_core::Result<Transcript> {
        let resp = self
            .http
            .post(self.url("/v2/transcript"))
            .header("authorization", &self.config.api_key)
            .json(&TranscriptRequest { audio_url })
            .send()
            .await
            .map_err(http::transport(SERVICE))?;

        http::check(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(http::decode(SERVICE))
    }

    async fn status(&self, id: &str) -> rf_core::Result<Transcript> {
        let resp = self
            .http
            .get(self.url(&format!("/v2/transcript/{id}")))
            .header("authorization", &self.config.api_key)
            .send()
            .await
            .map_err(http::transport(SERVICE))?;

        http::check(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(http::decode(SERVICE))
    }

    async fn wait_for(&self, mut transcript: Transcript) -> rf_core::Result<Transcript> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        loop {
            match transcript.status.as_str() {
                "completed" => return Ok(transcript),
                "error" => {
                    return Err(rf_core::Error::remote(
                        SERVICE,
                        format!(
                            "transcript {} failed: {}",
                            transcript.id,
                            transcript.error.as_deref().unwrap_or("no reason given")
                        ),
                    ))
                }
                status => tracing::debug!(id = %transcript.id, status, "Transcript pending"),
            }
            tokio::time::sleep(interval).await;
            transcript = self.status(&transcript.id).await?;
        }
    }

    async fn srt(&self, id: &str) -> rf_core::Result<String> {
        let chars = self.config.chars_per_caption.to_string();
        let resp = self
            .http
            .get(self.url(&format!("/v2/transcript/{id}/srt")))
            .header("authorization", &self.config.api_key)
            .query(&[("chars_per_caption", chars.as_str())])
            .send()
            .await
            .map_err(http::transport(SERVICE))?;

        http::check(SERVICE, resp)
            .await?
            .text()
            .await
            .map_err(http::decode(SERVICE))
    }
}

impl std::fmt::Debug for AssemblyAiTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssemblyAiTranscriber")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn transcribe(&self, video: &Path, dest: &Path) -> rf_core::Result<PathBuf> {
        let audio_url = self.upload(video).await?;
        let created = self.create(&audio_url).await?;
        tracing::info!(id = %created.id, "Transcript requested");

        let done = self.wait_for(created).await?;
        let srt = self.srt(&done.id).await?;
        if srt.trim().is_empty() {
            return Err(rf_core::Error::remote(
                SERVICE,
                format!("transcript {} has no captions", done.id),
            ));
        }

        tokio::fs::write(dest, srt).await?;
        Ok(dest.to_path_buf())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct Transcript {
    id: String,
    status: String,
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SRT: &str = "1\n00:00:00,000 --> 00:00:02,100\nSo yesterday I told\n";

    fn config(server: &MockServer) -> TranscriptionConfig {
        TranscriptionConfig {
            api_key: "aai-key".into(),
            base_url: server.uri(),
            poll_interval_ms: 10,
            ..Default::default()
        }
    }

    async fn mount_upload_and_create(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v2/upload"))
            .and(header("authorization", "aai-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "upload_url": "https://cdn.example/abc"
            })))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/transcript"))
            .and(body_json(json!({ "audio_url": "https://cdn.example/abc" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "t1", "status": "queued" })),
            )
            .mount(server)
            .await;
    }

    fn media() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let video = tmp.path().join("composed.mp4");
        std::fs::write(&video, b"not really a video").unwrap();
        (tmp, video)
    }

    #[tokio::test]
    async fn polls_until_completed_and_writes_srt() {
        let server = MockServer::start().await;
        mount_upload_and_create(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/t1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "t1", "status": "processing" })),
            )
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/t1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "t1", "status": "completed" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/t1/srt"))
            .and(query_param("chars_per_caption", "32"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SRT))
            .mount(&server)
            .await;

        let (tmp, video) = media();
        let dest = tmp.path().join("captions.srt");
        let transcriber = AssemblyAiTranscriber::new(&config(&server)).unwrap();
        let written = transcriber.transcribe(&video, &dest).await.unwrap();

        assert_eq!(written, dest);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), SRT);
    }

    #[tokio::test]
    async fn failed_transcript_is_remote_error() {
        let server = MockServer::start().await;
        mount_upload_and_create(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "t1",
                "status": "error",
                "error": "Audio file could not be decoded"
            })))
            .mount(&server)
            .await;

        let (tmp, video) = media();
        let dest = tmp.path().join("captions.srt");
        let transcriber = AssemblyAiTranscriber::new(&config(&server)).unwrap();
        let err = transcriber.transcribe(&video, &dest).await.unwrap_err();

        assert!(err.to_string().contains("could not be decoded"));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn missing_media_is_io_error() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();
        let transcriber = AssemblyAiTranscriber::new(&config(&server)).unwrap();
        let err = transcriber
            .transcribe(&tmp.path().join("nope.mp4"), &tmp.path().join("c.srt"))
            .await
            .unwrap_err();
        assert!(matches!(err, rf_core::Error::Io { .. }));
    }

    #[tokio::test]
    async fn empty_srt_is_rejected() {
        let server = MockServer::start().await;
        mount_upload_and_create(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/t1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "t1", "status": "completed" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/transcript/t1/srt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("\n"))
            .mount(&server)
            .await;

        let (tmp, video) = media();
        let transcriber = AssemblyAiTranscriber::new(&config(&server)).unwrap();
        let err = transcriber
            .transcribe(&video, &tmp.path().join("c.srt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no captions"));
    }
}
