//! Google Cloud Text-to-Speech.
//!
//! The synthesize endpoint caps input at 5000 bytes, so long posts are split
//! at sentence (then word) boundaries and the MP3 segments returned for each
//! chunk are concatenated. MP3 frames are self-delimiting, so the joined file
//! plays as one stream.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use rf_core::config::{expand_secret, SpeechConfig};
use rf_pipeline::SpeechSynthesizer;

use crate::http;

const SERVICE: &str = "google-tts";

/// Bytes of text sent per request, leaving headroom below the API limit.
const MAX_CHUNK_BYTES: usize = 4800;

pub struct GoogleSpeechSynthesizer {
    http: Client,
    config: SpeechConfig,
}

impl GoogleSpeechSynthesizer {
    pub fn new(config: &SpeechConfig) -> rf_core::Result<Self> {
        let mut config = config.clone();
        config.api_key = expand_secret(&config.api_key)?;
        Ok(Self {
            http: http::build_client(SERVICE, &http::default_user_agent())?,
            config,
        })
    }

    async fn synthesize_chunk(&self, text: &str) -> rf_core::Result<Vec<u8>> {
        let request = SynthesizeRequest {
            input: Input { text },
            voice: Voice {
                language_code: &self.config.language_code,
                ssml_gender: &self.config.voice_gender,
                name: self.config.voice_name.as_deref(),
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        let url = http::endpoint(&self.config.base_url, "/v1/text:synthesize");
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(http::transport(SERVICE))?;

        let body: SynthesizeResponse = http::check(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(http::decode(SERVICE))?;

        STANDARD
            .decode(body.audio_content.as_bytes())
            .map_err(|e| rf_core::Error::remote(SERVICE, format!("invalid audioContent: {e}")))
    }
}

impl std::fmt::Debug for GoogleSpeechSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSpeechSynthesizer")
            .field("language_code", &self.config.language_code)
            .field("voice_gender", &self.config.voice_gender)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSpeechSynthesizer {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn synthesize(&self, text: &str, dest: &Path) -> rf_core::Result<PathBuf> {
        let chunks = split_text(text, MAX_CHUNK_BYTES);
        if chunks.is_empty() {
            return Err(rf_core::Error::Validation("nothing to synthesize".into()));
        }

        let mut audio = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            tracing::debug!(chunk = i + 1, of = chunks.len(), bytes = chunk.len(), "Synthesizing");
            audio.extend(self.synthesize_chunk(chunk).await?);
        }

        tokio::fs::write(dest, &audio).await?;
        tracing::info!("Wrote {} bytes of speech to {}", audio.len(), dest.display());
        Ok(dest.to_path_buf())
    }
}

/// Split `text` into chunks of at most `max_bytes`, preferring sentence
/// boundaries, then word boundaries, then character boundaries.
pub(crate) fn split_text(text: &str, max_bytes: usize) -> Vec<String> {
    let pieces = sentences(text).into_iter().flat_map(|sentence| {
        if sentence.len() <= max_bytes {
            vec![sentence.to_string()]
        } else {
            pack(
                sentence
                    .split_whitespace()
                    .flat_map(|word| hard_split(word, max_bytes)),
                max_bytes,
            )
        }
    });
    pack(pieces, max_bytes)
}

/// Greedily join pieces with single spaces without exceeding `max_bytes`.
fn pack(pieces: impl Iterator<Item = String>, max_bytes: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for piece in pieces {
        if !current.is_empty() && current.len() + 1 + piece.len() > max_bytes {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&piece);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at_end = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
        if at_end {
            let end = i + c.len_utf8();
            out.push(text[start..end].trim());
            start = end;
        }
    }
    out.push(text[start..].trim());
    out.retain(|s| !s.is_empty());
    out
}

fn hard_split(word: &str, max_bytes: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        if current.len() + c.len_utf8() > max_bytes {
            parts.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: Input<'a>,
    voice: Voice<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct Input<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Voice<'a> {
    language_code: &'a str,
    ssml_gender: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}
