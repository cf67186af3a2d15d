//! Shared HTTP plumbing: client construction, status checking and OAuth
//! token caching.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use reqwest::{Client, Response};
use serde::Deserialize;

/// Per-request timeout. Uploads of a one-minute short fit comfortably; the
/// stage timeout bounds the run as a whole.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Refresh tokens this long before the provider says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Longest error body echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_client(service: &str, user_agent: &str) -> rf_core::Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| rf_core::Error::remote(service, format!("failed to build HTTP client: {e}")))
}

pub(crate) fn default_user_agent() -> String {
    concat!("reelforge/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Map a transport failure to [`rf_core::Error::Remote`].
pub(crate) fn transport(service: &'static str) -> impl Fn(reqwest::Error) -> rf_core::Error {
    move |e| rf_core::Error::remote(service, format!("request failed: {e}"))
}

/// Map a body decoding failure to [`rf_core::Error::Remote`].
pub(crate) fn decode(service: &'static str) -> impl Fn(reqwest::Error) -> rf_core::Error {
    move |e| rf_core::Error::remote(service, format!("unexpected response: {e}"))
}

/// Pass successful responses through; turn anything else into an error that
/// carries the status and the start of the body.
pub(crate) async fn check(service: &'static str, resp: Response) -> rf_core::Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let mut end = body.len().min(MAX_ERROR_BODY);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    Err(rf_core::Error::remote(
        service,
        format!("{status}: {}", body[..end].trim()),
    ))
}

/// `base` joined with `path`, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// OAuth token endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// A bearer token remembered until shortly before it expires.
#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    slot: Mutex<Option<(String, Instant)>>,
}

impl TokenCache {
    pub fn get(&self) -> Option<String> {
        let slot = self.slot.lock();
        match slot.as_ref() {
            Some((token, expires_at)) if Instant::now() + EXPIRY_MARGIN < *expires_at => {
                Some(token.clone())
            }
            _ => None,
        }
    }

    pub fn store(&self, token: &TokenResponse) {
        // Tokens without a lifetime are used for a single run.
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(0));
        *self.slot.lock() = Some((token.access_token.clone(), Instant::now() + lifetime));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(
            endpoint("https://api.example.com/", "/v2/upload"),
            "https://api.example.com/v2/upload"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:1234", "/v2/upload"),
            "http://127.0.0.1:1234/v2/upload"
        );
    }

    #[test]
    fn token_cache_returns_fresh_tokens() {
        let cache = TokenCache::default();
        assert!(cache.get().is_none());
        cache.store(&TokenResponse {
            access_token: "abc".into(),
            expires_in: Some(3600),
        });
        assert_eq!(cache.get().as_deref(), Some("abc"));
    }

    #[test]
    fn token_cache_ignores_tokens_inside_margin() {
        let cache = TokenCache::default();
        cache.store(&TokenResponse {
            access_token: "short".into(),
            expires_in: Some(30),
        });
        assert!(cache.get().is_none());
    }

    #[test]
    fn token_without_lifetime_is_not_reused() {
        let cache = TokenCache::default();
        cache.store(&TokenResponse {
            access_token: "once".into(),
            expires_in: None,
        });
        assert!(cache.get().is_none());
    }
}
