//! Reddit content source.
//!
//! Authenticates as a script app (OAuth password grant) and reads the
//! newest posts of one subreddit.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use rf_core::config::{expand_secret, RedditConfig};
use rf_core::ContentItem;
use rf_pipeline::SourceFetcher;

use crate::http::{self, TokenCache, TokenResponse};

const SERVICE: &str = "reddit";

pub struct RedditFetcher {
    http: Client,
    config: RedditConfig,
    token: TokenCache,
}

impl RedditFetcher {
    /// Build a fetcher; credential fields may reference environment variables.
    pub fn new(config: &RedditConfig) -> rf_core::Result<Self> {
        let mut config = config.clone();
        config.client_id = expand_secret(&config.client_id)?;
        config.client_secret = expand_secret(&config.client_secret)?;
        config.username = expand_secret(&config.username)?;
        config.password = expand_secret(&config.password)?;

        Ok(Self {
            http: http::build_client(SERVICE, &config.user_agent)?,
            config,
            token: TokenCache::default(),
        })
    }

    async fn access_token(&self) -> rf_core::Result<String> {
        if let Some(token) = self.token.get() {
            return Ok(token);
        }

        let url = http::endpoint(&self.config.auth_url, "/api/v1/access_token");
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
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

    async fn newest_posts(&self) -> rf_core::Result<Vec<Post>> {
        let token = self.access_token().await?;
        let url = http::endpoint(
            &self.config.api_url,
            &format!("/r/{}/new", self.config.subreddit),
        );
        let limit = self.config.limit.to_string();

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("limit", limit.as_str()), ("raw_json", "1")])
            .send()
            .await
            .map_err(http::transport(SERVICE))?;

        let listing: Listing = http::check(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(http::decode(SERVICE))?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect())
    }
}

impl std::fmt::Debug for RedditFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditFetcher")
            .field("subreddit", &self.config.subreddit)
            .field("limit", &self.config.limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SourceFetcher for RedditFetcher {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn fetch(&self) -> rf_core::Result<Option<ContentItem>> {
        let posts = self.newest_posts().await?;
        let seen = posts.len();

        let item = posts
            .into_iter()
            .find(|p| !p.stickied && !p.selftext.trim().is_empty())
            .map(|p| ContentItem::new(p.title.trim(), p.selftext.trim()));

        match &item {
            Some(item) => tracing::debug!(
                subreddit = %self.config.subreddit,
                title = %item.title,
                "Picked post"
            ),
            None => tracing::info!(
                subreddit = %self.config.subreddit,
                seen,
                "No usable post"
            ),
        }
        Ok(item)
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    stickied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> RedditConfig {
        RedditConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            username: "bot".into(),
            password: "hunter2".into(),
            auth_url: server.uri(),
            api_url: server.uri(),
            ..Default::default()
        }
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "token_type": "bearer",
                "expires_in": 86400
            })))
            .mount(server)
            .await;
    }

    fn post(title: &str, body: &str, stickied: bool) -> serde_json::Value {
        json!({ "kind": "t3", "data": { "title": title, "selftext": body, "stickied": stickied } })
    }

    async fn mount_listing(server: &MockServer, posts: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path("/r/AmItheAsshole/new"))
            .and(query_param("limit", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "kind": "Listing", "data": { "children": posts } })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetches_newest_post() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        mount_listing(&server, vec![post("AITA for X?", "  Long story.  ", false)]).await;

        let fetcher = RedditFetcher::new(&config(&server)).unwrap();
        let item = fetcher.fetch().await.unwrap().unwrap();

        assert_eq!(item, ContentItem::new("AITA for X?", "Long story."));
    }

    #[tokio::test]
    async fn stickied_and_empty_posts_are_skipped() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        mount_listing(
            &server,
            vec![
                post("Rules", "Read them", true),
                post("Link post", "", false),
                post("AITA?", "Body", false),
            ],
        )
        .await;

        let fetcher = RedditFetcher::new(&config(&server)).unwrap();
        let item = fetcher.fetch().await.unwrap().unwrap();
        assert_eq!(item.title, "AITA?");
    }

    #[tokio::test]
    async fn empty_listing_is_no_content() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        mount_listing(&server, vec![]).await;

        let fetcher = RedditFetcher::new(&config(&server)).unwrap();
        assert!(fetcher.fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejected_credentials_are_a_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\": 401}"))
            .mount(&server)
            .await;

        let fetcher = RedditFetcher::new(&config(&server)).unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, rf_core::Error::Remote { .. }));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn token_is_reused_across_fetches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "expires_in": 86400
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_listing(&server, vec![post("T", "B", false)]).await;

        let fetcher = RedditFetcher::new(&config(&server)).unwrap();
        fetcher.fetch().await.unwrap();
        fetcher.fetch().await.unwrap();
    }
}
