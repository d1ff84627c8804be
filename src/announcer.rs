// 📣 Announcer - sends a finished status text to the social feed
//
// Posting failures are reported to the caller, which logs them and moves on.
// Nothing here retries.

use crate::oauth::{authorization_header, Credentials, Nonce};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

pub const POST_ENDPOINT: &str = "https://api.twitter.com/2/tweets";

#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, status: &str) -> Result<()>;
}

// ============================================================================
// SIGNED POSTER
// ============================================================================

#[derive(Serialize)]
struct PostBody<'a> {
    text: &'a str,
}

pub struct TwitterAnnouncer {
    client: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
    timeout: Duration,
}

impl TwitterAnnouncer {
    pub fn new(client: reqwest::Client, credentials: Credentials, timeout: Duration) -> Self {
        TwitterAnnouncer {
            client,
            endpoint: POST_ENDPOINT.to_string(),
            credentials,
            timeout,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn post(&self, status: &str) -> Result<()> {
        // JSON bodies are not part of the signature base
        let auth = authorization_header("POST", &self.endpoint, &[], &self.credentials, &Nonce::fresh())?;

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", auth)
            .json(&PostBody { text: status })
            .send()
            .await
            .context("Posting request failed")?;

        let code = resp.status();
        if !code.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Posting rejected (status {}): {}", code.as_u16(), body));
        }
        Ok(())
    }
}

#[async_trait]
impl Announcer for TwitterAnnouncer {
    async fn announce(&self, status: &str) -> Result<()> {
        tokio::time::timeout(self.timeout, self.post(status))
            .await
            .map_err(|_| anyhow!("Posting timed out after {}s", self.timeout.as_secs()))?
    }
}

// ============================================================================
// DRY RUN
// ============================================================================

/// Logs what would have been posted
#[derive(Debug, Default)]
pub struct LogAnnouncer;

#[async_trait]
impl Announcer for LogAnnouncer {
    async fn announce(&self, status: &str) -> Result<()> {
        tracing::info!(status, "Dry run, not posting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            access_token: "at".to_string(),
            access_token_secret: "ats".to_string(),
        }
    }

    async fn posting_server(response: ResponseTemplate) -> (MockServer, TwitterAnnouncer) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(header_exists("Authorization"))
            .and(body_json(json!({ "text": "RIP Jane Doe, painter." })))
            .respond_with(response)
            .mount(&server)
            .await;

        let announcer =
            TwitterAnnouncer::new(reqwest::Client::new(), credentials(), Duration::from_secs(5))
                .with_endpoint(format!("{}/2/tweets", server.uri()));
        (server, announcer)
    }

    #[tokio::test]
    async fn test_log_announcer_always_succeeds() {
        assert!(LogAnnouncer.announce("RIP Jane Doe, painter.").await.is_ok());
    }

    #[test]
    fn test_post_body_shape() {
        let body = serde_json::to_value(PostBody { text: "hello" }).unwrap();
        assert_eq!(body, serde_json::json!({ "text": "hello" }));
    }

    #[tokio::test]
    async fn test_signed_post_accepted() {
        let (server, announcer) = posting_server(ResponseTemplate::new(201)).await;

        announcer.announce("RIP Jane Doe, painter.").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let auth = requests[0]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(auth.starts_with("OAuth oauth_consumer_key=\"ck\""));
        assert!(auth.contains("oauth_signature="));
    }

    #[tokio::test]
    async fn test_rejected_post_is_error() {
        let (_server, announcer) =
            posting_server(ResponseTemplate::new(403).set_body_string("duplicate content")).await;

        let err = announcer.announce("RIP Jane Doe, painter.").await.unwrap_err();
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("duplicate content"));
    }
}
