// 🌐 JSON over HTTP - shared by the bulk source and the entity resolver

use crate::error::{FetchError, FetchResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const USER_AGENT: &str = concat!("deathwatch/", env!("CARGO_PKG_VERSION"));

pub fn build_client(timeout: Duration) -> FetchResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Client for long-lived responses: only connecting is bounded
pub fn build_stream_client(connect_timeout: Duration) -> FetchResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(connect_timeout)
        .build()?)
}

/// GET `url` and decode the body as JSON.
///
/// Anything other than 200, a non-JSON content type, or an undecodable body is
/// an error. The whole exchange is bounded by `timeout`.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> FetchResult<T> {
    match tokio::time::timeout(timeout, fetch(client, url, timeout)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout.as_secs())),
    }
}

async fn fetch<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> FetchResult<T> {
    let resp = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| classify(e, timeout))?;

    let status = resp.status();
    if status != StatusCode::OK {
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    check_content_type(&content_type)?;

    let bytes = resp.bytes().await.map_err(|e| classify(e, timeout))?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn check_content_type(content_type: &str) -> FetchResult<()> {
    if content_type.contains("json") {
        Ok(())
    } else {
        Err(FetchError::ContentType(content_type.to_string()))
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout.as_secs())
    } else {
        FetchError::from(err)
    }
}
