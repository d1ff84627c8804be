// 🔐 OAuth 1.0a request signing (HMAC-SHA1) for the posting API

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// The four credential values of a user-context app
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"***")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"***")
            .finish()
    }
}

/// RFC 3986 percent-encoding: everything but ALPHA / DIGIT / "-" / "." / "_" / "~"
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Per-request values that would otherwise be random/clock driven
#[derive(Debug, Clone)]
pub struct Nonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl Nonce {
    pub fn fresh() -> Self {
        Nonce {
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

fn oauth_params(credentials: &Credentials, nonce: &Nonce) -> Vec<(&'static str, String)> {
    vec![
        ("oauth_consumer_key", credentials.consumer_key.clone()),
        ("oauth_nonce", nonce.nonce.clone()),
        ("oauth_signature_method", "HMAC-SHA1".to_string()),
        ("oauth_timestamp", nonce.timestamp.to_string()),
        ("oauth_token", credentials.access_token.clone()),
        ("oauth_version", "1.0".to_string()),
    ]
}

/// `METHOD&url&params`, params being the oauth_* values plus any query or
/// form parameters (a JSON body contributes none).
pub fn signature_base(
    method: &str,
    url: &str,
    request_params: &[(&str, &str)],
    credentials: &Credentials,
    nonce: &Nonce,
) -> String {
    let mut encoded: Vec<(String, String)> = request_params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .chain(
            oauth_params(credentials, nonce)
                .into_iter()
                .map(|(k, v)| (percent_encode(k), percent_encode(&v))),
        )
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    )
}

pub fn sign(base: &str, credentials: &Credentials) -> Result<String> {
    let key = format!(
        "{}&{}",
        percent_encode(&credentials.consumer_secret),
        percent_encode(&credentials.access_token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| anyhow!("Invalid signing key: {}", e))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Value for the `Authorization` header
pub fn authorization_header(
    method: &str,
    url: &str,
    request_params: &[(&str, &str)],
    credentials: &Credentials,
    nonce: &Nonce,
) -> Result<String> {
    let base = signature_base(method, url, request_params, credentials, nonce);
    let signature = sign(&base, credentials)?;

    let mut params = oauth_params(credentials, nonce);
    params.push(("oauth_signature", signature));
    params.sort();

    let fields = params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", fields))
}
