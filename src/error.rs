use thiserror::Error;

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Everything that can go wrong talking to the data source or the resolver.
/// Each one drops the candidate at hand; none of them stop the worker.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Request failed (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid content-type: expected application/json but received {0}")]
    ContentType(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Entity {0} missing from response")]
    MissingEntity(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
