use reqwest::StatusCode;
use thiserror::Error;

/// Client errors. Response bodies are never echoed, so API error details
/// stay out of terminal output.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed (401): check your NEON_API_KEY")]
    Unauthorized,
    #[error("access denied (403): check your permissions")]
    Forbidden,
    #[error("resource not found (404) at endpoint '{0}'")]
    NotFound(String),
    #[error("rate limited (429): please wait and try again")]
    RateLimited,
    #[error("request to '{endpoint}' failed with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("network error: unable to reach the Neon API")]
    Network(#[source] reqwest::Error),
    #[error("could not decode response from '{endpoint}': {message}")]
    Decode { endpoint: String, message: String },
    #[error("invalid {kind}: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error("http client error: {0}")]
    Client(String),
    #[error(transparent)]
    Usage(#[from] usage_core::UsageError),
}

impl ApiError {
    pub fn from_status(status: StatusCode, endpoint: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound(endpoint.to_string()),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            other => Self::Status {
                endpoint: endpoint.to_string(),
                status: other.as_u16(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
