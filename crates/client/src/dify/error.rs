//! Dify client error types.

use std::sync::Arc;

/// Errors from the Dify generation client.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Missing DIFY_API_KEY.
    #[error("missing API key: DIFY_API_KEY not set")]
    MissingApiKey,

    /// Missing or unparseable DIFY_API_URL.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// HTTP error response.
    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// The app answered without any text.
    #[error("empty answer from generation service")]
    EmptyAnswer,
}

impl From<reqwest::Error> for GenerateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { GenerateError::Timeout } else { GenerateError::Network(Arc::new(err)) }
    }
}
