//! Apify client error types.

use std::sync::Arc;

/// Errors from the Apify scraping client.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Missing APIFY_API_TOKEN.
    #[error("missing API token: APIFY_API_TOKEN not set")]
    MissingToken,

    /// Nothing to scrape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed (invalid or revoked token).
    #[error("authentication failed: invalid API token")]
    AuthError,

    /// HTTP error response.
    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    /// Request timeout, client side or reported by the actor run.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ScrapeError::Timeout } else { ScrapeError::Network(Arc::new(err)) }
    }
}
