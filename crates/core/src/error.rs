//! Unified error types for instadiag.
//!
//! Every variant carries a stable machine-readable code (the prefix of its
//! `Display` output) and belongs to one [`ErrorCategory`], which the server
//! maps onto an HTTP status.

use std::fmt;

use tokio_rusqlite::rusqlite;

/// Why a requested account could not be resolved from the scraper output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The account exists but is private.
    Private,
    /// The scraper returned no data for the account.
    Empty,
    /// No usable record, cause unknown (typo, deleted account, ...).
    Unknown,
}

impl NotFoundReason {
    /// Classify a scraper error description.
    ///
    /// The scraper only reports these sub-cases as free text, so this is the
    /// one place where provider messages are pattern matched.
    pub fn from_description(description: &str) -> Self {
        if description.contains("private") {
            Self::Private
        } else if description.contains("Empty") {
            Self::Empty
        } else {
            Self::Unknown
        }
    }

    /// Stable error code for this reason.
    pub fn code(self) -> &'static str {
        match self {
            Self::Private => "ACCOUNT_PRIVATE",
            Self::Empty => "ACCOUNT_EMPTY",
            Self::Unknown => "ACCOUNT_NOT_FOUND",
        }
    }

    /// User-facing explanation.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Private => "This account is private, so its data could not be retrieved.",
            Self::Empty => "No data was found for this account. Check that the username is correct.",
            Self::Unknown => "The account may be private or the username may be incorrect.",
        }
    }
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Coarse error classes, one per HTTP status family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    RateLimit,
    Upstream,
    Internal,
}

/// Unified error types for the instadiag service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid request input (missing username, unknown mode, ...).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The target account could not be resolved.
    #[error("{reason}: {detail}")]
    AccountNotFound { reason: NotFoundReason, detail: String },

    /// Daily request quota exhausted for this client.
    #[error("RATE_LIMITED: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Profile scraping failed.
    #[error("SCRAPE_FAILED: {0}")]
    ScrapeFailed(String),

    /// The scraping service rejected our credential, or none is configured.
    #[error("SCRAPE_AUTH_FAILED: {0}")]
    ScrapeAuth(String),

    /// The generation service rejected our credential.
    #[error("GENERATION_AUTH_FAILED: {0}")]
    GenerationAuth(String),

    /// An upstream call or the overall request budget timed out.
    #[error("UPSTREAM_TIMEOUT: {0}")]
    UpstreamTimeout(String),

    /// The generation service failed.
    #[error("GENERATION_FAILED: {0}")]
    GenerationFailed(String),

    /// The generation service answered with empty text.
    #[error("EMPTY_DIAGNOSIS: generation returned no text")]
    EmptyDiagnosis,

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Anything else.
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::AccountNotFound { reason, .. } => reason.code(),
            Error::RateLimited { .. } => "RATE_LIMITED",
            Error::ScrapeFailed(_) => "SCRAPE_FAILED",
            Error::ScrapeAuth(_) => "SCRAPE_AUTH_FAILED",
            Error::GenerationAuth(_) => "GENERATION_AUTH_FAILED",
            Error::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            Error::GenerationFailed(_) => "GENERATION_FAILED",
            Error::EmptyDiagnosis => "EMPTY_DIAGNOSIS",
            Error::Database(_) | Error::MigrationFailed(_) => "CACHE_ERROR",
            Error::Internal(_) => "INTERNAL",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidInput(_) => ErrorCategory::Validation,
            Error::AccountNotFound { .. } => ErrorCategory::NotFound,
            Error::RateLimited { .. } => ErrorCategory::RateLimit,
            Error::ScrapeFailed(_)
            | Error::ScrapeAuth(_)
            | Error::GenerationAuth(_)
            | Error::UpstreamTimeout(_)
            | Error::GenerationFailed(_)
            | Error::EmptyDiagnosis => ErrorCategory::Upstream,
            Error::Database(_) | Error::MigrationFailed(_) | Error::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the client may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::UpstreamTimeout(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
