//! HTTP error responses for the instadiag server.
//!
//! Core errors are mapped onto a status by category and rendered as
//! `{ error, code, details?, retryAfter?, retryable? }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use instadiag_core::{Error, ErrorCategory};
use serde::Serialize;

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

/// A core error on its way to becoming an HTTP response.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorCategory::Upstream | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (error, details) = match &self.0 {
            Error::InvalidInput(msg) => (msg.clone(), None),
            Error::AccountNotFound { reason, .. } => {
                ("No Instagram data found for this username".to_string(), Some(reason.user_message().to_string()))
            }
            Error::RateLimited { .. } => (
                "Too many requests".to_string(),
                Some("The daily diagnosis limit has been reached. Please try again later.".to_string()),
            ),
            Error::ScrapeFailed(msg) => ("Failed to fetch Instagram data".to_string(), Some(msg.clone())),
            Error::ScrapeAuth(msg) => {
                ("Authentication with the scraping service failed".to_string(), Some(msg.clone()))
            }
            Error::GenerationAuth(msg) => {
                ("Authentication with the diagnosis service failed".to_string(), Some(msg.clone()))
            }
            Error::UpstreamTimeout(msg) => ("The diagnosis is taking too long".to_string(), Some(msg.clone())),
            Error::GenerationFailed(msg) => ("Failed to get diagnosis from AI".to_string(), Some(msg.clone())),
            Error::EmptyDiagnosis => ("Empty diagnosis result from AI".to_string(), None),
            Error::Database(_) | Error::MigrationFailed(_) | Error::Internal(_) => {
                ("Internal server error".to_string(), None)
            }
        };

        ErrorBody {
            error,
            code: self.0.code(),
            details,
            retry_after: match &self.0 {
                Error::RateLimited { retry_after_secs } => Some(*retry_after_secs),
                _ => None,
            },
            retryable: self.0.is_retryable().then_some(true),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            Error::AccountNotFound { detail, .. } => {
                tracing::info!(code = self.0.code(), detail = %detail, "account not found");
            }
            _ if status.is_server_error() => tracing::error!(code = self.0.code(), error = %self.0, "request failed"),
            _ => tracing::debug!(code = self.0.code(), error = %self.0, "request rejected"),
        }

        (status, Json(self.body())).into_response()
    }
}
