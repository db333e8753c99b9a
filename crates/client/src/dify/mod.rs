//! Dify chat app client used to generate diagnoses.
//!
//! ### Contract
//!
//! - **Endpoint**: `POST {url}/chat-messages`. The path is appended unless
//!   the configured URL already ends with it.
//! - **Authentication**: bearer `app-` key.
//! - **Body**: [`ChatRequest`] in blocking mode.
//! - **Response**: `answer`, with fallbacks described in [`response`].

pub mod error;
pub mod request;
pub mod response;

pub use error::GenerateError;
pub use request::{ChatInputs, ChatRequest};
pub use response::{ChatResponse, extract_answer};

use async_trait::async_trait;
use reqwest::header;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::service::DiagnosisGenerator;

const CHAT_PATH: &str = "/chat-messages";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "instadiag/0.1";

/// Dify client configuration.
#[derive(Debug, Clone)]
pub struct DifyConfig {
    /// App API key from DIFY_API_KEY.
    pub api_key: String,
    /// API base URL or full chat-messages URL from DIFY_API_URL.
    pub api_url: String,
    /// Request timeout (default: 60s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl Default for DifyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Resolve the chat-messages endpoint from a configured URL.
pub fn chat_endpoint(api_url: &str) -> Result<url::Url, GenerateError> {
    let trimmed = api_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(GenerateError::InvalidUrl("DIFY_API_URL not set".to_string()));
    }

    let full = if trimmed.ends_with(CHAT_PATH) { trimmed.to_string() } else { format!("{trimmed}{CHAT_PATH}") };

    let url = url::Url::parse(&full).map_err(|e| GenerateError::InvalidUrl(format!("{api_url}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(GenerateError::InvalidUrl(format!("unsupported scheme: {other}"))),
    }
}

/// Dify API client.
#[derive(Debug, Clone)]
pub struct DifyClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: url::Url,
}

impl DifyClient {
    /// Create a new Dify client with the given configuration.
    pub fn new(config: DifyConfig) -> Result<Self, GenerateError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerateError::MissingApiKey);
        }

        let endpoint = chat_endpoint(&config.api_url)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| GenerateError::Network(Arc::new(e)))?;

        Ok(Self { http, api_key: config.api_key.trim().to_string(), endpoint })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Send a blocking chat message and return the answer text.
    pub async fn chat(&self, req: &ChatRequest) -> Result<String, GenerateError> {
        let start = Instant::now();
        tracing::debug!(mode = %req.inputs.mode, context_len = req.inputs.profile_context.len(), "calling Dify");

        let http_response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json")
            .json(req)
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("Dify response status: {}", status);

        if status == 401 || status == 403 {
            return Err(GenerateError::AuthError);
        }

        if status == 408 || status == 504 {
            return Err(GenerateError::Timeout);
        }

        if status.is_client_error() || status.is_server_error() {
            let body = http_response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(GenerateError::HttpError { status: status.as_u16(), message });
        }

        let bytes = http_response.bytes().await?;
        let answer = extract_answer(&bytes).map_err(|e| GenerateError::Parse(e.to_string()))?;

        tracing::debug!("generation completed in {:?}", start.elapsed());

        answer.ok_or(GenerateError::EmptyAnswer)
    }
}

#[async_trait]
impl DiagnosisGenerator for DifyClient {
    async fn generate(&self, request: &ChatRequest) -> Result<String, GenerateError> {
        self.chat(request).await
    }
}
