//! Apify Instagram profile scraper client.
//!
//! ### Contract
//!
//! - **Endpoint**: `POST {base}/acts/{actor}/run-sync-get-dataset-items`
//! - **Authentication**: bearer token.
//! - **Body**: `{ "usernames": [...] }`, one batched call per diagnosis.
//! - **Response**: the run's dataset items, one per requested username. An
//!   item is either a profile object or an array wrapping one.

pub mod error;

pub use error::ScrapeError;

use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::profile::{ProfileRecord, parse_dataset};
use crate::service::ProfileScraper;

/// Default base URL for the Apify API.
pub const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

/// Default actor used for profile scraping.
pub const DEFAULT_ACTOR: &str = "apify~instagram-profile-scraper";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "instadiag/0.1";

/// Apify client configuration.
#[derive(Debug, Clone)]
pub struct ApifyConfig {
    /// API token from APIFY_API_TOKEN.
    pub token: String,
    /// Base URL (default: https://api.apify.com/v2).
    pub base_url: String,
    /// Actor id, `user~name` form.
    pub actor: String,
    /// Request timeout (default: 60s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl Default for ApifyConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            actor: DEFAULT_ACTOR.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Actor input.
#[derive(Debug, Serialize)]
struct RunInput<'a> {
    usernames: &'a [String],
}

/// Error envelope Apify uses for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Apify API client.
#[derive(Debug, Clone)]
pub struct ApifyClient {
    http: reqwest::Client,
    config: ApifyConfig,
}

impl ApifyClient {
    /// Create a new Apify client with the given configuration.
    pub fn new(config: ApifyConfig) -> Result<Self, ScrapeError> {
        if config.token.trim().is_empty() {
            return Err(ScrapeError::MissingToken);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ScrapeError::Network(Arc::new(e)))?;

        Ok(Self { http, config })
    }

    /// Synchronous run endpoint for the configured actor.
    pub fn run_url(&self) -> String {
        format!(
            "{}/acts/{}/run-sync-get-dataset-items",
            self.config.base_url.trim_end_matches('/'),
            self.config.actor
        )
    }

    /// Run the actor for `usernames` and return the profile records.
    pub async fn scrape(&self, usernames: &[String]) -> Result<Vec<ProfileRecord>, ScrapeError> {
        if usernames.is_empty() {
            return Err(ScrapeError::InvalidRequest("no usernames given".to_string()));
        }

        let start = Instant::now();
        tracing::debug!(?usernames, actor = %self.config.actor, "running Apify actor");

        let http_response = self
            .http
            .post(self.run_url())
            .bearer_auth(&self.config.token)
            .header(header::ACCEPT, "application/json")
            .json(&RunInput { usernames })
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("Apify response status: {}", status);

        if status == 401 || status == 403 {
            return Err(ScrapeError::AuthError);
        }

        if status == 408 {
            return Err(ScrapeError::Timeout);
        }

        if status.is_client_error() || status.is_server_error() {
            let body = http_response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
            return Err(ScrapeError::HttpError { status: status.as_u16(), message });
        }

        let bytes = http_response.bytes().await?;
        let items: Vec<serde_json::Value> =
            serde_json::from_slice(&bytes).map_err(|e| ScrapeError::Parse(e.to_string()))?;
        let records = parse_dataset(items);

        tracing::debug!("scrape completed in {:?}, {} records", start.elapsed(), records.len());

        Ok(records)
    }
}

#[async_trait]
impl ProfileScraper for ApifyClient {
    async fn fetch_profiles(&self, usernames: &[String]) -> Result<Vec<ProfileRecord>, ScrapeError> {
        self.scrape(usernames).await
    }
}
