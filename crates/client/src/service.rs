//! Collaborator traits the diagnosis pipeline depends on.
//!
//! The HTTP clients implement these; tests substitute in-process fakes.

use async_trait::async_trait;

use crate::apify::ScrapeError;
use crate::dify::{ChatRequest, GenerateError};
use crate::profile::ProfileRecord;

/// Fetches Instagram profiles for a batch of usernames.
#[async_trait]
pub trait ProfileScraper: Send + Sync {
    /// One record per username the scraper could process, in any order.
    async fn fetch_profiles(&self, usernames: &[String]) -> Result<Vec<ProfileRecord>, ScrapeError>;
}

/// Produces diagnosis text from a prompt.
#[async_trait]
pub trait DiagnosisGenerator: Send + Sync {
    async fn generate(&self, request: &ChatRequest) -> Result<String, GenerateError>;
}
