//! Generation pipeline: scrape, build the prompt, generate.

use std::sync::Arc;

use instadiag_client::{
    ChatInputs, ChatRequest, DiagnosisGenerator, GenerateError, ProfileScraper, ScrapeError, match_profiles,
};
use instadiag_core::{DiagnosisKey, Error};

use super::prompt;

/// Runs one fresh diagnosis against the injected collaborators.
#[derive(Clone)]
pub struct DiagnosisPipeline {
    scraper: Arc<dyn ProfileScraper>,
    generator: Arc<dyn DiagnosisGenerator>,
    user: String,
}

impl DiagnosisPipeline {
    pub fn new(
        scraper: Arc<dyn ProfileScraper>, generator: Arc<dyn DiagnosisGenerator>, user: impl Into<String>,
    ) -> Self {
        Self { scraper, generator, user: user.into() }
    }

    /// Produce a new diagnosis for `key`.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` when the target cannot be resolved, an upstream
    /// error when scraping or generation fails, and `EmptyDiagnosis` when
    /// the generated text is blank.
    pub async fn run(&self, key: &DiagnosisKey) -> Result<String, Error> {
        let usernames = key.usernames();
        tracing::info!(?usernames, "fetching profiles");

        let records = self.scraper.fetch_profiles(&usernames).await.map_err(scrape_error)?;
        let profiles = match_profiles(records, &key.username, key.competitor.as_deref())?;

        if let Some(competitor) = &key.competitor
            && profiles.competitor.is_none()
        {
            tracing::warn!(competitor = %competitor, "competitor profile not found, continuing without it");
        }

        let request = ChatRequest::blocking(
            ChatInputs {
                profile_context: prompt::build_context(&profiles, &key.username, key.competitor.as_deref()),
                mode: key.mode.to_string(),
            },
            prompt::query_text(key.mode, key.competitor.is_some()),
            self.user.as_str(),
        );

        let answer = self.generator.generate(&request).await.map_err(generate_error)?;
        if answer.trim().is_empty() {
            return Err(Error::EmptyDiagnosis);
        }

        Ok(answer)
    }
}

fn scrape_error(err: ScrapeError) -> Error {
    match err {
        ScrapeError::AuthError | ScrapeError::MissingToken => Error::ScrapeAuth(err.to_string()),
        ScrapeError::Timeout => Error::UpstreamTimeout("profile scraping timed out".into()),
        _ => Error::ScrapeFailed(err.to_string()),
    }
}

fn generate_error(err: GenerateError) -> Error {
    match err {
        GenerateError::AuthError | GenerateError::MissingApiKey => Error::GenerationAuth(err.to_string()),
        GenerateError::Timeout => Error::UpstreamTimeout("diagnosis generation timed out".into()),
        GenerateError::EmptyAnswer => Error::EmptyDiagnosis,
        _ => Error::GenerationFailed(err.to_string()),
    }
}
