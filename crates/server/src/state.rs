//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use instadiag_client::{DiagnosisGenerator, ProfileScraper};
use instadiag_core::{AppConfig, CacheDb, RateLimitConfig, RateLimiter};

use crate::diagnose::{DiagnosisGate, DiagnosisPipeline};

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub limiter: RateLimiter,
    pub gate: DiagnosisGate,
    pub pipeline: DiagnosisPipeline,
    /// Wall-clock budget for one diagnosis.
    pub request_timeout: Duration,
}

impl AppState {
    /// Wire the policies to the store and the injected collaborators.
    pub fn new(
        config: &AppConfig, db: CacheDb, scraper: Arc<dyn ProfileScraper>, generator: Arc<dyn DiagnosisGenerator>,
    ) -> Self {
        let limiter = RateLimiter::new(
            db.clone(),
            RateLimitConfig { max_requests: config.rate_limit_max, window: config.rate_limit_window() },
        );

        Self {
            limiter,
            gate: DiagnosisGate::new(db, config.cache_ttl()),
            pipeline: DiagnosisPipeline::new(scraper, generator, config.dify_user.as_str()),
            request_timeout: config.request_timeout(),
        }
    }
}
