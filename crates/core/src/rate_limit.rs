//! Per-IP sliding-window rate limiting backed by the access log.
//!
//! The limiter fails open: if the count query errors the request is allowed,
//! and a failed log insert is only logged.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::CacheDb;

/// Client IP used when the request carries no forwarding header.
pub const UNKNOWN_IP: &str = "unknown";

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests accepted per IP and endpoint within `window`.
    pub max_requests: u64,
    /// Sliding window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_requests: 10, window: Duration::from_secs(24 * 60 * 60) }
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// Sliding-window limiter over the `access_logs` table.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    db: CacheDb,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(db: CacheDb, config: RateLimitConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check the quota for `ip_address` on `endpoint` and record the attempt
    /// if it is allowed.
    pub async fn check_and_record(&self, ip_address: &str, endpoint: &str) -> RateDecision {
        self.check_and_record_at(ip_address, endpoint, Utc::now()).await
    }

    /// [`check_and_record`](Self::check_and_record) with an explicit clock.
    pub async fn check_and_record_at(&self, ip_address: &str, endpoint: &str, now: DateTime<Utc>) -> RateDecision {
        let window = chrono::Duration::from_std(self.config.window).unwrap_or(chrono::Duration::MAX);
        let since = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);

        match self.db.count_access_since(ip_address, endpoint, since).await {
            Ok(count) if count >= self.config.max_requests => {
                tracing::info!(ip = ip_address, endpoint, count, "rate limit exceeded");
                return RateDecision::Denied { retry_after: self.config.window };
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(ip = ip_address, endpoint, error = %e, "rate limit check failed; allowing request");
            }
        }

        if let Err(e) = self.db.record_access(ip_address, endpoint, now).await {
            tracing::warn!(ip = ip_address, endpoint, error = %e, "failed to record access log");
        }

        RateDecision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    async fn limiter(max_requests: u64) -> RateLimiter {
        let db = CacheDb::open_in_memory().await.unwrap();
        RateLimiter::new(db, RateLimitConfig { max_requests, ..Default::default() })
    }

    #[tokio::test]
    async fn test_eleventh_request_denied() {
        let limiter = limiter(10).await;
        let now = Utc::now();

        for i in 0..10 {
            let decision = limiter.check_and_record_at("1.2.3.4", "diagnose", now).await;
            assert!(decision.is_allowed(), "request {} should be allowed", i + 1);
        }

        let decision = limiter.check_and_record_at("1.2.3.4", "diagnose", now).await;
        assert_eq!(decision, RateDecision::Denied { retry_after: Duration::from_secs(86_400) });
    }

    #[tokio::test]
    async fn test_denied_attempts_are_not_logged() {
        let limiter = limiter(1).await;
        let now = Utc::now();

        assert!(limiter.check_and_record_at("1.2.3.4", "diagnose", now).await.is_allowed());
        assert!(!limiter.check_and_record_at("1.2.3.4", "diagnose", now).await.is_allowed());

        let logged = limiter
            .db
            .count_access_since("1.2.3.4", "diagnose", now - ChronoDuration::hours(1))
            .await
            .unwrap();
        assert_eq!(logged, 1);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = limiter(2).await;
        let start = Utc::now() - ChronoDuration::hours(30);

        assert!(limiter.check_and_record_at("1.2.3.4", "diagnose", start).await.is_allowed());
        assert!(limiter.check_and_record_at("1.2.3.4", "diagnose", start).await.is_allowed());
        assert!(!limiter.check_and_record_at("1.2.3.4", "diagnose", start).await.is_allowed());

        let later = start + ChronoDuration::hours(25);
        assert!(limiter.check_and_record_at("1.2.3.4", "diagnose", later).await.is_allowed());
    }

    #[tokio::test]
    async fn test_buckets_are_per_ip_and_endpoint() {
        let limiter = limiter(1).await;
        let now = Utc::now();

        assert!(limiter.check_and_record_at("1.2.3.4", "diagnose", now).await.is_allowed());
        assert!(limiter.check_and_record_at("5.6.7.8", "diagnose", now).await.is_allowed());
        assert!(limiter.check_and_record_at("1.2.3.4", "other", now).await.is_allowed());
        assert!(!limiter.check_and_record_at("1.2.3.4", "diagnose", now).await.is_allowed());
    }

    #[tokio::test]
    async fn test_store_failure_fails_open() {
        let limiter = limiter(1).await;
        limiter
            .db
            .conn
            .call(|conn| conn.execute_batch("DROP TABLE access_logs;"))
            .await
            .unwrap();

        for _ in 0..3 {
            assert!(limiter.check_and_record("1.2.3.4", "diagnose").await.is_allowed());
        }
    }

    #[tokio::test]
    async fn test_unknown_ips_share_a_bucket() {
        let limiter = limiter(1).await;
        let now = Utc::now();

        assert!(limiter.check_and_record_at(UNKNOWN_IP, "diagnose", now).await.is_allowed());
        assert!(!limiter.check_and_record_at(UNKNOWN_IP, "diagnose", now).await.is_allowed());
    }
}
