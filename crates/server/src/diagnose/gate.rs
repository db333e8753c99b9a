//! Diagnosis cache gate.
//!
//! Serves a stored diagnosis while it is fresh, otherwise runs generation and
//! stores the result. Store failures never fail the request.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use instadiag_core::{CacheDb, CacheEntry, DiagnosisKey, Error};

/// A diagnosis ready to return to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub result: String,
    pub cached: bool,
    /// Creation time of the stored entry, set on cache hits only.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct DiagnosisGate {
    db: CacheDb,
    ttl: Duration,
}

impl DiagnosisGate {
    pub fn new(db: CacheDb, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Return the fresh stored diagnosis for `key`, or run `generate` and
    /// store what it produces.
    pub async fn get_or_create<F, Fut>(&self, key: &DiagnosisKey, generate: F) -> Result<Diagnosis, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, Error>>,
    {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let fresh_since = now.checked_sub_signed(ttl).unwrap_or(DateTime::<Utc>::MIN_UTC);

        match self.db.latest_diagnosis(key, fresh_since).await {
            Ok(Some(entry)) => {
                tracing::info!(key = %key, created_at = %entry.created_at, "cache hit");
                return Ok(Diagnosis {
                    result: entry.diagnosis_result,
                    cached: true,
                    created_at: Some(entry.created_at),
                });
            }
            Ok(None) => tracing::info!(key = %key, "cache miss, generating"),
            Err(e) => tracing::warn!(key = %key, error = %e, "cache lookup failed, treating as miss"),
        }

        let result = generate().await?;
        if result.trim().is_empty() {
            return Err(Error::EmptyDiagnosis);
        }

        if let Err(e) = self.db.insert_diagnosis(&CacheEntry::new(key, result.as_str(), Utc::now())).await {
            tracing::warn!(key = %key, error = %e, "failed to store diagnosis");
        }

        Ok(Diagnosis { result, cached: false, created_at: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instadiag_core::Mode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SIX_HOURS: Duration = Duration::from_secs(6 * 60 * 60);

    async fn gate() -> DiagnosisGate {
        DiagnosisGate::new(CacheDb::open_in_memory().await.unwrap(), SIX_HOURS)
    }

    fn key(competitor: Option<&str>) -> DiagnosisKey {
        DiagnosisKey::new("foo", Mode::Mild, competitor).unwrap()
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let gate = gate().await;
        let calls = AtomicUsize::new(0);
        let generate = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Error>("Great profile!".to_string()) }
        };

        let first = gate.get_or_create(&key(None), generate).await.unwrap();
        assert!(!first.cached);
        assert!(first.created_at.is_none());

        let second = gate.get_or_create(&key(None), generate).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.result, first.result);
        assert!(second.created_at.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_regenerates() {
        let gate = gate().await;
        let k = key(None);
        gate.db()
            .insert_diagnosis(&CacheEntry::new(&k, "old", Utc::now() - chrono::Duration::hours(7)))
            .await
            .unwrap();

        let result = gate.get_or_create(&k, || async { Ok("new".to_string()) }).await.unwrap();
        assert!(!result.cached);
        assert_eq!(result.result, "new");
        assert_eq!(gate.db().count_diagnoses(&k).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_competitor_partitions() {
        let gate = gate().await;
        gate.get_or_create(&key(None), || async { Ok("solo".to_string()) })
            .await
            .unwrap();

        let versus = gate
            .get_or_create(&key(Some("rival")), || async { Ok("versus".to_string()) })
            .await
            .unwrap();
        assert!(!versus.cached);
        assert_eq!(versus.result, "versus");

        let solo = gate
            .get_or_create(&key(None), || async { Ok("unused".to_string()) })
            .await
            .unwrap();
        assert!(solo.cached);
        assert_eq!(solo.result, "solo");
    }

    #[tokio::test]
    async fn test_generation_error_stores_nothing() {
        let gate = gate().await;
        let k = key(None);

        let result = gate
            .get_or_create(&k, || async { Err(Error::GenerationFailed("boom".into())) })
            .await;
        assert!(matches!(result, Err(Error::GenerationFailed(_))));
        assert_eq!(gate.db().count_diagnoses(&k).await.unwrap(), 0);
    }

    /// A gate over an on-disk cache plus a second connection for breaking it.
    async fn file_gate(dir: &tempfile::TempDir) -> (DiagnosisGate, tokio_rusqlite::Connection) {
        let path = dir.path().join("cache.sqlite");
        let db = CacheDb::open(&path).await.unwrap();
        let side = tokio_rusqlite::Connection::open(&path).await.unwrap();
        (DiagnosisGate::new(db, SIX_HOURS), side)
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_through_to_generation() {
        let dir = tempfile::tempdir().unwrap();
        let (gate, side) = file_gate(&dir).await;
        side.call(|conn| conn.execute_batch("DROP TABLE diagnosis_cache;"))
            .await
            .unwrap();

        let calls = AtomicUsize::new(0);
        let result = gate
            .get_or_create(&key(None), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, Error>("fresh".to_string()) }
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!result.cached);
        assert_eq!(result.result, "fresh");
        assert!(gate.db().latest_diagnosis(&key(None), Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_result() {
        let dir = tempfile::tempdir().unwrap();
        let (gate, side) = file_gate(&dir).await;
        side.call(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_diagnosis BEFORE INSERT ON diagnosis_cache
                 BEGIN SELECT RAISE(ABORT, 'read only'); END;",
            )
        })
        .await
        .unwrap();

        let k = key(None);
        let result = gate.get_or_create(&k, || async { Ok("kept".to_string()) }).await.unwrap();
        assert!(!result.cached);
        assert_eq!(result.result, "kept");
        assert_eq!(gate.db().count_diagnoses(&k).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_result_rejected() {
        let gate = gate().await;
        let k = key(None);

        let result = gate.get_or_create(&k, || async { Ok("   ".to_string()) }).await;
        assert!(matches!(result, Err(Error::EmptyDiagnosis)));
        assert_eq!(gate.db().count_diagnoses(&k).await.unwrap(), 0);
    }
}
