//! Diagnosis cache operations.
//!
//! Rows are append-only: a new diagnosis for an existing key is inserted
//! alongside the old ones and lookups read the newest row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::{format_timestamp, parse_timestamp};
use crate::diagnosis::{DiagnosisKey, Mode};
use crate::Error;

/// A stored diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub username: String,
    pub mode: Mode,
    pub competitor_id: Option<String>,
    pub diagnosis_result: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// New entry for `key` created at `created_at`.
    pub fn new(key: &DiagnosisKey, diagnosis_result: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            username: key.username.clone(),
            mode: key.mode,
            competitor_id: key.competitor.clone(),
            diagnosis_result: diagnosis_result.into(),
            created_at,
        }
    }
}

impl CacheDb {
    /// Insert a diagnosis row.
    ///
    /// Returns the new row id.
    pub async fn insert_diagnosis(&self, entry: &CacheEntry) -> Result<i64, Error> {
        if entry.diagnosis_result.trim().is_empty() {
            return Err(Error::EmptyDiagnosis);
        }

        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO diagnosis_cache (username, mode, competitor_id, diagnosis_result, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        &entry.username,
                        entry.mode.as_str(),
                        &entry.competitor_id,
                        &entry.diagnosis_result,
                        format_timestamp(entry.created_at),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// Newest diagnosis for `key` created at or after `fresh_since`.
    ///
    /// The competitor column is matched with `IS`, so a key without a
    /// competitor only sees rows whose competitor is NULL.
    pub async fn latest_diagnosis(
        &self, key: &DiagnosisKey, fresh_since: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, Error> {
        let username = key.username.clone();
        let mode = key.mode;
        let competitor = key.competitor.clone();
        let since = format_timestamp(fresh_since);

        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT diagnosis_result, created_at FROM diagnosis_cache
                    WHERE username = ?1 AND mode = ?2 AND competitor_id IS ?3 AND created_at >= ?4
                    ORDER BY created_at DESC, id DESC
                    LIMIT 1",
                )?;

                let result = stmt.query_row(params![&username, mode.as_str(), &competitor, since], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                });

                match result {
                    Ok((diagnosis_result, created_at)) => Ok(Some(CacheEntry {
                        username,
                        mode,
                        competitor_id: competitor,
                        diagnosis_result,
                        created_at: parse_timestamp(&created_at)?,
                    })),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored rows for `key`, regardless of age.
    pub async fn count_diagnoses(&self, key: &DiagnosisKey) -> Result<u64, Error> {
        let username = key.username.clone();
        let mode = key.mode;
        let competitor = key.competitor.clone();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM diagnosis_cache WHERE username = ?1 AND mode = ?2 AND competitor_id IS ?3",
                    params![username, mode.as_str(), competitor],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
