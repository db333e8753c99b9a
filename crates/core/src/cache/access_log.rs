//! Access log operations backing the per-IP rate limiter.

use chrono::{DateTime, Utc};
use tokio_rusqlite::params;

use super::connection::CacheDb;
use super::format_timestamp;
use crate::Error;

impl CacheDb {
    /// Count requests from `ip_address` to `endpoint` at or after `since`.
    pub async fn count_access_since(
        &self, ip_address: &str, endpoint: &str, since: DateTime<Utc>,
    ) -> Result<u64, Error> {
        let ip_address = ip_address.to_string();
        let endpoint = endpoint.to_string();
        let since = format_timestamp(since);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM access_logs
                    WHERE ip_address = ?1 AND endpoint = ?2 AND created_at >= ?3",
                    params![ip_address, endpoint, since],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Append an access log row.
    pub async fn record_access(&self, ip_address: &str, endpoint: &str, at: DateTime<Utc>) -> Result<(), Error> {
        let ip_address = ip_address.to_string();
        let endpoint = endpoint.to_string();
        let at = format_timestamp(at);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO access_logs (ip_address, endpoint, created_at) VALUES (?1, ?2, ?3)",
                    params![ip_address, endpoint, at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
