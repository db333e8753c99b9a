//! SQLite-backed store for diagnosis results and access logs.
//!
//! This module provides a persistent store using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - Diagnosis results partitioned by (username, mode, competitor)
//! - An append-only access log for per-IP rate limiting
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings, so range
//! filters compare them as plain text.

pub mod access_log;
pub mod connection;
pub mod diagnoses;
pub mod migrations;

use chrono::{DateTime, SecondsFormat, Utc};

pub use crate::Error;

pub use connection::CacheDb;
pub use diagnoses::CacheEntry;

/// Format a timestamp the way every table stores it.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("bad stored timestamp {raw:?}: {e}")))
}
