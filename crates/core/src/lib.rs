//! Core types and shared functionality for instadiag.
//!
//! This crate provides:
//! - SQLite store for diagnosis results and access logs
//! - Unified error types
//! - Configuration structures
//! - Diagnosis keys and the per-IP rate limiter

pub mod cache;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod rate_limit;

pub use cache::{CacheDb, CacheEntry};
pub use config::{AppConfig, ConfigError};
pub use diagnosis::{DiagnosisKey, Mode};
pub use error::{Error, ErrorCategory, NotFoundReason};
pub use rate_limit::{RateDecision, RateLimitConfig, RateLimiter};
