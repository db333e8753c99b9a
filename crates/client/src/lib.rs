//! HTTP clients for instadiag's upstream collaborators.
//!
//! This crate provides the Apify profile scraper client, the Dify chat
//! client, the profile record types they exchange, and the traits the server
//! uses to inject them.

pub mod apify;
pub mod dify;
pub mod profile;
pub mod service;

pub use apify::{ApifyClient, ApifyConfig, ScrapeError};
pub use dify::{ChatInputs, ChatRequest, DifyClient, DifyConfig, GenerateError};
pub use profile::{DatasetItem, Post, PostKind, ProfileMatch, ProfileRecord, match_profiles, parse_dataset};
pub use service::{DiagnosisGenerator, ProfileScraper};
