//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (INSTADIAG_*)
//! 2. Provider credentials under their conventional names
//!    (APIFY_API_TOKEN, DIFY_API_KEY, DIFY_API_URL)
//! 3. TOML config file (if INSTADIAG_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Unprefixed variables accepted for provider credentials.
const PROVIDER_VARS: &[&str] = &["APIFY_API_TOKEN", "DIFY_API_KEY", "DIFY_API_URL"];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (INSTADIAG_*)
/// 2. Provider credential variables (APIFY_API_TOKEN, DIFY_API_KEY, DIFY_API_URL)
/// 3. TOML config file (if INSTADIAG_CONFIG_FILE set)
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    ///
    /// Set via INSTADIAG_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path to SQLite cache database.
    ///
    /// Set via INSTADIAG_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Apify API token for the profile scraper.
    ///
    /// Set via APIFY_API_TOKEN or INSTADIAG_APIFY_API_TOKEN.
    #[serde(default)]
    pub apify_api_token: Option<String>,

    /// Apify API base URL.
    #[serde(default = "default_apify_base_url")]
    pub apify_base_url: String,

    /// Apify actor that scrapes Instagram profiles.
    #[serde(default = "default_apify_actor")]
    pub apify_actor: String,

    /// Dify app API key (bearer credential, usually `app-...`).
    ///
    /// Set via DIFY_API_KEY or INSTADIAG_DIFY_API_KEY.
    #[serde(default)]
    pub dify_api_key: Option<String>,

    /// Dify API base URL, with or without the trailing `/chat-messages`.
    ///
    /// Set via DIFY_API_URL or INSTADIAG_DIFY_API_URL.
    #[serde(default)]
    pub dify_api_url: Option<String>,

    /// End-user identifier sent with every generation request.
    #[serde(default = "default_dify_user")]
    pub dify_user: String,

    /// User-Agent string for outbound HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// How long a stored diagnosis stays reusable, in seconds.
    ///
    /// Set via INSTADIAG_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Accepted diagnosis requests per client IP per window.
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u64,

    /// Sliding rate limit window in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Wall-clock budget for one diagnosis, in milliseconds.
    ///
    /// Also used as the outbound HTTP request timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./instadiag-cache.sqlite")
}

fn default_apify_base_url() -> String {
    "https://api.apify.com/v2".into()
}

fn default_apify_actor() -> String {
    "apify~instagram-profile-scraper".into()
}

fn default_dify_user() -> String {
    "api-user".into()
}

fn default_user_agent() -> String {
    "instadiag/0.1".into()
}

fn default_cache_ttl_secs() -> u64 {
    6 * 60 * 60
}

fn default_rate_limit_max() -> u64 {
    10
}

fn default_rate_limit_window_secs() -> u64 {
    24 * 60 * 60
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
            apify_api_token: None,
            apify_base_url: default_apify_base_url(),
            apify_actor: default_apify_actor(),
            dify_api_key: None,
            dify_api_url: None,
            dify_user: default_dify_user(),
            user_agent: default_user_agent(),
            cache_ttl_secs: default_cache_ttl_secs(),
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Request budget as Duration for use with reqwest/tokio.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Cache freshness window.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Rate limit window.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("INSTADIAG_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment
            .merge(
                Env::raw()
                    .only(PROVIDER_VARS)
                    .map(|key| key.as_str().to_lowercase().into()),
            )
            .merge(
                Env::prefixed("INSTADIAG_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            )
    }

    /// Apify token, required before the scraper can be built.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the token is not set or blank.
    pub fn require_apify_token(&self) -> Result<&str, ConfigError> {
        self.apify_api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "apify_api_token".into(),
                hint: "Set APIFY_API_TOKEN environment variable".into(),
            })
    }

    /// Dify key and URL, required before the generator can be built.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first absent value.
    pub fn require_dify(&self) -> Result<(&str, &str), ConfigError> {
        let key = self
            .dify_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "dify_api_key".into(),
                hint: "Set DIFY_API_KEY environment variable".into(),
            })?;
        let url = self
            .dify_api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "dify_api_url".into(),
                hint: "Set DIFY_API_URL environment variable".into(),
            })?;
        Ok((key, url))
    }
}
