//! Configuration module for the anime links API
//!
//! Handles loading environment variables and application configuration.
//! Every setting has a default so the service starts with an empty environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::constants::defaults;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Upstream base URLs, tried in order for every fetch
    pub base_candidates: Vec<String>,
    /// User agent sent with every outbound request
    pub user_agent: String,
    /// Per-request timeout for outbound requests
    pub request_timeout: Duration,
    /// Attempts made by the retry wrapper around single page fetches
    pub retry_attempts: u32,
    /// Fixed delay between retry attempts
    pub retry_delay: Duration,
    /// Time-to-live of the in-memory catalog
    pub catalog_ttl: Duration,
    /// Optional file mirroring the catalog across restarts
    pub catalog_cache_file: Option<PathBuf>,
    /// Page ceiling for a full catalog crawl
    pub catalog_max_pages: u32,
    /// Pause between listing pages during a crawl
    pub catalog_page_delay: Duration,
    /// Browser origins allowed to call the API; empty allows any origin
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            base_candidates: defaults::BASE_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            retry_attempts: defaults::RETRY_ATTEMPTS,
            retry_delay: Duration::from_millis(defaults::RETRY_DELAY_MS),
            catalog_ttl: Duration::from_secs(defaults::CATALOG_TTL_SECS),
            catalog_cache_file: None,
            catalog_max_pages: defaults::CATALOG_MAX_PAGES,
            catalog_page_delay: Duration::from_millis(defaults::CATALOG_PAGE_DELAY_MS),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first if present
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Missing keys take their default. Malformed numbers are logged and also
    /// fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = Self::default();

        let base_candidates = lookup("BASE_CANDIDATES")
            .map(|raw| parse_candidates(&raw))
            .filter(|hosts| !hosts.is_empty())
            .unwrap_or(base.base_candidates);

        Self {
            host: lookup("HOST").unwrap_or(base.host),
            port: parse_or(&lookup, "PORT", base.port),
            base_candidates,
            user_agent: lookup("SCRAPER_UA")
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or(base.user_agent),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults::REQUEST_TIMEOUT_SECS,
            )),
            retry_attempts: parse_or(&lookup, "RETRY_ATTEMPTS", base.retry_attempts).max(1),
            retry_delay: Duration::from_millis(parse_or(
                &lookup,
                "RETRY_DELAY_MS",
                defaults::RETRY_DELAY_MS,
            )),
            catalog_ttl: Duration::from_secs(parse_or(
                &lookup,
                "CATALOG_TTL_SECS",
                defaults::CATALOG_TTL_SECS,
            )),
            catalog_cache_file: lookup("CATALOG_CACHE_FILE")
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            catalog_max_pages: parse_or(&lookup, "CATALOG_MAX_PAGES", base.catalog_max_pages)
                .max(1),
            catalog_page_delay: Duration::from_millis(parse_or(
                &lookup,
                "CATALOG_PAGE_DELAY_MS",
                defaults::CATALOG_PAGE_DELAY_MS,
            )),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_candidates(&raw))
                .filter(|origins| !origins.iter().any(|o| o == "*"))
                .unwrap_or_default(),
        }
    }
}

/// Split a comma separated URL list, dropping blanks and trailing slashes
fn parse_candidates(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid value {:?} for {}, using default", raw, key);
                default
            }
        },
        None => default,
    }
}
