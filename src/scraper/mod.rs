//! Scraper module for fetching HTML content from the upstream site
//!
//! The site is served from several mirrors. [`PageFetcher`] tries each
//! configured base host in order and returns the first successful page.

pub mod retry;

pub use retry::retry;

use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// Why a single host failed to serve a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostFailure {
    /// Connection, DNS or timeout failure
    Network(String),
    /// Non-success HTTP status
    Status(u16),
    /// The body could not be read
    Body(String),
}

impl fmt::Display for HostFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostFailure::Network(msg) => write!(f, "network error: {}", msg),
            HostFailure::Status(code) => write!(f, "server returned status {}", code),
            HostFailure::Body(msg) => write!(f, "failed to read response body: {}", msg),
        }
    }
}

/// Errors that can occur while fetching upstream pages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Every candidate host failed for one path
    #[error("all hosts failed for {path}, last error: {last}")]
    AllHostsFailed { path: String, last: HostFailure },

    /// No candidate hosts are configured
    #[error("no candidate hosts configured")]
    NoHosts,

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// A page fetched from one of the candidate hosts
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The HTML content of the page
    pub html: String,
    /// Full URL that served the page
    pub url: String,
}

/// HTTP client that falls back across mirror hosts
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    hosts: Vec<String>,
    user_agent: String,
}

impl PageFetcher {
    /// Create a fetcher for the given hosts
    pub fn new(
        hosts: Vec<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            hosts: hosts
                .into_iter()
                .map(|h| h.trim_end_matches('/').to_string())
                .collect(),
            user_agent: user_agent.into(),
        })
    }

    /// Create a fetcher from application configuration
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            config.base_candidates.clone(),
            config.user_agent.clone(),
            config.request_timeout,
        )
    }

    /// Candidate hosts in the order they are tried
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Fetch `path` from the first host that answers with a success status
    ///
    /// Each host gets exactly one attempt. When all fail, the error carries
    /// the last host's failure.
    pub async fn fetch(&self, path: &str, referer: Option<&str>) -> Result<FetchedPage, FetchError> {
        let mut last = None;

        for host in &self.hosts {
            let url = format!("{}{}", host, path);
            debug!("Fetching {}", url);

            match self.fetch_url(&url, referer).await {
                Ok(html) => return Ok(FetchedPage { html, url }),
                Err(failure) => {
                    warn!("Host {} failed for {}: {}", host, path, failure);
                    last = Some(failure);
                }
            }
        }

        match last {
            Some(last) => Err(FetchError::AllHostsFailed {
                path: path.to_string(),
                last,
            }),
            None => Err(FetchError::NoHosts),
        }
    }

    async fn fetch_url(&self, url: &str, referer: Option<&str>) -> Result<String, HostFailure> {
        let mut request = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "es-ES,es;q=0.9,en;q=0.8");

        if let Some(referer) = referer {
            request = request.header("Referer", referer);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                HostFailure::Network("connection timeout".to_string())
            } else if e.is_connect() {
                HostFailure::Network("failed to connect to server".to_string())
            } else {
                HostFailure::Network(e.to_string())
            }
        })?;

        let status: StatusCode = response.status();
        if !status.is_success() {
            return Err(HostFailure::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| HostFailure::Body(e.to_string()))
    }
}
