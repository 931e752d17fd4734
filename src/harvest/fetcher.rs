//! HTTP fetcher implementation
//!
//! This module handles all requests to the listing site, including:
//! - Building the HTTP client with the per-process client identity
//! - GET and form-encoded POST requests
//! - Bounded retry with a fixed delay
//! - Parsing successful responses into queryable HTML documents

use crate::config::FetchConfig;
use crate::HarvestError;
use rand::{rng, Rng};
use reqwest::Client;
use scraper::Html;
use std::time::Duration;

/// A request against the listing site
///
/// A POST always carries its form body; there is no way to build one without.
#[derive(Debug, Clone, Copy)]
pub enum PageRequest<'a> {
    Get,
    Post(&'a [(&'a str, &'a str)]),
}

impl PageRequest<'_> {
    fn method_name(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post(_) => "POST",
        }
    }
}

/// Retry policy applied to every listing-site request
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, first one included
    pub max_attempts: u32,

    /// Sleep between a failed attempt and the next one
    pub delay: Duration,
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay(),
        }
    }
}

/// Picks one client identity from the pool
///
/// Called once per process; the choice holds for the whole run.
pub fn pick_user_agent(pool: &[String]) -> Option<&str> {
    if pool.is_empty() {
        return None;
    }
    let i = rng().random_range(0..pool.len());
    Some(pool[i].as_str())
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
/// * `user_agent` - The client identity sent with every request
///
/// # Example
///
/// ```no_run
/// use station_harvest::config::FetchConfig;
/// use station_harvest::harvest::build_http_client;
///
/// let config = FetchConfig::default();
/// let client = build_http_client(&config, "TestAgent/1.0").unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig, user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches listing-site pages with bounded retry
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Fetches `url` and parses the body as HTML
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Parse body, return document |
    /// | Any other status | Log, sleep `delay`, retry |
    /// | Transport error / timeout | Log, sleep `delay`, retry |
    /// | `max_attempts` failures | `FetchExhausted` |
    ///
    /// No sleep follows the final failed attempt.
    pub async fn fetch(&self, url: &str, request: PageRequest<'_>) -> crate::Result<Html> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            match self.fetch_once(url, request).await {
                Ok(body) => return Ok(Html::parse_document(&body)),
                Err(e) => {
                    tracing::warn!(
                        "Attempt {} of {} failed for {} {}: {}",
                        attempt,
                        max_attempts,
                        request.method_name(),
                        url,
                        e
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        Err(HarvestError::FetchExhausted {
            url: url.to_string(),
            attempts: max_attempts,
        })
    }

    /// Sends a single request and returns the body of a 2xx response
    async fn fetch_once(&self, url: &str, request: PageRequest<'_>) -> crate::Result<String> {
        let builder = match request {
            PageRequest::Get => self.client.get(url),
            PageRequest::Post(form) => self.client.post(url).form(form),
        };

        let response = builder.send().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })
    }
}
