//! Jikan anime search API client.
//!
//! Provides a client for the Jikan v4 REST API with rate limiting,
//! request validation, and response normalization.
//!
//! ### Specification
//!
//! - **Endpoint**: `https://api.jikan.moe/v4/anime`
//! - **Authentication**: none (public API).
//! - **Rate Limiting**: Jikan allows roughly 3 requests per second;
//!   the client enforces a 400ms minimum interval between requests.
//! - **Errors**: 429 is surfaced as `RateLimited`; other non-2xx statuses
//!   as `HttpError`.
//!
//! These calls are never cached by the offline worker; the `/api/` bypass
//! rule keeps search results fresh.

pub mod error;
pub mod request;
pub mod response;

pub use error::JikanError;
pub use request::SearchRequest;
pub use response::{Anime, SearchResponse};

use reqwest::header;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default base URL for the Jikan API.
const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "mitsu-sw/0.1";

/// Minimum interval between requests (approx 3 requests/sec).
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(400);

/// Jikan API client configuration.
#[derive(Debug, Clone)]
pub struct JikanConfig {
    /// Base URL (default: https://api.jikan.moe/v4).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: mitsu-sw/0.x).
    pub user_agent: String,
}

impl Default for JikanConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Rate limiter to enforce request intervals.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// Jikan anime search API client.
#[derive(Debug, Clone)]
pub struct JikanClient {
    http: reqwest::Client,
    config: JikanConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl JikanClient {
    /// Create a new Jikan client with the given configuration.
    pub fn new(config: JikanConfig) -> Result<Self, JikanError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| JikanError::Network(Arc::new(e)))?;

        Ok(Self { http, config, rate_limiter: Arc::new(RateLimiter::new(MIN_REQUEST_INTERVAL)) })
    }

    /// Execute an anime search query.
    ///
    /// This method handles rate limiting, request validation, and response
    /// normalization.
    pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse, JikanError> {
        req.validate()?;

        self.rate_limiter.acquire().await;

        let start = Instant::now();
        let url = format!("{}/anime", self.config.base_url);

        tracing::debug!("searching Jikan API: q={}", req.q);

        let mut req = req;
        req.limit = Some(req.get_limit());

        let http_response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .query(&req)
            .send()
            .await
            .map_err(JikanError::from)?;

        let status = http_response.status();
        tracing::debug!("Jikan API response status: {}", status);

        if status == 429 {
            return Err(JikanError::RateLimited);
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(JikanError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await.map_err(JikanError::from)?;
        let response: SearchResponse =
            serde_json::from_slice(&bytes).map_err(|e| JikanError::Parse(e.to_string()))?;

        tracing::debug!(
            "search completed in {:?}, {} results",
            start.elapsed(),
            response.data.len()
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = JikanConfig::default();
        assert_eq!(config.base_url, "https://api.jikan.moe/v4");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent, "mitsu-sw/0.1");
    }

    #[test]
    fn test_client_new() {
        let client = JikanClient::new(JikanConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_search_rejects_empty_request() {
        let client = JikanClient::new(JikanConfig::default()).unwrap();
        let result = client.search(SearchRequest::default()).await;
        assert!(matches!(result, Err(JikanError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
