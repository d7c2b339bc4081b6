//! HTTP fetching with a shared minimum-delay rate limiter
//!
//! All page requests for a crawl go through one [`RateLimiter`] so that the
//! configured minimum delay holds across every concurrent task, not per task.

use crate::config::CrawlConfig;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Result of fetching one page
///
/// Fetching never fails at the call site: transport errors come back as
/// code 0 with an empty body, and non-2xx responses keep their status code
/// with an empty body. Either way the page gets persisted.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// HTTP status code, or 0 when the request never produced a response
    pub code: u16,
    /// Response body for 2xx responses, empty otherwise
    pub body: String,
}

impl FetchOutcome {
    /// True when the response carried indexable content
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Enforces a minimum delay between consecutive requests
///
/// The lock is held across the sleep so that waiting tasks queue up behind
/// it and each one observes the delay relative to the previous request.
pub struct RateLimiter {
    min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_delay_ms: u64) -> Self {
        Self {
            min_delay: Duration::from_millis(min_delay_ms),
            last_request: Mutex::new(None),
        }
    }

    /// Waits until at least the minimum delay has passed since the last
    /// request, then records the current time as the new last request
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Builds the HTTP client used for all page fetches
///
/// # Arguments
///
/// * `config` - Crawl settings providing the user agent and referrer
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&config.referrer) {
        headers.insert(REFERER, value);
    }

    Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one page, honoring the shared rate limiter
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `limiter` - Shared rate limiter for this crawl
/// * `url` - Absolute URL of the page
pub async fn fetch_page(client: &Client, limiter: &RateLimiter, url: &str) -> FetchOutcome {
    limiter.acquire().await;

    match client.get(url).send().await {
        Ok(response) => {
            let code = response.status().as_u16();
            if response.status().is_success() {
                match response.text().await {
                    Ok(body) => FetchOutcome { code, body },
                    Err(e) => {
                        tracing::warn!("Failed to read body of {}: {}", url, e);
                        FetchOutcome {
                            code: 0,
                            body: String::new(),
                        }
                    }
                }
            } else {
                tracing::debug!("HTTP {} for {}", code, url);
                FetchOutcome {
                    code,
                    body: String::new(),
                }
            }
        }
        Err(e) => {
            tracing::warn!("Request to {} failed: {}", url, e);
            FetchOutcome {
                code: 0,
                body: String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;

    fn test_config() -> CrawlConfig {
        CrawlConfig {
            user_agent: "TestAgent/1.0".to_string(),
            referrer: "https://www.google.com".to_string(),
            min_request_delay_ms: 150,
            max_page_count: 100,
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&test_config()).is_ok());
    }

    #[test]
    fn test_fetch_outcome_success_range() {
        let ok = FetchOutcome {
            code: 200,
            body: "x".to_string(),
        };
        let not_found = FetchOutcome {
            code: 404,
            body: String::new(),
        };
        let failed = FetchOutcome {
            code: 0,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!not_found.is_success());
        assert!(!failed.is_success());
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(50);
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        // Two inter-request gaps of at least 50ms each
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_rate_limiter_first_request_is_immediate() {
        let limiter = RateLimiter::new(500);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
