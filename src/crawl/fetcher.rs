//! HTTP fetching for the crawl stage
//!
//! Builds the shared HTTP client and fetches single pages with error
//! classification. Transient failures (5xx, timeouts, connection resets) are
//! retried through the shared retry policy; everything else fails the page
//! immediately.

use crate::config::CrawlConfig;
use crate::retry::RetryPolicy;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// A page fetch failure, classified
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Http(u16),

    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Body read failed: {0}")]
    Body(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(status) => *status == 429 || *status >= 500,
            FetchError::Timeout | FetchError::Connection(_) => true,
            FetchError::Body(_) => false,
        }
    }
}

/// A successfully fetched page
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    pub status_code: u16,
    pub body: String,
}

/// Builds the HTTP client shared by discovery and crawling
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one page with retry on transient failures
pub async fn fetch_page(
    client: &Client,
    url: &str,
    timeout: Duration,
    retry: &RetryPolicy,
) -> Result<FetchedPage, FetchError> {
    retry
        .run(
            || fetch_once(client, url, timeout),
            FetchError::is_transient,
        )
        .await
}

async fn fetch_once(client: &Client, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(classify_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http(status.as_u16()));
    }

    let final_url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Body(e.to_string()))?;

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        body,
    })
}

fn classify_reqwest_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Connection(error.to_string())
    } else {
        FetchError::Body(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&CrawlConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Http(503).is_transient());
        assert!(FetchError::Http(429).is_transient());
        assert!(FetchError::Timeout.is_transient());
        assert!(!FetchError::Http(404).is_transient());
        assert!(!FetchError::Http(403).is_transient());
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/page", server.uri());
        let page = fetch_page(&client, &url, timeout(), &RetryPolicy::none())
            .await
            .unwrap();

        assert_eq!(page.status_code, 200);
        assert_eq!(page.body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/missing", server.uri());
        let error = fetch_page(&client, &url, timeout(), &RetryPolicy::none())
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::Http(404)));
    }

    #[tokio::test]
    async fn test_fetch_retries_5xx() {
        let server = MockServer::start().await;
        // First attempt hits the 500 mock, which then expires
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let retry = RetryPolicy::new(&crate::config::RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
        });

        let client = Client::new();
        let url = format!("{}/flaky", server.uri());
        let page = fetch_page(&client, &url, timeout(), &retry).await.unwrap();

        assert_eq!(page.body, "recovered");
    }
}
