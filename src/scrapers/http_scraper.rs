use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, ClientBuilder};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::Scraper;
use crate::core::retry::RetryConfig;
use crate::{HttpResponse, ScraperConfig, ScraperError, ScraperResult, StatsTracker};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum HttpScraperError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl From<HttpScraperError> for ScraperError {
    fn from(err: HttpScraperError) -> Self {
        match err {
            HttpScraperError::HttpError(e) => ScraperError::Transport(e),
        }
    }
}

/// reqwest-backed transport. The client is built once and reused for every
/// request so connections are pooled.
#[derive(Clone)]
pub struct HttpScraper {
    client: Client,
    retry_config: RetryConfig,
    stats: StatsTracker,
}

impl HttpScraper {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, HttpScraperError> {
        let client = ClientBuilder::new()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            retry_config: RetryConfig::default(),
            stats: StatsTracker::new(),
        })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self, HttpScraperError> {
        Self::new(&config.user_agent, config.request_timeout())
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_stats(mut self, stats: StatsTracker) -> Self {
        self.stats = stats;
        self
    }

    fn extract_headers(response: &reqwest::Response) -> HashMap<String, String> {
        response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|val| (k.to_string(), val.to_string())))
            .collect()
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn fetch_single(&self, url: Url) -> ScraperResult<HttpResponse> {
        let timestamp = Utc::now();
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(&response);
        let raw_body = response.bytes().await?;

        let body = String::from_utf8(raw_body.to_vec()).map_err(|e| {
            ScraperError::Processing(format!("Failed to decode response body from {}: {}", url, e))
        })?;

        Ok(HttpResponse {
            url,
            status,
            headers,
            body,
            timestamp,
            retry_count: 0,
            retry_history: HashMap::new(),
        })
    }

    fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    fn stats(&self) -> &StatsTracker {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::retry::{BackoffPolicy, CategoryConfig, RetryCategory, RetryCondition};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (HttpScraper, MockServer) {
        let server = MockServer::start().await;
        let scraper = HttpScraper::new(DEFAULT_USER_AGENT, Duration::from_secs(5))
            .unwrap()
            .with_retry_config(RetryConfig::none());
        (scraper, server)
    }

    fn fast_server_error_retries() -> RetryConfig {
        RetryConfig::none().with_category(
            RetryCategory::ServerError,
            CategoryConfig {
                max_retries: 2,
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(50),
                backoff_policy: BackoffPolicy::Constant,
                conditions: vec![RetryCondition::StatusCode(503)],
            },
        )
    }

    #[tokio::test]
    async fn test_get_profile_page() {
        let (scraper, mock_server) = setup().await;

        Mock::given(method("GET"))
            .and(query_param("page", "character"))
            .and(query_param("name", "Test Knight"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body></body></html>")
                    .insert_header("content-type", "text/html"),
            )
            .mount(&mock_server)
            .await;

        let mut url = Url::parse(&mock_server.uri()).unwrap();
        url.query_pairs_mut()
            .append_pair("page", "character")
            .append_pair("name", "Test Knight");
        let response = scraper.fetch(url).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "<html><body></body></html>");
        assert_eq!(response.retry_count, 0);
        assert_eq!(scraper.stats().get_stats().total_requests, 1);
    }

    #[tokio::test]
    async fn test_error_status_is_transport_failure() {
        let (scraper, mock_server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri())
            .unwrap()
            .join("/missing")
            .unwrap();
        let err = scraper.fetch(url).await.unwrap_err();

        assert!(err.is_transport());
        assert!(matches!(err, ScraperError::UpstreamStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_server_error_retries_then_gives_up() {
        let (scraper, mock_server) = setup().await;
        let scraper = scraper.with_retry_config(fast_server_error_retries());

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri()).unwrap();
        let err = scraper.fetch(url).await.unwrap_err();

        assert!(matches!(err, ScraperError::UpstreamStatus { status: 503, .. }));
        let stats = scraper.stats().get_stats();
        assert_eq!(stats.retry_count, 2);
        assert_eq!(stats.retry_reasons.get("ServerError"), Some(&2));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let scraper = HttpScraper::new(DEFAULT_USER_AGENT, Duration::from_secs(2))
            .unwrap()
            .with_retry_config(RetryConfig::none());

        // Nothing listens on the discard port.
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = scraper.fetch(url).await.unwrap_err();

        assert!(matches!(err, ScraperError::Transport(_)));
        assert_eq!(scraper.stats().get_stats().transport_failures, 1);
    }

    #[tokio::test]
    async fn test_invalid_utf8_body_is_processing_error() {
        let (scraper, mock_server) = setup().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfe, 0x3c]))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri()).unwrap();
        let err = scraper.fetch(url).await.unwrap_err();

        assert!(err.is_processing());
    }

    #[tokio::test]
    async fn test_configured_user_agent_is_sent() {
        let mock_server = MockServer::start().await;
        let config = ScraperConfig {
            user_agent: "TibiantisWatch/1.0".to_string(),
            ..ScraperConfig::default()
        };
        let scraper = HttpScraper::from_config(&config)
            .unwrap()
            .with_retry_config(RetryConfig::none());

        Mock::given(method("GET"))
            .and(header("user-agent", "TibiantisWatch/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri()).unwrap();
        let response = scraper.fetch(url).await.unwrap();

        assert_eq!(response.body, "ok");
    }
}
