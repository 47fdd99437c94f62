use crate::core::retry::RetryConfig;
use crate::{HttpResponse, ScraperError, ScraperResult, StatsTracker};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::sleep;
use url::Url;

#[derive(Clone, Debug)]
pub enum MockResponse {
    Page {
        status: u16,
        body: String,
        delay: Option<std::time::Duration>,
    },
    ConnectionFailure(String),
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        MockResponse::Page {
            status: 200,
            body: body.into(),
            delay: None,
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        MockResponse::Page {
            status,
            body: body.into(),
            delay: None,
        }
    }
}

/// In-memory transport serving canned responses per URL.
///
/// Each URL walks through its registered responses in order and keeps
/// repeating the last one. Unregistered URLs answer 404.
#[derive(Clone)]
pub struct MockScraper {
    retry_config: RetryConfig,
    routes: Arc<HashMap<String, Vec<MockResponse>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    stats: StatsTracker,
}

impl Default for MockScraper {
    fn default() -> Self {
        Self::new(RetryConfig::none())
    }
}

impl MockScraper {
    pub fn new(retry_config: RetryConfig) -> Self {
        Self {
            retry_config,
            routes: Arc::new(HashMap::new()),
            hits: Arc::new(Mutex::new(HashMap::new())),
            stats: StatsTracker::new(),
        }
    }

    pub fn with_responses(mut self, url: &Url, responses: Vec<MockResponse>) -> Self {
        Arc::make_mut(&mut self.routes).insert(url.to_string(), responses);
        self
    }

    pub fn with_page(self, url: &Url, body: impl Into<String>) -> Self {
        self.with_responses(url, vec![MockResponse::ok(body)])
    }

    /// Number of attempts made against `url`, retries included.
    pub fn hits(&self, url: &Url) -> usize {
        self.hits.lock().get(url.as_str()).copied().unwrap_or(0)
    }
}

#[async_trait]
impl crate::Scraper for MockScraper {
    async fn fetch_single(&self, url: Url) -> ScraperResult<HttpResponse> {
        let index = {
            let mut hits = self.hits.lock();
            let counter = hits.entry(url.to_string()).or_insert(0);
            *counter += 1;
            *counter - 1
        };

        let response = self
            .routes
            .get(url.as_str())
            .and_then(|responses| responses.get(index).or_else(|| responses.last()))
            .cloned()
            .unwrap_or_else(|| MockResponse::status(404, "Not Found"));

        match response {
            MockResponse::Page {
                status,
                body,
                delay,
            } => {
                if let Some(delay) = delay {
                    sleep(delay).await;
                }
                Ok(HttpResponse::new(url, status, body))
            }
            MockResponse::ConnectionFailure(reason) => Err(ScraperError::Connection(reason)),
        }
    }

    fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    fn stats(&self) -> &StatsTracker {
        &self.stats
    }
}
