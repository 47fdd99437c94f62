use crate::core::retry::{RetryConfig, RetryState};
use crate::{HttpResponse, ScraperError, ScraperResult, StatsTracker};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use tokio::time::sleep;
use url::Url;

/// Transport used by the engine to reach the upstream site.
///
/// Implementors only provide a single attempt; `fetch` wraps it with the
/// retry policy, statistics and the status check.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn fetch_single(&self, url: Url) -> ScraperResult<HttpResponse>;
    fn retry_config(&self) -> &RetryConfig;
    fn stats(&self) -> &StatsTracker;

    async fn fetch(&self, url: Url) -> ScraperResult<HttpResponse> {
        let start_time = Utc::now();
        let mut state = RetryState::new();

        loop {
            info!("Fetching URL: {}", url);
            let response = match self.fetch_single(url.clone()).await {
                Ok(response) => response,
                Err(err) if err.is_transport() => {
                    if let Some((category, delay)) =
                        self.retry_config().should_retry_transport(&mut state)
                    {
                        self.stats().record_retry(format!("{:?}", category));
                        warn!(
                            "Retrying URL after transport failure: {} (attempt={}/{}, delay={:?}): {}",
                            url,
                            state.counts.get(&category).copied().unwrap_or(0),
                            self.retry_config().max_retries(&category),
                            delay,
                            err
                        );
                        sleep(delay).await;
                        continue;
                    }
                    self.stats().record_transport_failure();
                    return Err(err);
                }
                Err(err) => return Err(err),
            };
            debug!(
                "Received response: status={}, body_length={}",
                response.status,
                response.body.len()
            );

            if let Some((category, delay)) =
                self.retry_config()
                    .should_retry(&mut state, response.status, &response.body)
            {
                self.stats().record_retry(format!("{:?}", category));
                warn!(
                    "Retry triggered for URL: {} (category={:?}, attempt={}/{}, delay={:?})",
                    url,
                    category,
                    state.counts.get(&category).copied().unwrap_or(0),
                    self.retry_config().max_retries(&category),
                    delay
                );

                sleep(delay).await;
                continue;
            }

            info!(
                "Request completed for URL: {} (total_retries={}, status={})",
                url, state.total_retries, response.status
            );
            debug!("Retry history for {}: {:?}", url, state.counts);

            let duration = Utc::now().signed_duration_since(start_time);
            self.stats()
                .record_request(response.status, response.body.len(), duration);

            if !response.is_success() {
                return Err(ScraperError::UpstreamStatus {
                    url,
                    status: response.status,
                });
            }

            return Ok(HttpResponse {
                retry_count: state.total_retries,
                retry_history: state.counts,
                ..response
            });
        }
    }
}
