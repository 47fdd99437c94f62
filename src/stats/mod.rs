use chrono::{DateTime, Duration, Utc};
use log::info;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ScrapingStats {
    pub start_time: DateTime<Utc>,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub transport_failures: usize,
    pub retry_count: usize,
    pub bytes_downloaded: usize,
    pub status_codes: HashMap<u16, usize>,
    pub retry_reasons: HashMap<String, usize>,
    pub average_response_time: f64, // in milliseconds
}

/// Shared request counters. Clones share the same underlying numbers, so one
/// tracker can be handed to the transport and read back by the scheduler.
#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<ScrapingStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ScrapingStats {
                start_time: Utc::now(),
                total_requests: 0,
                successful_requests: 0,
                failed_requests: 0,
                transport_failures: 0,
                retry_count: 0,
                bytes_downloaded: 0,
                status_codes: HashMap::new(),
                retry_reasons: HashMap::new(),
                average_response_time: 0.0,
            })),
        }
    }

    pub fn record_request(&self, status: u16, size: usize, duration: Duration) {
        let mut stats = self.stats.write();
        stats.total_requests += 1;

        if status < 400 {
            stats.successful_requests += 1;
        } else {
            stats.failed_requests += 1;
        }

        *stats.status_codes.entry(status).or_insert(0) += 1;
        stats.bytes_downloaded += size;

        let current_total = stats.average_response_time * (stats.total_requests - 1) as f64;
        let new_duration = duration.num_milliseconds() as f64;
        stats.average_response_time = (current_total + new_duration) / stats.total_requests as f64;
    }

    pub fn record_transport_failure(&self) {
        let mut stats = self.stats.write();
        stats.transport_failures += 1;
    }

    pub fn record_retry(&self, category: String) {
        let mut stats = self.stats.write();
        stats.retry_count += 1;
        *stats.retry_reasons.entry(category).or_insert(0) += 1;
    }

    pub fn get_stats(&self) -> ScrapingStats {
        self.stats.read().clone()
    }

    pub fn log_summary(&self) {
        let stats = self.stats.read();
        let uptime = Utc::now().signed_duration_since(stats.start_time);

        info!(
            "Scraping stats: uptime={}s requests={} ok={} failed={} transport_failures={} retries={} downloaded={:.2}MB avg_response={:.2}ms",
            uptime.num_seconds(),
            stats.total_requests,
            stats.successful_requests,
            stats.failed_requests,
            stats.transport_failures,
            stats.retry_count,
            stats.bytes_downloaded as f64 / 1_000_000.0,
            stats.average_response_time
        );

        if !stats.retry_reasons.is_empty() {
            info!("Retry reasons: {:?}", stats.retry_reasons);
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
