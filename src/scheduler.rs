use crate::service::{CharacterService, IngestReport};
use log::{error, info};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Periodically ingests newly seen online characters.
pub struct Scheduler {
    service: Arc<CharacterService>,
    period: Duration,
}

impl Scheduler {
    pub fn new(service: Arc<CharacterService>, period: Duration) -> Self {
        Self { service, period }
    }

    /// Runs one ingest pass. A failed pass is logged and does not stop
    /// the schedule.
    pub async fn tick(&self) -> Option<IngestReport> {
        info!("Running scheduled ingest of online characters");
        let report = match self.service.add_new_online_characters().await {
            Ok(report) => {
                info!(
                    "Scheduled ingest done: {} added, {} failed, {} already stored",
                    report.added, report.failed, report.already_stored
                );
                Some(report)
            }
            Err(e) => {
                error!("Scheduled ingest failed: {}", e);
                None
            }
        };
        self.service.client().stats().log_summary();
        report
    }

    /// Ticks immediately, then every period, until `shutdown` resolves.
    /// A tick in progress is finished before stopping.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("Scheduler started, running every {:?}", self.period);
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
        info!("Scheduler stopped");
    }
}
