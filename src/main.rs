use log::info;
use std::sync::Arc;
use tibiantis_scraper::scrapers::HttpScraper;
use tibiantis_scraper::storage::create_store;
use tibiantis_scraper::{
    CharacterService, Scheduler, ScraperConfig, StatsTracker, TibiantisClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module("selectors", log::LevelFilter::Warn)
        .filter_module("html5ever", log::LevelFilter::Error)
        .parse_default_env()
        .init();

    let config = ScraperConfig::from_env()?;
    config.validate()?;

    let stats = StatsTracker::new();
    let scraper = HttpScraper::from_config(&config)?.with_stats(stats.clone());
    let client = TibiantisClient::new(Arc::new(scraper), &config);
    let store = create_store(&config.storage).await?;
    let service = Arc::new(CharacterService::new(client, store, &config));

    info!("Scraping {} with storage {:?}", config.base_url, config.storage);
    Scheduler::new(service, config.ingest_interval())
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await;

    stats.log_summary();
    Ok(())
}
