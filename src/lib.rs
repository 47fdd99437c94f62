pub mod core;
pub mod http;
pub mod parser;
pub mod scheduler;
pub mod scrapers;
pub mod service;
pub mod stats;
pub mod storage;

pub use core::{ScraperConfig, ScraperError, ScraperResult};
pub use http::HttpResponse;
pub use scheduler::Scheduler;
pub use scrapers::Scraper;
pub use service::{BedmageService, CharacterService, TibiantisClient};
pub use stats::StatsTracker;
