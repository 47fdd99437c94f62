pub mod config;
mod errors;
pub mod retry;

pub use config::ScraperConfig;
pub use errors::{ScraperError, ScraperResult};
