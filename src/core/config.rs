use crate::parser::roster::DEFAULT_HEADER_ROWS;
use crate::parser::TimezoneOffsets;
use crate::scrapers::http_scraper::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::storage::StorageType;
use crate::{ScraperError, ScraperResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const CONFIG_ENV_VAR: &str = "TIBIANTIS_CONFIG";
pub const DEFAULT_BASE_URL: &str = "https://tibiantis.online/";
/// One week.
pub const MAX_LOGIN_COOLDOWN_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: Url,
    pub roster_page: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub timezone_offsets: TimezoneOffsets,
    pub roster_header_rows: usize,
    pub login_cooldown_minutes: i64,
    pub ingest_interval_secs: u64,
    pub ingest_concurrency: usize,
    pub storage: StorageType,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            roster_page: "whoisonline".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            timezone_offsets: TimezoneOffsets::default(),
            roster_header_rows: DEFAULT_HEADER_ROWS,
            login_cooldown_minutes: 100,
            ingest_interval_secs: 120,
            ingest_concurrency: 4,
            storage: StorageType::default(),
        }
    }
}

impl ScraperConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScraperResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Reads the file named by `TIBIANTIS_CONFIG`, or falls back to defaults.
    pub fn from_env() -> ScraperResult<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ScraperResult<()> {
        if self.base_url.cannot_be_a_base() {
            return Err(ScraperError::Config(format!(
                "base_url '{}' cannot carry a query",
                self.base_url
            )));
        }
        if self.ingest_concurrency == 0 {
            return Err(ScraperError::Config(
                "ingest_concurrency must be at least 1".to_string(),
            ));
        }
        if !(0..=MAX_LOGIN_COOLDOWN_MINUTES).contains(&self.login_cooldown_minutes) {
            return Err(ScraperError::Config(format!(
                "login_cooldown_minutes must be between 0 and {}, got {}",
                MAX_LOGIN_COOLDOWN_MINUTES, self.login_cooldown_minutes
            )));
        }
        if self.ingest_interval_secs == 0 {
            return Err(ScraperError::Config(
                "ingest_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timezone_offsets(mut self, offsets: TimezoneOffsets) -> Self {
        self.timezone_offsets = offsets;
        self
    }

    pub fn with_storage(mut self, storage: StorageType) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_ingest_concurrency(mut self, concurrency: usize) -> Self {
        self.ingest_concurrency = concurrency;
        self
    }

    pub fn with_login_cooldown_minutes(mut self, minutes: i64) -> Self {
        self.login_cooldown_minutes = minutes;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ingest_interval(&self) -> Duration {
        Duration::from_secs(self.ingest_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.timezone_offsets.offset_seconds("CEST"), Some(7200));
        assert_eq!(config.timezone_offsets.offset_seconds("CET"), Some(3600));
        assert_eq!(config.login_cooldown_minutes, 100);
        assert_eq!(config.ingest_interval(), Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"base_url": "http://localhost:8080/", "ingest_interval_secs": 900, "storage": {{"type": "memory"}}}}"#
        )
        .unwrap();

        let config = ScraperConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.ingest_interval_secs, 900);
        assert_eq!(config.roster_page, "whoisonline");
        assert_eq!(config.storage, StorageType::Memory);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let config = ScraperConfig::default().with_ingest_concurrency(0);
        assert!(matches!(config.validate(), Err(ScraperError::Config(_))));
    }

    #[test]
    fn test_login_cooldown_must_be_in_range() {
        for minutes in [-1, MAX_LOGIN_COOLDOWN_MINUTES + 1, i64::MAX] {
            let config = ScraperConfig::default().with_login_cooldown_minutes(minutes);
            assert!(
                matches!(config.validate(), Err(ScraperError::Config(_))),
                "{minutes} should be rejected"
            );
        }
        for minutes in [0, 100, MAX_LOGIN_COOLDOWN_MINUTES] {
            let config = ScraperConfig::default().with_login_cooldown_minutes(minutes);
            assert!(config.validate().is_ok(), "{minutes} should be accepted");
        }
    }

    #[test]
    fn test_malformed_file_is_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            ScraperConfig::from_file(file.path()),
            Err(ScraperError::Json(_))
        ));
    }
}
