use crate::storage::StorageError;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Upstream returned status {status} for {url}")]
    UpstreamStatus { url: Url, status: u16 },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScraperError {
    /// True for failures reaching upstream: network errors and non-success
    /// statuses that survived the retry loop.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ScraperError::Transport(_)
                | ScraperError::Connection(_)
                | ScraperError::UpstreamStatus { .. }
        )
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, ScraperError::Processing(_))
    }
}

pub type ScraperResult<T> = Result<T, ScraperError>;
