use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("HTTP request failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Failed to decode filings metadata: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Giving up on {url} after {attempts} attempts: {source}")]
    ExhaustedRetry {
        url: String,
        attempts: u32,
        source: Box<HarvestError>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
