use std::time::Duration;

use super::error::{HarvestError, Result};

/// Filter for original Form 4 filings (amendments and N-4 excluded). The two
/// `{}` placeholders receive the lower and upper bound of the filing date.
pub const FORM_4_FILTER: &str =
    r#"formType:"4" AND formType:(NOT "N-4") AND formType:(NOT "4/A") AND filedAt:[{} TO {}]"#;

/// Largest page the metadata API will return.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Configuration for the harvester
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// API key sent as the `Authorization` header
    pub api_key: String,
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Metadata queries allowed per second
    pub query_rate_limit: u32,
    /// Records requested per metadata page
    pub page_size: u32,
    /// Query filter template, see [`FORM_4_FILTER`]
    pub filter: String,
    /// Issuance throttle for document downloads
    pub throttle: ThrottleConfig,
    /// Retry policy for document downloads
    pub retry: RetryPolicy,
    /// Endpoints for the metadata API and document archive
    pub base_urls: HarvestUrls,
}

/// Base URLs for the two services the harvester talks to
#[derive(Debug, Clone)]
pub struct HarvestUrls {
    /// Metadata query endpoint (POST)
    pub query: String,
    /// Document archive host; canonical URLs are built under it
    pub archives: String,
}

/// Pause the issuer for `pause` after every `burst` requests issued.
///
/// This limits how fast new fetches are started, not how many are in
/// flight: fetches issued before a pause keep running through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub burst: usize,
    pub pause: Duration,
}

/// How a document fetch reacts to transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per URL, the first one included
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub backoff: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            burst: 9,
            pause: Duration::from_secs(1),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(1),
        }
    }
}

impl Default for HarvestUrls {
    fn default() -> Self {
        Self {
            query: "https://api.sec-api.io".to_string(),
            archives: "https://archive.sec-api.io".to_string(),
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            user_agent: format!("form4kit/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            query_rate_limit: 10,
            page_size: MAX_PAGE_SIZE,
            filter: FORM_4_FILTER.to_string(),
            throttle: ThrottleConfig::default(),
            retry: RetryPolicy::default(),
            base_urls: HarvestUrls::default(),
        }
    }
}

impl HarvestConfig {
    /// Creates a config with default settings and the given credentials.
    ///
    /// ```ignore
    /// use form4kit::{Harvester, HarvestConfig};
    ///
    /// let config = HarvestConfig::new("my-api-key", "research_tool/1.0 contact@example.com");
    /// let harvester = Harvester::with_config(config)?;
    /// ```
    pub fn new(api_key: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }

    /// Builds a config from the process environment.
    ///
    /// `SEC_API_KEY` is required. `SEC_USER_AGENT`, `SEC_QUERY_URL` and
    /// `SEC_ARCHIVE_URL` override their defaults when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SEC_API_KEY")
            .map_err(|_| HarvestError::ConfigError("SEC_API_KEY is not set".to_string()))?;

        let mut config = Self {
            api_key,
            ..Self::default()
        };
        if let Ok(user_agent) = std::env::var("SEC_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Ok(query) = std::env::var("SEC_QUERY_URL") {
            config.base_urls.query = query;
        }
        if let Ok(archives) = std::env::var("SEC_ARCHIVE_URL") {
            config.base_urls.archives = archives;
        }
        Ok(config)
    }

    pub fn with_base_urls(mut self, base_urls: HarvestUrls) -> Self {
        self.base_urls = base_urls;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
