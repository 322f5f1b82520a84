use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware, state::InMemoryState,
    state::NotKeyed,
};
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT,
};
use std::num::NonZeroU32;
use std::sync::Arc;

use super::config::{HarvestConfig, RetryPolicy, ThrottleConfig};
use super::error::{HarvestError, Result};
use super::traits::FetchOutcome;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const ARCHIVE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml";

type Governor = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Authenticated client for the filings metadata API and document archive.
///
/// One `Harvester` holds a single HTTP session that every request in a crawl
/// shares. The session carries the API key and user agent as default headers;
/// gzip negotiation is left to reqwest.
///
/// Metadata queries pass through a token bucket limiter. Document downloads
/// are paced separately by the issuance throttle in [`crate::download_all`],
/// which mirrors the archive's own tolerance of roughly nine requests per
/// second.
///
/// # Examples
///
/// ```ignore
/// use form4kit::Harvester;
///
/// let harvester = Harvester::new("my-api-key", "research_tool/1.0 contact@example.com")?;
/// ```
#[derive(Debug, Clone)]
pub struct Harvester {
    /// HTTP client with authentication headers installed
    pub(crate) client: reqwest::Client,

    /// Token bucket rate limiter for metadata queries
    pub(crate) rate_limiter: Arc<Governor>,

    /// Metadata query endpoint
    pub(crate) query_url: String,

    /// Archive host for canonical document URLs
    pub(crate) archives_url: String,

    pub(crate) page_size: u32,
    pub(crate) filter: String,
    pub(crate) throttle: ThrottleConfig,
    pub(crate) retry: RetryPolicy,
}

impl Harvester {
    /// Creates a harvester with default endpoints and crawl settings.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Key for the metadata API, also accepted by the archive
    /// * `user_agent` - Identifier sent with every request
    pub fn new(api_key: &str, user_agent: &str) -> Result<Self> {
        Self::with_config(HarvestConfig::new(api_key, user_agent))
    }

    /// Creates a harvester from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::ConfigError` if a header value is malformed, the
    /// query rate limit or page size is zero, or the HTTP client cannot be
    /// built.
    pub fn with_config(config: HarvestConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| HarvestError::ConfigError(format!("Invalid user agent: {}", e)))?,
        );
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| HarvestError::ConfigError(format!("Invalid API key: {}", e)))?;
        api_key.set_sensitive(true);
        headers.insert(AUTHORIZATION, api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| HarvestError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(config.query_rate_limit).ok_or_else(|| {
                HarvestError::ConfigError("Query rate limit must be greater than zero".to_string())
            })?,
        )));

        if config.page_size == 0 {
            return Err(HarvestError::ConfigError(
                "Page size must be greater than zero".to_string(),
            ));
        }
        if config.retry.max_attempts == 0 {
            return Err(HarvestError::ConfigError(
                "Retry policy needs at least one attempt".to_string(),
            ));
        }

        Ok(Harvester {
            client,
            rate_limiter,
            query_url: config.base_urls.query,
            archives_url: config.base_urls.archives,
            page_size: config.page_size,
            filter: config.filter,
            throttle: config.throttle,
            retry: config.retry,
        })
    }

    /// Posts a JSON payload to the metadata endpoint and returns the body.
    ///
    /// The body is serialized up front so the exact byte length can be sent
    /// as `Content-Length`. Failures are not retried here.
    pub(crate) async fn post_json<T>(&self, payload: &T) -> Result<String>
    where
        T: serde::Serialize + ?Sized,
    {
        self.rate_limiter.until_ready().await;

        let body = serde_json::to_vec(payload)
            .map_err(|e| HarvestError::ConfigError(format!("Failed to encode query: {}", e)))?;
        let response = self
            .client
            .post(&self.query_url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(HarvestError::InvalidResponse(format!(
                "Unexpected status code: {} for URL: {}. Response preview: {}",
                status,
                self.query_url,
                error_body.chars().take(200).collect::<String>()
            )));
        }

        Ok(response.text().await?)
    }

    /// Performs a single GET against the archive.
    ///
    /// Connection failures (including a server hanging up before or while
    /// sending the body), timeouts and HTTP 429 come back as
    /// `FetchOutcome::Transient`; every other failure is `Fatal`.
    pub(crate) async fn get_text(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).header(ACCEPT, ARCHIVE_ACCEPT).send().await {
            Ok(response) => response,
            Err(e) if is_transient(&e) => return FetchOutcome::Transient(e.into()),
            Err(e) => return FetchOutcome::Fatal(e.into()),
        };

        match response.status() {
            status if status.is_success() => match response.text().await {
                Ok(body) => FetchOutcome::Body(body),
                Err(e) if is_transient(&e) => FetchOutcome::Transient(e.into()),
                Err(e) => FetchOutcome::Fatal(e.into()),
            },
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                FetchOutcome::Transient(HarvestError::RateLimitExceeded)
            }
            status => FetchOutcome::Fatal(HarvestError::InvalidResponse(format!(
                "Unexpected status code: {} for URL: {}",
                status, url
            ))),
        }
    }

    /// Returns the metadata query endpoint.
    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    /// Returns the archive host canonical URLs are built under.
    pub fn archives_url(&self) -> &str {
        &self.archives_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

/// Connection-level failures: refused or dropped connections, timeouts and
/// bodies cut off mid-stream.
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request() || error.is_body()
}
