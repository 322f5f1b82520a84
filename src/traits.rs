//! Trait definitions for the seams of the crawl pipeline.
//!
//! The crawl talks to three collaborators: the metadata search API, the
//! document archive and whatever consumes the downloaded bodies. Each one is
//! a trait so the driver can be exercised against in-memory doubles. The
//! `Harvester` client implements the two network-facing traits.

use super::error::{HarvestError, Result};
use super::metadata::FilingsMetadataPage;
use super::query::FilingQuery;
use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::Html;

/// Source of paginated filing metadata.
#[async_trait]
pub trait MetadataSource {
    /// Executes one metadata query and returns the resulting page.
    async fn query_filings(&self, query: &FilingQuery) -> Result<FilingsMetadataPage>;
}

/// Outcome of a single attempt at fetching a document body.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The full response body
    Body(String),
    /// Connection-level, timeout or rate-limit failure; worth one more try
    Transient(HarvestError),
    /// Anything else; the batch is aborted
    Fatal(HarvestError),
}

/// Source of raw document bodies, addressed by canonical URL.
#[async_trait]
pub trait DocumentSource {
    /// Performs one GET attempt for `url`. Retrying is the caller's concern.
    async fn fetch_text(&self, url: &str) -> FetchOutcome;
}

/// Downstream consumer of downloaded filings.
///
/// Implementations own extraction and persistence. Returning an error aborts
/// the crawl.
pub trait FilingSink {
    /// Consumes a legacy plain-text filing
    fn consume_text(&mut self, body: String, date: NaiveDate) -> Result<()>;
    /// Consumes a parsed XML/HTML filing
    fn consume_markup(&mut self, document: Html, date: NaiveDate) -> Result<()>;
}
