//! # form4kit - Incremental harvester for SEC Form 4 filings
//!
//! form4kit walks a filings metadata search API backwards in time, one day
//! at a time, resolves every insider-trading (Form 4) filing to its archive
//! URL and downloads the documents for downstream extraction.
//!
//! ## Features
//!
//! - **Backward date walk** - Pages through each day's results to exhaustion,
//!   then steps one day back until the end date is passed
//! - **Run-scoped deduplication** - A document is fetched at most once per
//!   crawl, even when day windows overlap
//! - **Throttled downloads** - Documents are fetched concurrently, with a
//!   pause after every burst of requests and a single retry on transient
//!   failures
//! - **Typed documents** - Plain-text submissions and parsed XML/HTML
//!   renderings are handed to a [`FilingSink`] of your choosing
//!
//! ## Basic Usage
//!
//! ```ignore
//! use chrono::NaiveDate;
//! use form4kit::{ArchiveSink, Harvester};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let harvester = Harvester::new("my-api-key", "research_tool/1.0 contact@example.com")?;
//!     let mut sink = ArchiveSink::new("filings");
//!
//!     let begin = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
//!     let end = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//!     let summary = harvester.run_crawl(begin, end, &mut sink).await?;
//!
//!     println!("{} documents over {} days", summary.documents_dispatched, summary.days_completed);
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod crawl;
mod dispatch;
mod download;
mod error;
mod metadata;
mod query;
mod resolver;
mod sink;
mod traits;

pub use config::{
    FORM_4_FILTER, HarvestConfig, HarvestUrls, MAX_PAGE_SIZE, RetryPolicy, ThrottleConfig,
};
pub use crate::core::Harvester;
pub use crawl::{CrawlCursor, CrawlSettings, CrawlSummary, Crawler};
pub use dispatch::dispatch;
pub use download::{Document, DocumentKind, IssueThrottle, download_all, fetch_document};
pub use error::{HarvestError, Result};
pub use metadata::{FilingMetadata, FilingsMetadataPage, TotalHits};
pub use query::FilingQuery;
pub use resolver::{ARCHIVE_PATH_MARKER, SeenUrls, canonical_url, resolve};
pub use sink::ArchiveSink;
pub use traits::{DocumentSource, FetchOutcome, FilingSink, MetadataSource};

/// Re-exported so sinks can name the parsed document type
pub use scraper::Html;

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
