//! Backward date walk over the filings index.
//!
//! The crawl starts at the most recent date and pages through each day's
//! results before stepping one day back, until it passes the end date:
//!
//! ```text
//! (begin, 0) ─► (begin, P) ─► ... page < P ─► (begin - 1, 0) ─► ... ─► date < end: stop
//! ```
//!
//! Walking backwards lets a restarted crawl begin from "now" and make steady
//! progress towards a fixed historical bound without any stored high-water
//! mark. The search index tends to return slightly overlapping windows at day
//! boundaries, so the set of URLs already fetched is kept for the whole run.

use chrono::{Days, NaiveDate};

use super::Harvester;
use super::config::{RetryPolicy, ThrottleConfig};
use super::dispatch::dispatch;
use super::download::download_all;
use super::error::{HarvestError, Result};
use super::query::FilingQuery;
use super::resolver::{SeenUrls, resolve};
use super::traits::{DocumentSource, FilingSink, MetadataSource};

/// Position of the next metadata query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlCursor {
    pub date: NaiveDate,
    pub offset: u32,
}

impl CrawlCursor {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, offset: 0 }
    }

    /// Moves to the next page of the same date. Returns `false`, leaving the
    /// cursor unchanged, when the offset would overflow.
    pub fn next_page(&mut self, page_size: u32) -> bool {
        match self.offset.checked_add(page_size) {
            Some(offset) => {
                self.offset = offset;
                true
            }
            None => false,
        }
    }

    /// Moves to the first page of the previous day. Returns `false` when the
    /// calendar has no earlier day.
    pub fn previous_day(&mut self) -> bool {
        match self.date.checked_sub_days(Days::new(1)) {
            Some(date) => {
                self.date = date;
                self.offset = 0;
                true
            }
            None => false,
        }
    }
}

/// Settings shared by every step of a crawl.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub filter: String,
    pub page_size: u32,
    pub archive_base: String,
    pub throttle: ThrottleConfig,
    pub retry: RetryPolicy,
}

/// Counters reported when a crawl finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub days_completed: u32,
    pub pages_queried: u32,
    pub documents_dispatched: u64,
}

/// Drives metadata queries, downloads and dispatch over a date range.
pub struct Crawler<'a, M: ?Sized, D: ?Sized> {
    metadata: &'a M,
    documents: &'a D,
    settings: CrawlSettings,
}

impl<'a, M, D> Crawler<'a, M, D>
where
    M: MetadataSource + ?Sized,
    D: DocumentSource + ?Sized,
{
    pub fn new(metadata: &'a M, documents: &'a D, settings: CrawlSettings) -> Self {
        Self {
            metadata,
            documents,
            settings,
        }
    }

    /// Crawls every date from `begin` back to `end`, both inclusive.
    ///
    /// Nothing is queried when `begin` is earlier than `end`. The first error
    /// from a query, a download or the sink ends the crawl; documents already
    /// dispatched stay with the sink.
    pub async fn run<S>(
        &self,
        begin: NaiveDate,
        end: NaiveDate,
        sink: &mut S,
    ) -> Result<CrawlSummary>
    where
        S: FilingSink + ?Sized,
    {
        let page_size = self.settings.page_size;
        let mut cursor = CrawlCursor::new(begin);
        let mut seen = SeenUrls::new();
        let mut summary = CrawlSummary::default();

        while cursor.date >= end {
            let query =
                FilingQuery::new(&self.settings.filter, cursor.date, page_size, cursor.offset);
            let page = self.metadata.query_filings(&query).await?;
            summary.pages_queried += 1;

            let urls: Vec<String> = page
                .filings
                .iter()
                .filter_map(|filing| resolve(filing, &self.settings.archive_base, &mut seen))
                .collect();

            tracing::debug!(
                date = %cursor.date,
                offset = cursor.offset,
                records = page.len(),
                new_urls = urls.len(),
                "Fetched metadata page"
            );

            if !urls.is_empty() {
                let documents = download_all(
                    self.documents,
                    &urls,
                    self.settings.throttle,
                    self.settings.retry,
                )
                .await?;
                for document in documents {
                    dispatch(document, cursor.date, sink)?;
                    summary.documents_dispatched += 1;
                }
            }

            if page.len() < page_size as usize {
                tracing::info!("{} complete", cursor.date);
                summary.days_completed += 1;
                if !cursor.previous_day() {
                    break;
                }
            } else if !cursor.next_page(page_size) {
                return Err(HarvestError::InvalidResponse(format!(
                    "Results for {} run past offset {}",
                    cursor.date, cursor.offset
                )));
            }
        }

        tracing::info!(
            days = summary.days_completed,
            pages = summary.pages_queried,
            documents = summary.documents_dispatched,
            "Crawl finished"
        );
        Ok(summary)
    }
}

impl Harvester {
    /// Settings for a crawl driven by this harvester's configuration.
    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            filter: self.filter.clone(),
            page_size: self.page_size,
            archive_base: self.archives_url.clone(),
            throttle: self.throttle,
            retry: self.retry,
        }
    }

    /// Harvests every Form 4 filing filed from `begin` back to `end`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use chrono::NaiveDate;
    /// use form4kit::{ArchiveSink, Harvester};
    ///
    /// let harvester = Harvester::new("my-api-key", "research_tool/1.0 contact@example.com")?;
    /// let mut sink = ArchiveSink::new("filings");
    /// let begin = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    /// let summary = harvester.run_crawl(begin, end, &mut sink).await?;
    /// ```
    pub async fn run_crawl<S>(
        &self,
        begin: NaiveDate,
        end: NaiveDate,
        sink: &mut S,
    ) -> Result<CrawlSummary>
    where
        S: FilingSink + ?Sized,
    {
        Crawler::new(self, self, self.crawl_settings())
            .run(begin, end, sink)
            .await
    }
}
