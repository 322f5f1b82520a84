//! Filing metadata returned by the search API.
//!
//! # Examples
//!
//! ```ignore
//! use chrono::NaiveDate;
//! use form4kit::{FilingQuery, Harvester, MetadataSource, FORM_4_FILTER};
//!
//! let harvester = Harvester::new("my-api-key", "research_tool/1.0 contact@example.com")?;
//! let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//! let page = harvester
//!     .query_filings(&FilingQuery::new(FORM_4_FILTER, date, 200, 0))
//!     .await?;
//!
//! for filing in &page.filings {
//!     println!("{:?} {:?}", filing.ticker, filing.link_to_filing_details);
//! }
//! ```

use super::Harvester;
use super::error::Result;
use super::query::FilingQuery;
use super::traits::MetadataSource;
use async_trait::async_trait;
use serde::Deserialize;

/// One page of search results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilingsMetadataPage {
    /// Hit count for the whole query, not just this page
    #[serde(default)]
    pub total: Option<TotalHits>,
    pub filings: Vec<FilingMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    pub relation: String,
}

/// A single filing as described by the search index
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingMetadata {
    /// Issuer ticker; absent or empty for issuers without a listed security
    #[serde(default)]
    pub ticker: Option<String>,
    /// Link to the `.xml`/`.htm` rendering of the filing
    #[serde(default)]
    pub link_to_filing_details: Option<String>,
    /// Link to the legacy plain-text rendering
    #[serde(default)]
    pub link_to_txt: Option<String>,
    #[serde(default)]
    pub form_type: Option<String>,
    #[serde(default)]
    pub filed_at: Option<String>,
    #[serde(default)]
    pub accession_no: Option<String>,
    #[serde(default)]
    pub cik: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

impl FilingsMetadataPage {
    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.filings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filings.is_empty()
    }
}

#[async_trait]
impl MetadataSource for Harvester {
    /// Runs one metadata query against the search API.
    ///
    /// # Errors
    ///
    /// * `HarvestError::TransportError` - The request could not be completed
    /// * `HarvestError::InvalidResponse` - The API answered with a non-success status
    /// * `HarvestError::DecodeError` - The body is not a filings page
    async fn query_filings(&self, query: &FilingQuery) -> Result<FilingsMetadataPage> {
        tracing::debug!(
            from = query.from,
            size = query.size,
            filter = query.filter(),
            "Querying filings"
        );
        let body = self.post_json(query).await?;
        Ok(serde_json::from_str::<FilingsMetadataPage>(&body)?)
    }
}
