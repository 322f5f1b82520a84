//! Mapping filing metadata onto canonical archive URLs.

use std::collections::HashSet;

use super::metadata::FilingMetadata;

/// Path segment that precedes the `<cik>/<accession>/...` part of an EDGAR link.
pub const ARCHIVE_PATH_MARKER: &str = "Archives/edgar/data/";

const MARKUP_EXTENSIONS: [&str; 2] = [".xml", ".htm"];

/// Canonical URLs already scheduled for download during one crawl.
#[derive(Debug, Clone, Default)]
pub struct SeenUrls {
    urls: HashSet<String>,
}

impl SeenUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Records `url`; returns `false` if it was already present.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Builds the archive URL for a filing.
///
/// The XML/HTML rendering is preferred when `link_to_filing_details` points
/// at one; otherwise the plain-text rendering is used. Returns `None` when the
/// chosen link is missing or has no `Archives/edgar/data/` segment.
pub fn canonical_url(filing: &FilingMetadata, archive_base: &str) -> Option<String> {
    let details = filing.link_to_filing_details.as_deref()?;
    let link = if MARKUP_EXTENSIONS.iter().any(|ext| details.ends_with(ext)) {
        details
    } else {
        filing.link_to_txt.as_deref()?
    };

    let (_, path) = link.split_once(ARCHIVE_PATH_MARKER)?;
    Some(format!("{}/{}", archive_base.trim_end_matches('/'), path))
}

/// Resolves a filing to a URL that still needs fetching.
///
/// Filings without a ticker or without a details link are skipped, as are
/// filings whose canonical URL is already in `seen`. An accepted URL is added
/// to `seen` before it is returned.
pub fn resolve(filing: &FilingMetadata, archive_base: &str, seen: &mut SeenUrls) -> Option<String> {
    if filing.ticker.as_deref().is_none_or(str::is_empty) {
        return None;
    }
    if filing.link_to_filing_details.is_none() {
        return None;
    }

    let Some(url) = canonical_url(filing, archive_base) else {
        tracing::warn!(
            accession_no = filing.accession_no.as_deref().unwrap_or("unknown"),
            "Filing links have no archive path, skipping"
        );
        return None;
    };

    if seen.insert(url.clone()) {
        Some(url)
    } else {
        None
    }
}
