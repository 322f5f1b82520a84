//! Request payload for the filings metadata API.
//!
//! Every query targets a single filing day: the filter template is expanded
//! with the same date as the lower and upper bound of a `filedAt` range.

use chrono::NaiveDate;
use serde::Serialize;

/// A single metadata search request.
///
/// Built fresh for every page; nothing about it is shared between calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingQuery {
    pub query: QueryClause,
    pub from: u32,
    pub size: u32,
    pub sort: Vec<SortClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryClause {
    pub query_string: QueryString,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryString {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortClause {
    #[serde(rename = "filedAt")]
    pub filed_at: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortOrder {
    pub order: String,
}

impl FilingQuery {
    /// Builds the query for one page of filings filed on `date`.
    ///
    /// # Arguments
    ///
    /// * `filter` - Template with two `{}` placeholders for the date range bounds
    /// * `date` - The filing day to query
    /// * `size` - Number of records to request
    /// * `from` - Offset of the first record within the day's results
    pub fn new(filter: &str, date: NaiveDate, size: u32, from: u32) -> Self {
        Self {
            query: QueryClause {
                query_string: QueryString {
                    query: expand_filter(filter, date),
                },
            },
            from,
            size,
            sort: vec![SortClause {
                filed_at: SortOrder {
                    order: "desc".to_string(),
                },
            }],
        }
    }

    /// The expanded filter string
    pub fn filter(&self) -> &str {
        &self.query.query_string.query
    }
}

fn expand_filter(template: &str, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d").to_string();
    template.replacen("{}", &date, 1).replacen("{}", &date, 1)
}
