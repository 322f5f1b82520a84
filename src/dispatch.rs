use chrono::NaiveDate;

use super::download::Document;
use super::error::Result;
use super::traits::FilingSink;

/// Hands a downloaded document to the matching consumer of `sink`.
pub fn dispatch<S>(document: Document, date: NaiveDate, sink: &mut S) -> Result<()>
where
    S: FilingSink + ?Sized,
{
    match document {
        Document::Text(body) => sink.consume_text(body, date),
        Document::Markup(html) => sink.consume_markup(html, date),
    }
}
