use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use scraper::Html;

use super::error::Result;
use super::traits::FilingSink;

/// Stores each filing body on disk, one directory per filing date.
///
/// Files are numbered in arrival order within a date:
/// `<root>/2024-05-01/0001.txt`, `<root>/2024-05-01/0002.html`, ...
/// Parsed markup is written back out as serialized HTML.
#[derive(Debug)]
pub struct ArchiveSink {
    root: PathBuf,
    counters: HashMap<NaiveDate, u32>,
}

impl ArchiveSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counters: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write(&mut self, date: NaiveDate, extension: &str, contents: &str) -> Result<()> {
        let dir = self.root.join(date.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&dir)?;

        let counter = self.counters.entry(date).or_insert(0);
        *counter += 1;
        let path = dir.join(format!("{:04}.{}", counter, extension));
        fs::write(&path, contents)?;

        tracing::debug!("Stored filing at {}", path.display());
        Ok(())
    }
}

impl FilingSink for ArchiveSink {
    fn consume_text(&mut self, body: String, date: NaiveDate) -> Result<()> {
        self.write(date, "txt", &body)
    }

    fn consume_markup(&mut self, document: Html, date: NaiveDate) -> Result<()> {
        self.write(date, "html", &document.html())
    }
}
