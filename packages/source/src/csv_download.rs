//! CSV download resource bridge.
//!
//! Wraps [`field_data_scraper::csv_download::CsvDownloadScraper`] behind the
//! [`TableResource`] contract so the pipeline can fetch weather-station
//! tables without knowing about HTTP or CSV.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use field_data_dataset_models::Table;
use field_data_scraper::csv_download::CsvDownloadScraper;

use crate::{SourceError, TableResource};

/// Fetches CSV tables over HTTP or from disk.
#[derive(Debug, Clone, Default)]
pub struct CsvResource {
    /// Whether bodies are gzip-compressed.
    pub gzip: bool,
    /// Optional whole-request timeout for HTTP downloads.
    pub timeout: Option<Duration>,
    /// Additional HTTP headers.
    pub headers: BTreeMap<String, String>,
}

impl CsvResource {
    /// Creates a resource with default settings (uncompressed, no timeout,
    /// no extra headers).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the download timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Marks bodies as gzip-compressed.
    #[must_use]
    pub const fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    fn scraper(&self, locator: &str) -> CsvDownloadScraper {
        let mut scraper = CsvDownloadScraper::new(locator).with_gzip(self.gzip);

        if let Some(timeout) = self.timeout {
            scraper = scraper.with_timeout(timeout);
        }

        for (key, value) in &self.headers {
            scraper = scraper.with_header(key, value);
        }

        scraper
    }
}

#[async_trait]
impl TableResource for CsvResource {
    async fn fetch_table(&self, locator: &str) -> Result<Table, SourceError> {
        self.scraper(locator)
            .fetch_table()
            .await
            .map_err(|e| SourceError::MalformedResource {
                locator: locator.to_string(),
                message: e.to_string(),
            })
    }
}
