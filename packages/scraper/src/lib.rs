#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Retrieval of remote tabular resources.
//!
//! [`csv_download::CsvDownloadScraper`] downloads a CSV file over HTTP (or
//! reads it from disk) and parses it into a
//! [`Table`](field_data_dataset_models::Table). Cell text is typed by
//! [`cells::type_cell`].
//!
//! This crate knows nothing about field records or weather stations; it
//! only turns a locator into rows.

pub mod cells;
pub mod csv_download;

/// Errors that can occur while fetching or parsing a resource.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Parsing the response body failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
