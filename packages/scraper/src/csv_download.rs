//! CSV file downloader and parser.
//!
//! Downloads a CSV (optionally gzip-compressed) from a URL, or reads it
//! from the local filesystem, and returns the rows as a [`Table`] whose
//! schema is the header row.

use std::collections::BTreeMap;
use std::io::Read as _;
use std::time::Duration;

use field_data_dataset_models::{Row, Table};

use crate::ScrapeError;
use crate::cells::type_cell;

/// Fetches one CSV resource.
///
/// Locators with an `http://` or `https://` scheme are downloaded; any
/// other locator (optionally prefixed with `file://`) is read from disk.
#[derive(Debug, Clone)]
pub struct CsvDownloadScraper {
    /// URL or path of the CSV file.
    locator: String,
    /// Additional HTTP headers for the download request.
    headers: BTreeMap<String, String>,
    /// Whether the body is gzip-compressed.
    is_gzipped: bool,
    /// Field delimiter byte (defaults to `,`).
    delimiter: u8,
    /// Optional cap on the number of records to parse.
    max_records: Option<u64>,
    /// Optional whole-request timeout for HTTP downloads.
    timeout: Option<Duration>,
}

impl CsvDownloadScraper {
    /// Creates a new `CsvDownloadScraper` for the given locator with default
    /// settings (comma-delimited, not gzipped, no record limit, no timeout).
    #[must_use]
    pub fn new(locator: &str) -> Self {
        Self {
            locator: locator.to_owned(),
            headers: BTreeMap::new(),
            is_gzipped: false,
            delimiter: b',',
            max_records: None,
            timeout: None,
        }
    }

    /// Marks the body as gzip-compressed so that it is decompressed before
    /// CSV parsing.
    #[must_use]
    pub const fn with_gzip(mut self, gzipped: bool) -> Self {
        self.is_gzipped = gzipped;
        self
    }

    /// Sets the field delimiter (e.g. `b'\t'` for TSV files).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Limits the number of records that will be parsed from the file.
    #[must_use]
    pub const fn with_max_records(mut self, max: u64) -> Self {
        self.max_records = Some(max);
        self
    }

    /// Bounds how long an HTTP download may take in total.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds an HTTP header to include in the download request.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Whether the locator names a remote resource.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.locator.starts_with("http://") || self.locator.starts_with("https://")
    }

    /// Builds a [`reqwest::Client`] with the configured headers and timeout.
    fn build_client(&self) -> Result<reqwest::Client, ScrapeError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &self.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScrapeError::Parse(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| ScrapeError::Parse(format!("invalid header value '{value}': {e}")))?;
            header_map.insert(name, val);
        }

        let mut builder = reqwest::Client::builder().default_headers(header_map);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(ScrapeError::Http)
    }

    /// Reads the raw body from the network or disk.
    async fn read_body(&self) -> Result<Vec<u8>, ScrapeError> {
        if self.is_remote() {
            let client = self.build_client()?;
            let response = client
                .get(&self.locator)
                .send()
                .await?
                .error_for_status()?;
            let bytes = response.bytes().await?;
            log::debug!("Downloaded {} bytes from {}", bytes.len(), self.locator);
            return Ok(bytes.to_vec());
        }

        let path = self.locator.strip_prefix("file://").unwrap_or(&self.locator);
        let bytes = tokio::fs::read(path).await?;
        log::debug!("Read {} bytes from {path}", bytes.len());
        Ok(bytes)
    }

    /// Fetches and parses the whole resource.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the resource cannot be read, fails to
    /// decompress, or is not parseable as CSV with a header row.
    pub async fn fetch_table(&self) -> Result<Table, ScrapeError> {
        let bytes = self.read_body().await?;

        // ── Decompress if needed ────────────────────────────────────────
        let csv_bytes: Vec<u8> = if self.is_gzipped {
            let mut decoder = flate2::read::GzDecoder::new(&bytes[..]);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            log::debug!("Decompressed to {} bytes", decompressed.len());
            decompressed
        } else {
            bytes
        };

        let table = parse_csv(&csv_bytes, self.delimiter, self.max_records)?;
        log::info!(
            "Parsed {} records from CSV at {}",
            table.len(),
            self.locator
        );

        Ok(table)
    }
}

/// Parses CSV bytes into a [`Table`].
///
/// The first row is the header; header names are trimmed. Short rows are
/// padded with nulls, surplus cells are ignored.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if there is no usable header row or a
/// header name repeats, or [`ScrapeError::Csv`] if the data is not valid
/// CSV.
pub fn parse_csv(bytes: &[u8], delimiter: u8, max_records: Option<u64>) -> Result<Table, ScrapeError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let csv_headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if csv_headers.iter().all(String::is_empty) {
        return Err(ScrapeError::Parse(
            "CSV file contains no header row".to_owned(),
        ));
    }

    for (i, header) in csv_headers.iter().enumerate() {
        if csv_headers[..i].contains(header) {
            return Err(ScrapeError::Parse(format!(
                "CSV header repeats column '{header}'"
            )));
        }
    }

    let mut rows: Vec<Row> = Vec::new();

    for result in reader.records() {
        let record = result?;

        let mut row = Row::new();
        for (i, header) in csv_headers.iter().enumerate() {
            row.insert(header.clone(), type_cell(record.get(i).unwrap_or("")));
        }
        rows.push(row);

        if let Some(max) = max_records
            && rows.len() as u64 >= max
        {
            log::info!("Reached max_records limit ({max}), stopping CSV parse");
            break;
        }
    }

    Ok(Table::new(csv_headers, rows))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use serde_json::Value;

    use super::*;

    const WEATHER_CSV: &str = "Field_ID,Weather_station\n1,STN_A\n2,STN_B\n3,\n";

    #[test]
    fn parses_header_and_typed_cells() {
        let table = parse_csv(WEATHER_CSV.as_bytes(), b',', None).unwrap();
        assert_eq!(table.columns, vec!["Field_ID", "Weather_station"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0]["Field_ID"], Value::from(1));
        assert_eq!(table.rows[1]["Weather_station"], Value::from("STN_B"));
        assert_eq!(table.rows[2]["Weather_station"], Value::Null);
    }

    #[test]
    fn pads_short_rows_with_null() {
        let table = parse_csv(b"a,b,c\n1,2\n", b',', None).unwrap();
        assert_eq!(table.rows[0]["c"], Value::Null);
    }

    #[test]
    fn rejects_missing_header() {
        let err = parse_csv(b"", b',', None).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(_)));
    }

    #[test]
    fn rejects_repeated_header_names() {
        let err = parse_csv(b"Field_ID,Rainfall, Rainfall\n1,10,20\n", b',', None).unwrap_err();
        assert!(
            matches!(&err, ScrapeError::Parse(msg) if msg.contains("'Rainfall'")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn honors_max_records_and_delimiter() {
        let table = parse_csv(b"a\tb\n1\tx\n2\ty\n3\tz\n", b'\t', Some(2)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1]["b"], Value::from("y"));
    }

    #[tokio::test]
    async fn reads_local_file_locator() {
        let dir = std::env::temp_dir().join("field_data_scraper_test_local");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("weather.csv");
        std::fs::write(&path, WEATHER_CSV).unwrap();

        let locator = format!("file://{}", path.display());
        let scraper = CsvDownloadScraper::new(&locator);
        assert!(!scraper.is_remote());

        let table = scraper.fetch_table().await.unwrap();
        assert_eq!(table.len(), 3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn reads_gzipped_file() {
        let dir = std::env::temp_dir().join("field_data_scraper_test_gzip");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("weather.csv.gz");

        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(WEATHER_CSV.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let table = CsvDownloadScraper::new(path.to_str().unwrap())
            .with_gzip(true)
            .fetch_table()
            .await
            .unwrap();
        assert_eq!(table.columns, vec!["Field_ID", "Weather_station"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let err = CsvDownloadScraper::new("/nonexistent/field_data/weather.csv")
            .fetch_table()
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Io(_)));
    }
}
