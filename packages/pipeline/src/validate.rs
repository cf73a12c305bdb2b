//! Post-correction checks for an exported dataset.
//!
//! Reads a CSV produced by a previous run (or by anything else with the
//! same columns) and reports the records that break the correction
//! invariants.

use std::path::Path;

use field_data_correct::{CorrectionError, Violation, verify_corrected};
use field_data_pipeline_models::PipelineConfig;
use field_data_scraper::ScrapeError;
use field_data_scraper::csv_download::parse_csv;

/// Errors that prevent a file from being checked at all.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    /// The input file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The input is not a CSV table.
    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] ScrapeError),

    /// A configured column is missing from the input.
    #[error(transparent)]
    Column(#[from] CorrectionError),
}

/// Checks the CSV at `path` against the columns and vocabulary in `config`.
///
/// # Errors
///
/// Returns [`ValidateError`] if the file cannot be read or parsed, or lacks
/// a checked column.
pub fn validate_csv(path: &Path, config: &PipelineConfig) -> Result<Vec<Violation>, ValidateError> {
    let bytes = std::fs::read(path).map_err(|source| ValidateError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let table = parse_csv(&bytes, b',', None)?;

    log::debug!("Checking {} record(s) from {}", table.len(), path.display());

    Ok(verify_corrected(
        &table,
        &config.columns.elevation,
        &config.columns.crop_type,
        config.validation.vocabulary(),
    )?)
}
