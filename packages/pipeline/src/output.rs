//! CSV export of the merged dataset.

use std::io::Write;

use field_data_dataset_models::Table;
use serde_json::Value;

/// Errors that can occur while writing output.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// CSV encoding or the underlying writer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text written for one cell. Null is the empty string; strings are written
/// as-is so padded values survive.
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Writes `table` as CSV: a header row in schema order, then one line per
/// row. Cells a row does not carry are written empty.
///
/// # Errors
///
/// Returns [`OutputError`] if encoding or writing fails.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<(), OutputError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(&table.columns)?;
    for row in &table.rows {
        csv_writer.write_record(
            table
                .columns
                .iter()
                .map(|c| row.get(c).map(cell_text).unwrap_or_default()),
        )?;
    }

    csv_writer.flush()?;
    Ok(())
}
