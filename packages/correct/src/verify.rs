//! Post-correction checks.
//!
//! A corrected table must have no negative elevations and, when a canonical
//! crop vocabulary is known, no crop types outside it. These checks only
//! cover the defects the corrections target; they are not general data
//! validation.

use std::fmt;

use field_data_dataset_models::Table;
use serde_json::Value;

use crate::{CorrectionError, require_column};

/// A record that does not satisfy the post-correction invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// A negative value in the sign-corrected column.
    Negative {
        /// Zero-based row index.
        row: usize,
        /// Column name.
        column: String,
        /// The offending value.
        value: f64,
    },
    /// A non-numeric, non-null value in the sign-corrected column.
    NotNumeric {
        /// Zero-based row index.
        row: usize,
        /// Column name.
        column: String,
    },
    /// A categorical value outside the canonical vocabulary.
    UnknownCategory {
        /// Zero-based row index.
        row: usize,
        /// Column name.
        column: String,
        /// The offending value, rendered as JSON.
        value: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative { row, column, value } => {
                write!(f, "row {row}: {column} is negative ({value})")
            }
            Self::NotNumeric { row, column } => write!(f, "row {row}: {column} is not numeric"),
            Self::UnknownCategory { row, column, value } => {
                write!(f, "row {row}: {column} value {value} is not canonical")
            }
        }
    }
}

/// Checks a corrected table against the post-correction invariants.
///
/// When `vocabulary` is `None` the crop-type column is not checked. An
/// empty result means the table is clean.
///
/// # Errors
///
/// Returns [`CorrectionError::MissingColumn`] if a checked column is not
/// in the schema.
pub fn verify_corrected(
    table: &Table,
    elevation_column: &str,
    crop_type_column: &str,
    vocabulary: Option<&[String]>,
) -> Result<Vec<Violation>, CorrectionError> {
    require_column(table, elevation_column)?;
    if vocabulary.is_some() {
        require_column(table, crop_type_column)?;
    }

    let mut violations = Vec::new();

    for (row, value) in table.column_values(elevation_column).enumerate() {
        match value {
            Value::Null => {}
            Value::Number(n) => {
                if let Some(f) = n.as_f64()
                    && f < 0.0
                {
                    violations.push(Violation::Negative {
                        row,
                        column: elevation_column.to_string(),
                        value: f,
                    });
                }
            }
            _ => violations.push(Violation::NotNumeric {
                row,
                column: elevation_column.to_string(),
            }),
        }
    }

    if let Some(vocabulary) = vocabulary {
        for (row, value) in table.column_values(crop_type_column).enumerate() {
            let known = value
                .as_str()
                .is_some_and(|s| vocabulary.iter().any(|v| v == s));
            if !known {
                violations.push(Violation::UnknownCategory {
                    row,
                    column: crop_type_column.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    Ok(violations)
}
