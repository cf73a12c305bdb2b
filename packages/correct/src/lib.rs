#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Corrective transformations for the known defects in raw field records.
//!
//! Three independent steps, each taking a [`Table`] by value and returning
//! the corrected table:
//!
//! 1. [`swap::swap_columns`] reverses a column-swap defect,
//! 2. [`sign::correct_sign`] replaces a numeric column with its absolute
//!    value,
//! 3. [`canonical::canonicalize`] maps categorical spellings to their
//!    canonical form.
//!
//! [`apply_corrections`] runs them in that order. The order is part of the
//! contract: when the swapped pair includes the elevation or crop-type
//! column, the later steps must see the repaired layout.
//!
//! [`verify::verify_corrected`] checks the post-conditions on a finished
//! table.

pub mod canonical;
pub mod sign;
pub mod swap;
pub mod verify;

use field_data_dataset_models::{CategoricalRenameMap, ColumnSwapRule, Table};

pub use canonical::canonicalize;
pub use sign::correct_sign;
pub use swap::swap_columns;
pub use verify::{Violation, verify_corrected};

/// Errors that can occur while correcting a record set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrectionError {
    /// The swap rule names the same column twice.
    #[error("Column swap rule must name two distinct columns, got '{column}' twice")]
    InvalidSwapRule {
        /// The repeated column name.
        column: String,
    },

    /// A configured column is not part of the record schema.
    #[error("Column '{column}' is not present in the record schema")]
    MissingColumn {
        /// The missing column name.
        column: String,
    },

    /// A cell that must be numeric holds something else.
    #[error("Column '{column}' row {row} holds non-numeric value {value}")]
    NonNumeric {
        /// Column being corrected.
        column: String,
        /// Zero-based row index.
        row: usize,
        /// The offending value, rendered as JSON.
        value: String,
    },
}

/// Everything [`apply_corrections`] needs to know about the defects.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionPlan<'a> {
    /// The pair of columns exchanged at the source.
    pub swap: &'a ColumnSwapRule,
    /// Column whose sign must be non-negative.
    pub elevation_column: &'a str,
    /// Column holding the categorical crop type.
    pub crop_type_column: &'a str,
    /// Raw to canonical crop type spellings.
    pub rename_map: &'a CategoricalRenameMap,
}

/// Applies swap reversal, sign correction, and canonicalization, in that
/// order.
///
/// # Errors
///
/// Returns the first [`CorrectionError`] raised by any step; no partially
/// corrected table is returned.
pub fn apply_corrections(table: Table, plan: &CorrectionPlan<'_>) -> Result<Table, CorrectionError> {
    let table = swap_columns(table, plan.swap)?;
    let table = correct_sign(table, plan.elevation_column)?;
    canonicalize(table, plan.crop_type_column, plan.rename_map)
}

pub(crate) fn require_column(table: &Table, column: &str) -> Result<(), CorrectionError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(CorrectionError::MissingColumn {
            column: column.to_string(),
        })
    }
}
