//! Numeric sign correction.

use field_data_dataset_models::Table;
use serde_json::{Number, Value};

use crate::{CorrectionError, require_column};

/// Absolute value of a JSON number, keeping integers as integers where the
/// result fits.
#[allow(clippy::cast_precision_loss)]
fn absolute(n: &Number) -> Option<Value> {
    if n.is_u64() {
        return Some(Value::Number(n.clone()));
    }
    if let Some(i) = n.as_i64() {
        return Some(
            i.checked_abs()
                .map_or_else(|| Value::from(i.unsigned_abs()), Value::from),
        );
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(f.abs()))
        .map(Value::Number)
}

/// Replaces every value in `column` with its absolute value.
///
/// Nulls pass through. Idempotent.
///
/// # Errors
///
/// Returns [`CorrectionError::MissingColumn`] if `column` is not in the
/// schema, or [`CorrectionError::NonNumeric`] for the first cell that is
/// neither a number nor null.
pub fn correct_sign(mut table: Table, column: &str) -> Result<Table, CorrectionError> {
    require_column(&table, column)?;

    for (index, row) in table.rows.iter_mut().enumerate() {
        let Some(value) = row.get_mut(column) else {
            continue;
        };

        let corrected = match value {
            Value::Null => continue,
            Value::Number(n) => absolute(n),
            _ => None,
        };

        let Some(corrected) = corrected else {
            return Err(CorrectionError::NonNumeric {
                column: column.to_string(),
                row: index,
                value: value.to_string(),
            });
        };

        *value = corrected;
    }

    Ok(table)
}
