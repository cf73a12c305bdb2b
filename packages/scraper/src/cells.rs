//! Scalar typing for CSV cell text.
//!
//! CSV carries only text, while the record store hands back typed values.
//! Join keys and numeric attributes from both sides must compare equal, so
//! each cell is given the narrowest scalar type its text supports. This is
//! per-cell typing, not schema inference: two cells in one column may end
//! up with different types.

use serde_json::Value;

/// Cell spellings that mean "no value".
const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Types one CSV cell.
///
/// - null markers (including the empty string) become [`Value::Null`]
/// - integer text becomes an integer
/// - finite float text becomes a float
/// - `true`/`false` (any case) become booleans
/// - everything else stays a string, spelled exactly as in the file
#[must_use]
pub fn type_cell(raw: &str) -> Value {
    let trimmed = raw.trim();

    if NULL_MARKERS.contains(&trimmed) {
        return Value::Null;
    }

    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }

    if let Ok(f) = trimmed.parse::<f64>()
        && let Some(n) = serde_json::Number::from_f64(f)
    {
        return Value::Number(n);
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    Value::String(raw.to_owned())
}
