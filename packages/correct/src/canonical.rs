//! Categorical canonicalization.

use field_data_dataset_models::{CategoricalRenameMap, Table};
use serde_json::Value;

use crate::{CorrectionError, require_column};

/// Replaces each string in `column` with its canonical spelling from `map`.
///
/// Strings without an entry, nulls, and non-string values are left alone.
/// Idempotent, since [`CategoricalRenameMap`] never chains.
///
/// # Errors
///
/// Returns [`CorrectionError::MissingColumn`] if `column` is not in the
/// schema.
pub fn canonicalize(
    mut table: Table,
    column: &str,
    map: &CategoricalRenameMap,
) -> Result<Table, CorrectionError> {
    require_column(&table, column)?;

    for row in &mut table.rows {
        if let Some(Value::String(raw)) = row.get_mut(column)
            && let Some(canonical) = map.get(raw)
        {
            canonical.clone_into(raw);
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use field_data_dataset_models::Row;
    use serde_json::json;

    use super::*;

    fn crops(values: &[Value]) -> Table {
        let rows = values
            .iter()
            .map(|v| {
                let mut row = Row::new();
                row.insert("Crop_type".to_string(), v.clone());
                row
            })
            .collect();
        Table::new(vec!["Crop_type".to_string()], rows)
    }

    fn crop_map() -> CategoricalRenameMap {
        let entries: BTreeMap<String, String> = [
            ("cassava ", "cassava"),
            ("wheatn", "wheat"),
            ("teaa", "tea"),
            ("tea ", "tea"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        CategoricalRenameMap::new(entries).unwrap()
    }

    #[test]
    fn maps_known_spellings() {
        let table = crops(&[json!("cassava "), json!("wheatn"), json!("teaa"), json!("tea ")]);
        let fixed = canonicalize(table, "Crop_type", &crop_map()).unwrap();
        let values: Vec<&Value> = fixed.column_values("Crop_type").collect();
        assert_eq!(
            values,
            vec![&json!("cassava"), &json!("wheat"), &json!("tea"), &json!("tea")]
        );
    }

    #[test]
    fn unknown_values_pass_through() {
        let table = crops(&[json!("maize"), json!("Banana"), Value::Null, json!(3)]);
        let fixed = canonicalize(table.clone(), "Crop_type", &crop_map()).unwrap();
        assert_eq!(fixed, table);
    }

    #[test]
    fn is_idempotent() {
        let table = crops(&[json!("cassava "), json!("rice"), json!("wheatn")]);
        let once = canonicalize(table, "Crop_type", &crop_map()).unwrap();
        let twice = canonicalize(once.clone(), "Crop_type", &crop_map()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_missing_column() {
        let err = canonicalize(crops(&[]), "crop", &crop_map()).unwrap_err();
        assert!(matches!(err, CorrectionError::MissingColumn { .. }));
    }
}
