//! Column-swap reversal.
//!
//! Renaming `a -> b` and `b -> a` in one pass would leave two columns named
//! `b` for an instant and lose one of them. The swap is therefore done as a
//! three-way rename through a temporary name that collides with nothing in
//! the schema.

use field_data_dataset_models::{ColumnSwapRule, Table};

use crate::{CorrectionError, require_column};

/// Starting point for the temporary column name.
pub const TEMP_COLUMN_BASE: &str = "__temp_name_for_swap__";

/// Returns a column name not present in `columns`, built by appending `_`
/// to [`TEMP_COLUMN_BASE`] until it is unique.
#[must_use]
pub fn temp_column_name(columns: &[String]) -> String {
    let mut name = TEMP_COLUMN_BASE.to_string();
    while columns.iter().any(|c| *c == name) {
        name.push('_');
    }
    name
}

/// Renames `from` to `to` in the schema and in every row.
///
/// The caller guarantees `to` is not already in use. The column keeps its
/// position in the schema.
fn rename_column(table: &mut Table, from: &str, to: &str) {
    for column in &mut table.columns {
        if column == from {
            to.clone_into(column);
        }
    }

    for row in &mut table.rows {
        if let Some(value) = row.remove(from) {
            row.insert(to.to_string(), value);
        }
    }
}

/// Exchanges the names of the two columns in `rule`, which exchanges their
/// values in every record.
///
/// Applying the same rule twice restores the original table.
///
/// # Errors
///
/// Returns [`CorrectionError::InvalidSwapRule`] if the rule names one
/// column twice, or [`CorrectionError::MissingColumn`] if either column is
/// absent from the schema.
pub fn swap_columns(mut table: Table, rule: &ColumnSwapRule) -> Result<Table, CorrectionError> {
    let ColumnSwapRule { column_a, column_b } = rule;

    if column_a == column_b {
        return Err(CorrectionError::InvalidSwapRule {
            column: column_a.clone(),
        });
    }
    require_column(&table, column_a)?;
    require_column(&table, column_b)?;

    let temp = temp_column_name(&table.columns);

    rename_column(&mut table, column_a, &temp);
    rename_column(&mut table, column_b, column_a);
    rename_column(&mut table, &temp, column_b);

    Ok(table)
}

#[cfg(test)]
mod tests {
    use field_data_dataset_models::Row;
    use serde_json::{Value, json};

    use super::*;

    fn yield_elevation_table() -> Table {
        let Value::Object(row) = json!({"Field_ID": 1, "Annual_yield": 300, "Elevation": 9}) else {
            unreachable!()
        };
        Table::new(
            vec![
                "Field_ID".to_string(),
                "Annual_yield".to_string(),
                "Elevation".to_string(),
            ],
            vec![row],
        )
    }

    #[test]
    fn swaps_values_between_columns() {
        let rule = ColumnSwapRule::new("Annual_yield", "Elevation");
        let swapped = swap_columns(yield_elevation_table(), &rule).unwrap();

        assert_eq!(swapped.rows[0]["Annual_yield"], json!(9));
        assert_eq!(swapped.rows[0]["Elevation"], json!(300));
        assert_eq!(swapped.rows[0]["Field_ID"], json!(1));
    }

    #[test]
    fn preserves_schema_order() {
        let rule = ColumnSwapRule::new("Annual_yield", "Elevation");
        let swapped = swap_columns(yield_elevation_table(), &rule).unwrap();
        assert_eq!(swapped.columns, vec!["Field_ID", "Elevation", "Annual_yield"]);
    }

    #[test]
    fn applying_twice_restores_original() {
        let rule = ColumnSwapRule::new("Annual_yield", "Elevation");
        let original = yield_elevation_table();
        let once = swap_columns(original.clone(), &rule).unwrap();
        let twice = swap_columns(once.clone(), &rule).unwrap();
        let thrice = swap_columns(twice.clone(), &rule).unwrap();

        assert_ne!(once, original);
        assert_eq!(twice, original);
        assert_eq!(thrice, once);
    }

    #[test]
    fn temp_name_avoids_existing_columns() {
        let columns = vec![
            TEMP_COLUMN_BASE.to_string(),
            format!("{TEMP_COLUMN_BASE}_"),
            "Elevation".to_string(),
        ];
        assert_eq!(temp_column_name(&columns), format!("{TEMP_COLUMN_BASE}__"));
    }

    #[test]
    fn swaps_even_when_temp_base_is_a_real_column() {
        let mut row = Row::new();
        row.insert(TEMP_COLUMN_BASE.to_string(), json!("keep"));
        row.insert("a".to_string(), json!(1));
        row.insert("b".to_string(), json!(2));
        let table = Table::new(
            vec![TEMP_COLUMN_BASE.to_string(), "a".to_string(), "b".to_string()],
            vec![row],
        );

        let swapped = swap_columns(table, &ColumnSwapRule::new("a", "b")).unwrap();
        assert_eq!(swapped.rows[0]["a"], json!(2));
        assert_eq!(swapped.rows[0]["b"], json!(1));
        assert_eq!(swapped.rows[0][TEMP_COLUMN_BASE], json!("keep"));
        assert_eq!(swapped.columns.len(), 3);
    }

    #[test]
    fn rows_missing_a_cell_keep_it_missing_under_the_new_name() {
        let mut row = Row::new();
        row.insert("a".to_string(), json!(1));
        let table = Table::new(vec!["a".to_string(), "b".to_string()], vec![row]);

        let swapped = swap_columns(table, &ColumnSwapRule::new("a", "b")).unwrap();
        assert_eq!(swapped.rows[0].get("a"), None);
        assert_eq!(swapped.rows[0]["b"], json!(1));
    }

    #[test]
    fn rejects_identical_columns() {
        let err = swap_columns(yield_elevation_table(), &ColumnSwapRule::new("Elevation", "Elevation"))
            .unwrap_err();
        assert!(matches!(err, CorrectionError::InvalidSwapRule { .. }));
    }

    #[test]
    fn rejects_unknown_column() {
        let err = swap_columns(yield_elevation_table(), &ColumnSwapRule::new("Elevation", "Slope"))
            .unwrap_err();
        assert_eq!(
            err,
            CorrectionError::MissingColumn {
                column: "Slope".to_string()
            }
        );
    }
}
