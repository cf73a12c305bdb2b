#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Left-outer join of corrected field records with weather-station records.
//!
//! Every field record appears in the output at least once. Weather columns
//! of field records with no matching station row are [`Value::Null`]. When
//! the reference table repeats a key, [`DuplicateKeyPolicy`] decides between
//! one output row per match and a hard failure.

use std::collections::{BTreeMap, BTreeSet};

use field_data_dataset_models::{MergedDataset, Row, Table};
use serde_json::Value;
use strum_macros::{AsRefStr, Display};

pub use field_data_dataset_models::DuplicateKeyPolicy;

/// Suffix given to a left-side column whose name also appears on the right.
pub const LEFT_SUFFIX: &str = "_x";
/// Suffix given to a right-side column whose name also appears on the left.
pub const RIGHT_SUFFIX: &str = "_y";

/// Which input of the join an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum JoinSide {
    /// The field records.
    Left,
    /// The weather-station records.
    Right,
}

/// Errors that can occur during the join.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// The join key is not part of one side's schema.
    #[error("Join key '{key}' is missing from the {side} table")]
    MissingKey {
        /// The side lacking the key.
        side: JoinSide,
        /// The join key column name.
        key: String,
    },

    /// The reference table repeats a key and duplicates are rejected.
    #[error("Reference table has more than one row for key '{value}'")]
    DuplicateKey {
        /// Canonical text of the repeated key.
        value: String,
    },

    /// Suffixing an overlapping column produced a name already in use.
    #[error("Output column '{column}' would appear more than once")]
    DuplicateColumn {
        /// The colliding output name.
        column: String,
    },
}

/// Canonical text used to compare join keys across sources.
///
/// Strings compare as written. Numbers compare by value, so `1`, `1.0`, and
/// the string `"1"` all produce `"1"`. Null has no key text and never
/// matches anything.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn key_text(value: &Value) -> Option<String> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return Some(n.to_string());
            }
            let f = n.as_f64()?;
            if f.fract() == 0.0 && f.abs() < MAX_EXACT {
                Some((f as i64).to_string())
            } else {
                Some(f.to_string())
            }
        }
        other => Some(other.to_string()),
    }
}

/// Output names for each input column, with overlap suffixes applied.
struct OutputSchema {
    left: Vec<(String, String)>,
    right: Vec<(String, String)>,
}

impl OutputSchema {
    fn new(left: &Table, right: &Table, key: &str) -> Self {
        let left_names: BTreeSet<&str> = left.columns.iter().map(String::as_str).collect();
        let right_names: BTreeSet<&str> = right
            .columns
            .iter()
            .map(String::as_str)
            .filter(|c| *c != key)
            .collect();

        let left = left
            .columns
            .iter()
            .map(|c| {
                let out = if right_names.contains(c.as_str()) {
                    format!("{c}{LEFT_SUFFIX}")
                } else {
                    c.clone()
                };
                (c.clone(), out)
            })
            .collect();

        let right = right
            .columns
            .iter()
            .filter(|c| *c != key)
            .map(|c| {
                let out = if left_names.contains(c.as_str()) {
                    format!("{c}{RIGHT_SUFFIX}")
                } else {
                    c.clone()
                };
                (c.clone(), out)
            })
            .collect();

        Self { left, right }
    }

    fn columns(&self) -> Vec<String> {
        self.left
            .iter()
            .chain(&self.right)
            .map(|(_, out)| out.clone())
            .collect()
    }

    fn check_unique(&self) -> Result<(), MergeError> {
        let mut seen = BTreeSet::new();
        for (_, out) in self.left.iter().chain(&self.right) {
            if !seen.insert(out.as_str()) {
                return Err(MergeError::DuplicateColumn {
                    column: out.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Indexes reference rows by key text, in reference order.
fn index_reference(
    right: &Table,
    key: &str,
    policy: DuplicateKeyPolicy,
) -> Result<BTreeMap<String, Vec<usize>>, MergeError> {
    let mut index: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for (i, value) in right.column_values(key).enumerate() {
        let Some(text) = key_text(value) else {
            continue;
        };
        if policy == DuplicateKeyPolicy::Reject && index.contains_key(&text) {
            return Err(MergeError::DuplicateKey { value: text });
        }
        index.entry(text).or_default().push(i);
    }

    Ok(index)
}

fn require_key(table: &Table, key: &str, side: JoinSide) -> Result<(), MergeError> {
    if table.has_column(key) {
        Ok(())
    } else {
        Err(MergeError::MissingKey {
            side,
            key: key.to_string(),
        })
    }
}

/// Left-outer joins `left` with `right` on the `key` column.
///
/// Output columns are every left column followed by every right column
/// except the key. Non-key names present on both sides get
/// [`LEFT_SUFFIX`] and [`RIGHT_SUFFIX`]. The output has at least as many
/// rows as `left`, and exactly as many when `right` keys are unique.
///
/// # Errors
///
/// * [`MergeError::MissingKey`] if either schema lacks `key`
/// * [`MergeError::DuplicateKey`] if `policy` is
///   [`DuplicateKeyPolicy::Reject`] and `right` repeats a key
/// * [`MergeError::DuplicateColumn`] if two output columns end up with the
///   same name
pub fn left_join(
    left: Table,
    right: &Table,
    key: &str,
    policy: DuplicateKeyPolicy,
) -> Result<MergedDataset, MergeError> {
    require_key(&left, key, JoinSide::Left)?;
    require_key(right, key, JoinSide::Right)?;

    let schema = OutputSchema::new(&left, right, key);
    schema.check_unique()?;
    let index = index_reference(right, key, policy)?;

    let mut rows = Vec::with_capacity(left.rows.len());
    let mut unmatched_rows = 0_u64;

    for left_row in left.rows {
        let mut base = Row::new();
        for (name, out) in &schema.left {
            base.insert(out.clone(), left_row.get(name).cloned().unwrap_or(Value::Null));
        }

        let matches = left_row
            .get(key)
            .and_then(key_text)
            .and_then(|text| index.get(&text));

        let Some(matches) = matches else {
            unmatched_rows += 1;
            for (_, out) in &schema.right {
                base.insert(out.clone(), Value::Null);
            }
            rows.push(base);
            continue;
        };

        for &i in matches {
            let right_row = &right.rows[i];
            let mut row = base.clone();
            for (name, out) in &schema.right {
                row.insert(out.clone(), right_row.get(name).cloned().unwrap_or(Value::Null));
            }
            rows.push(row);
        }
    }

    Ok(MergedDataset {
        table: Table::new(schema.columns(), rows),
        unmatched_rows,
    })
}
