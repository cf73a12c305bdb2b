#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular record types shared by every stage of the field data pipeline.
//!
//! Field records, weather-station records, and the merged output are all
//! represented as a [`Table`]: an ordered column schema plus rows of
//! [`serde_json::Value`] scalars keyed by column name. The rule types that
//! drive correction and merging ([`ColumnSwapRule`], [`CategoricalRenameMap`],
//! [`DuplicateKeyPolicy`]) live here so configuration can deserialize them
//! directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display};

/// One record, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// An ordered set of columns and the rows that populate them.
///
/// `columns` is the schema: it fixes output column order and answers
/// "does this column exist" independently of whether any row carries a
/// value for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column names in display order.
    pub columns: Vec<String>,
    /// Row data. Every key of every row is expected to appear in `columns`.
    pub rows: Vec<Row>,
}

impl Table {
    /// Creates a table from a schema and its rows.
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether `name` is part of the schema.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Iterates the values of one column, yielding [`Value::Null`] for rows
    /// that do not carry it.
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(name).unwrap_or(&Value::Null))
    }
}

/// Two column names whose values were exchanged at the source.
///
/// Reversing the swap is not idempotent: applying it twice restores the
/// defective layout, so a record set must be corrected exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSwapRule {
    /// First column of the swapped pair.
    pub column_a: String,
    /// Second column of the swapped pair.
    pub column_b: String,
}

impl ColumnSwapRule {
    /// Creates a rule for the given pair.
    #[must_use]
    pub fn new(column_a: impl Into<String>, column_b: impl Into<String>) -> Self {
        Self {
            column_a: column_a.into(),
            column_b: column_b.into(),
        }
    }
}

/// Error returned when a rename map would not converge in one pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rename map chains '{raw}' -> '{canonical}' -> '{next}'; canonical values must map to themselves")]
pub struct ChainedRenameError {
    /// The raw value that starts the chain.
    pub raw: String,
    /// Its mapped value, which is itself a key.
    pub canonical: String,
    /// What the canonical value would be renamed to.
    pub next: String,
}

/// Mapping from raw (misspelled or padded) categorical values to their
/// canonical spelling.
///
/// Values absent from the map pass through unchanged. Construction rejects
/// chains such as `{"teaa": "tea ", "tea ": "tea"}`, so applying the map a
/// second time never changes anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct CategoricalRenameMap {
    entries: BTreeMap<String, String>,
}

impl CategoricalRenameMap {
    /// Builds a rename map, validating that it converges in one pass.
    ///
    /// # Errors
    ///
    /// Returns [`ChainedRenameError`] if any canonical value is also a key
    /// that maps somewhere else.
    pub fn new(entries: BTreeMap<String, String>) -> Result<Self, ChainedRenameError> {
        for (raw, canonical) in &entries {
            if let Some(next) = entries.get(canonical)
                && next != canonical
            {
                return Err(ChainedRenameError {
                    raw: raw.clone(),
                    canonical: canonical.clone(),
                    next: next.clone(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Returns the canonical spelling for `raw`, or `raw` itself when the
    /// map has no entry for it.
    #[must_use]
    pub fn canonical<'a>(&'a self, raw: &'a str) -> &'a str {
        self.entries.get(raw).map_or(raw, String::as_str)
    }

    /// Returns the canonical spelling for `raw` if the map has an entry.
    #[must_use]
    pub fn get(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<BTreeMap<String, String>> for CategoricalRenameMap {
    type Error = ChainedRenameError;

    fn try_from(entries: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<CategoricalRenameMap> for BTreeMap<String, String> {
    fn from(map: CategoricalRenameMap) -> Self {
        map.entries
    }
}

/// What the merge does when the reference table has several rows for one
/// key.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// Emit one output row per matching reference row.
    #[default]
    FanOut,
    /// Fail before joining.
    Reject,
}

/// Field records left-joined with weather-station records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedDataset {
    /// The joined rows. Weather columns of unmatched rows hold
    /// [`Value::Null`].
    pub table: Table,
    /// How many field records found no weather-station match.
    pub unmatched_rows: u64,
}

impl MergedDataset {
    /// Number of output rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn canonical_falls_back_to_raw_value() {
        let map = CategoricalRenameMap::new(rename_map(&[("cassava ", "cassava")])).unwrap();
        assert_eq!(map.canonical("cassava "), "cassava");
        assert_eq!(map.canonical("maize"), "maize");
    }

    #[test]
    fn rejects_chained_renames() {
        let err = CategoricalRenameMap::new(rename_map(&[("teaa", "tea "), ("tea ", "tea")]))
            .unwrap_err();
        assert_eq!(err.raw, "teaa");
        assert_eq!(err.next, "tea");
    }

    #[test]
    fn accepts_identity_entries() {
        let map = CategoricalRenameMap::new(rename_map(&[("tea", "tea"), ("tea ", "tea")]));
        assert!(map.is_ok());
    }

    #[test]
    fn deserializes_rename_map_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            values: CategoricalRenameMap,
        }

        let parsed: Wrapper =
            toml::from_str("values = { \"wheatn\" = \"wheat\", \"cassaval\" = \"cassava\" }")
                .unwrap();
        assert_eq!(parsed.values.len(), 2);
        assert_eq!(parsed.values.canonical("wheatn"), "wheat");

        let chained: Result<Wrapper, _> = toml::from_str("values = { \"a\" = \"b\", \"b\" = \"c\" }");
        assert!(chained.is_err());
    }

    #[test]
    fn column_values_fill_missing_cells_with_null() {
        let mut first = Row::new();
        first.insert("Field_ID".to_string(), Value::from(1));
        let second = Row::new();
        let table = Table::new(vec!["Field_ID".to_string()], vec![first, second]);

        let values: Vec<&Value> = table.column_values("Field_ID").collect();
        assert_eq!(values, vec![&Value::from(1), &Value::Null]);
        assert!(table.has_column("Field_ID"));
        assert!(!table.has_column("Elevation"));
    }
}
