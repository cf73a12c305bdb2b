//! Query execution against the record store.
//!
//! Result sets are materialized into a [`Table`] whose schema is the
//! statement's column list, in order. `DuckDB` values are converted to
//! JSON scalars so downstream stages never see store-specific types.

use chrono::{DateTime, NaiveTime};
use duckdb::Connection;
use duckdb::types::{TimeUnit, Value as DuckValue};
use field_data_dataset_models::{Row, Table};
use serde_json::Value;

use crate::DbError;

/// Runs `sql` and returns every row of the result set.
///
/// # Errors
///
/// Returns [`DbError::DuplicateColumn`] if two result columns share a
/// name, or [`DbError::Duckdb`] if the statement fails to prepare, execute,
/// or decode.
pub fn query_table(conn: &Connection, sql: &str) -> Result<Table, DbError> {
    let mut stmt = conn.prepare(sql)?;
    stmt.raw_execute()?;
    let columns = stmt.column_names();

    for (i, name) in columns.iter().enumerate() {
        if columns[..i].contains(name) {
            return Err(DbError::DuplicateColumn {
                column: name.clone(),
            });
        }
    }

    let mut records = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (i, name) in columns.iter().enumerate() {
            let value: DuckValue = row.get(i)?;
            record.insert(name.clone(), to_json(value));
        }
        records.push(record);
    }

    log::debug!(
        "Query returned {} rows across {} columns",
        records.len(),
        columns.len()
    );

    Ok(Table::new(columns, records))
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn float(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Converts a `DuckDB` value to a JSON scalar.
///
/// Non-finite floats become `null`. Dates and timestamps become ISO 8601
/// text. Nested types are kept as arrays where possible; anything else is
/// rendered as text.
#[allow(clippy::cast_precision_loss)]
fn to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(n) => Value::from(n),
        DuckValue::SmallInt(n) => Value::from(n),
        DuckValue::Int(n) => Value::from(n),
        DuckValue::BigInt(n) => Value::from(n),
        DuckValue::HugeInt(n) => i64::try_from(n).map_or_else(|_| float(n as f64), Value::from),
        DuckValue::UTinyInt(n) => Value::from(n),
        DuckValue::USmallInt(n) => Value::from(n),
        DuckValue::UInt(n) => Value::from(n),
        DuckValue::UBigInt(n) => Value::from(n),
        DuckValue::Float(f) => float(f64::from(f)),
        DuckValue::Double(f) => float(f),
        DuckValue::Decimal(d) => d.to_string().parse::<f64>().map_or(Value::Null, float),
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::String(s),
        DuckValue::Date32(days) => DateTime::from_timestamp(i64::from(days) * 86_400, 0)
            .map_or(Value::Null, |dt| {
                Value::String(dt.date_naive().format("%Y-%m-%d").to_string())
            }),
        DuckValue::Timestamp(unit, v) => DateTime::from_timestamp_micros(to_micros(unit, v))
            .map_or(Value::Null, |dt| {
                Value::String(dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }),
        DuckValue::Time64(unit, v) => {
            let micros = to_micros(unit, v);
            let secs = u32::try_from(micros / 1_000_000).ok();
            let nanos = u32::try_from((micros % 1_000_000) * 1_000).ok();
            secs.zip(nanos)
                .and_then(|(secs, nanos)| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
                .map_or(Value::Null, |t| Value::String(t.to_string()))
        }
        DuckValue::List(items) | DuckValue::Array(items) => {
            Value::Array(items.into_iter().map(to_json).collect())
        }
        other => Value::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE geographic_features (
                Field_ID INTEGER PRIMARY KEY,
                Elevation DOUBLE,
                Crop_type TEXT,
                Rainfall DOUBLE,
                Surveyed DATE
            );
            INSERT INTO geographic_features VALUES
                (1, -12.5, 'cassava ', 1500.0, DATE '2023-04-01'),
                (2, 300.25, 'wheat', NULL, NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn materializes_rows_in_column_order() {
        let conn = seeded();
        let table = query_table(
            &conn,
            "SELECT Field_ID, Elevation, Crop_type, Rainfall, Surveyed
             FROM geographic_features ORDER BY Field_ID",
        )
        .unwrap();

        assert_eq!(
            table.columns,
            vec!["Field_ID", "Elevation", "Crop_type", "Rainfall", "Surveyed"]
        );
        assert_eq!(table.len(), 2);

        let first = &table.rows[0];
        assert_eq!(first["Field_ID"], Value::from(1));
        assert_eq!(first["Elevation"], Value::from(-12.5));
        assert_eq!(first["Crop_type"], Value::from("cassava "));
        assert_eq!(first["Surveyed"], Value::from("2023-04-01"));

        let second = &table.rows[1];
        assert_eq!(second["Rainfall"], Value::Null);
        assert_eq!(second["Surveyed"], Value::Null);
    }

    #[test]
    fn empty_result_keeps_schema() {
        let conn = seeded();
        let table = query_table(
            &conn,
            "SELECT Field_ID, Elevation FROM geographic_features WHERE Field_ID > 100",
        )
        .unwrap();

        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["Field_ID", "Elevation"]);
    }

    #[test]
    fn invalid_sql_is_an_error() {
        let conn = seeded();
        let err = query_table(&conn, "SELECT * FROM no_such_table").unwrap_err();
        assert!(matches!(err, DbError::Duckdb(_)));
    }

    #[test]
    fn repeated_result_column_is_an_error() {
        let conn = seeded();
        let err = query_table(
            &conn,
            "SELECT Field_ID, Rainfall, Elevation AS Rainfall FROM geographic_features",
        )
        .unwrap_err();
        assert!(matches!(err, DbError::DuplicateColumn { column } if column == "Rainfall"));
    }

    #[test]
    fn converts_times_of_day() {
        assert_eq!(
            to_json(DuckValue::Time64(TimeUnit::Microsecond, 34_200_500_000)),
            Value::from("09:30:00.500")
        );
        assert_eq!(to_json(DuckValue::Time64(TimeUnit::Microsecond, -1)), Value::Null);
    }

    #[test]
    fn converts_timestamps_to_iso_text() {
        assert_eq!(
            to_json(DuckValue::Timestamp(TimeUnit::Second, 1_705_312_200)),
            Value::from("2024-01-15T09:50:00")
        );
        assert_eq!(to_json(DuckValue::Double(f64::NAN)), Value::Null);
    }
}
