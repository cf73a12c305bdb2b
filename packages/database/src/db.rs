//! Store connection utilities.

use std::path::Path;

use duckdb::{AccessMode, Config, Connection};

use crate::DbError;

/// Locator that selects a transient in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Opens the record store at `locator` in read-only mode.
///
/// The pipeline only ever reads from the store, so a missing file is an
/// error rather than an invitation to create an empty database. The
/// special locator [`IN_MEMORY`] opens a fresh in-memory database.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the file does not exist, or
/// [`DbError::Duckdb`] if `DuckDB` cannot open it.
pub fn open_read_only(locator: &str) -> Result<Connection, DbError> {
    if locator == IN_MEMORY {
        return Ok(Connection::open_in_memory()?);
    }

    let path = Path::new(locator);
    if !path.is_file() {
        return Err(DbError::NotFound {
            path: locator.to_string(),
        });
    }

    let config = Config::default().access_mode(AccessMode::ReadOnly)?;
    let conn = Connection::open_with_flags(path, config)?;
    log::debug!("Opened record store {locator} (read-only)");

    Ok(conn)
}

/// Closes a connection, surfacing any error `DuckDB` reports while
/// shutting down.
///
/// # Errors
///
/// Returns [`DbError::Duckdb`] if the close fails. The connection is
/// dropped either way.
pub fn close(conn: Connection) -> Result<(), DbError> {
    conn.close().map_err(|(_conn, e)| DbError::Duckdb(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("field_data_db_test_missing.duckdb");
        let _ = std::fs::remove_file(&path);

        let err = open_read_only(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn opens_existing_file_read_only() {
        let dir = std::env::temp_dir().join("field_data_db_test_read_only");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fields.duckdb");

        let writer = Connection::open(&path).unwrap();
        writer
            .execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
            .unwrap();
        close(writer).unwrap();

        let conn = open_read_only(path.to_str().unwrap()).unwrap();
        assert!(conn.execute_batch("INSERT INTO t VALUES (2);").is_err());
        close(conn).unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn opens_in_memory_locator() {
        let conn = open_read_only(IN_MEMORY).unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER);").unwrap();
        close(conn).unwrap();
    }
}
