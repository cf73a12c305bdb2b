//! [`RecordStore`] backed by a `DuckDB` database file.

use async_trait::async_trait;
use duckdb::Connection;
use field_data_database::{db, query::query_table};
use field_data_dataset_models::Table;

use crate::{RecordStore, SourceError};

/// Reads field records from a `DuckDB` file opened read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbStore;

#[async_trait]
impl RecordStore for DuckDbStore {
    type Connection = Connection;

    async fn connect(&self, locator: &str) -> Result<Connection, SourceError> {
        db::open_read_only(locator).map_err(|e| SourceError::Connection {
            locator: locator.to_string(),
            message: e.to_string(),
        })
    }

    async fn query(&self, conn: &mut Connection, query: &str) -> Result<Table, SourceError> {
        query_table(conn, query).map_err(|e| SourceError::Query {
            message: e.to_string(),
        })
    }

    async fn close(&self, conn: Connection) -> Result<(), SourceError> {
        db::close(conn).map_err(|e| SourceError::Close {
            message: e.to_string(),
        })
    }
}
