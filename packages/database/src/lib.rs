#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `DuckDB` access for the field record store.
//!
//! [`db`] opens and closes store connections; [`query`] runs a SQL
//! expression and materializes the result set as a
//! [`Table`](field_data_dataset_models::Table).

pub mod db;
pub mod query;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` reported an error.
    #[error("DuckDB error: {0}")]
    Duckdb(#[from] duckdb::Error),

    /// A result set names the same column more than once.
    #[error("Query result repeats column '{column}'")]
    DuplicateColumn {
        /// The repeated column name.
        column: String,
    },

    /// The store file does not exist.
    #[error("Database file not found: {path}")]
    NotFound {
        /// The locator that was tried.
        path: String,
    },
}
