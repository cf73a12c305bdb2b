#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Contracts for the two inbound data sources and their default adapters.
//!
//! Field records come from a [`RecordStore`] (a relational engine reached
//! through a connection and a query). Weather-station reference data comes
//! from a [`TableResource`] (a URL-like locator that yields a table). The
//! pipeline only talks to these traits; [`duckdb_store::DuckDbStore`] and
//! [`csv_download::CsvResource`] are the implementations it ships with.

pub mod csv_download;
pub mod duckdb_store;
pub mod record_source;
pub mod reference_source;

use async_trait::async_trait;
use field_data_dataset_models::Table;

pub use record_source::ingest_field_records;
pub use reference_source::fetch_reference_table;

/// Errors that can occur while reading from either data source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The record store could not be reached.
    #[error("Could not connect to record store '{locator}': {message}")]
    Connection {
        /// Store locator that was tried.
        locator: String,
        /// Underlying cause.
        message: String,
    },

    /// The query could not be executed.
    #[error("Query failed: {message}")]
    Query {
        /// Underlying cause.
        message: String,
    },

    /// An open connection could not be released.
    #[error("Failed to close record store connection: {message}")]
    Close {
        /// Underlying cause.
        message: String,
    },

    /// The query ran but produced no rows.
    #[error("Query returned no rows: {query}")]
    EmptyResult {
        /// The query expression.
        query: String,
    },

    /// The reference resource is unreachable or not tabular.
    #[error("Could not read tabular resource '{locator}': {message}")]
    MalformedResource {
        /// Resource locator that was tried.
        locator: String,
        /// Underlying cause.
        message: String,
    },
}

/// A relational store that can be connected to and queried.
///
/// Connections are scoped acquisitions: every successful
/// [`connect`](Self::connect) must be paired with a
/// [`close`](Self::close), whichever way the query turns out.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Live connection handle.
    type Connection: Send;

    /// Opens a connection to the store at `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Connection`] if the store is unreachable.
    async fn connect(&self, locator: &str) -> Result<Self::Connection, SourceError>;

    /// Runs `query` and returns the full result set.
    ///
    /// An empty result is returned as an empty table; deciding whether that
    /// is acceptable belongs to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Query`] if the query cannot be executed.
    async fn query(
        &self,
        conn: &mut Self::Connection,
        query: &str,
    ) -> Result<Table, SourceError>;

    /// Releases a connection.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Connection`] if the store reports a failure
    /// while closing.
    async fn close(&self, conn: Self::Connection) -> Result<(), SourceError>;
}

/// A remote tabular resource addressed by a URL-like locator.
#[async_trait]
pub trait TableResource: Send + Sync {
    /// Retrieves and parses the whole resource.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MalformedResource`] if the resource is
    /// unreachable or not parseable as a table.
    async fn fetch_table(&self, locator: &str) -> Result<Table, SourceError>;
}
