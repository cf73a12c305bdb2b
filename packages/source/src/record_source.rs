//! Field record extraction.

use field_data_dataset_models::Table;

use crate::{RecordStore, SourceError};

/// Connects to the store, runs `query`, and returns every field record.
///
/// The connection is closed before returning on both the success and the
/// failure path. A failed close after a successful query is logged; the
/// extracted rows are still returned since they no longer depend on the
/// connection.
///
/// # Errors
///
/// Returns [`SourceError::Connection`] if the store is unreachable,
/// [`SourceError::Query`] if the query fails, or
/// [`SourceError::EmptyResult`] if it yields zero rows. There is no retry.
pub async fn ingest_field_records<S>(
    store: &S,
    locator: &str,
    query: &str,
) -> Result<Table, SourceError>
where
    S: RecordStore + ?Sized,
{
    let mut conn = store.connect(locator).await?;
    log::info!("Connected to record store {locator}");

    let result = store.query(&mut conn, query).await;

    if let Err(e) = store.close(conn).await {
        log::warn!("Failed to close record store {locator}: {e}");
    }

    let table = result?;
    if table.is_empty() {
        return Err(SourceError::EmptyResult {
            query: query.to_string(),
        });
    }

    log::debug!(
        "Loaded {} field records ({} columns)",
        table.len(),
        table.columns.len()
    );

    Ok(table)
}
