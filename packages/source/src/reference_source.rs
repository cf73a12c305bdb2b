//! Weather-station reference table retrieval.

use field_data_dataset_models::Table;

use crate::{SourceError, TableResource};

/// Fetches the weather-station mapping table from `locator`.
///
/// A table with no columns is treated as unparseable. A header-only table
/// is accepted: every field record will simply go unmatched.
///
/// # Errors
///
/// Returns [`SourceError::MalformedResource`] if the resource is
/// unreachable or not tabular. There is no retry and no caching.
pub async fn fetch_reference_table<R>(resource: &R, locator: &str) -> Result<Table, SourceError>
where
    R: TableResource + ?Sized,
{
    let table = resource.fetch_table(locator).await?;

    if table.columns.is_empty() {
        return Err(SourceError::MalformedResource {
            locator: locator.to_string(),
            message: "resource has no columns".to_string(),
        });
    }

    log::debug!(
        "Loaded {} weather station records from {locator}",
        table.len()
    );

    Ok(table)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct FixedResource(Table);

    #[async_trait]
    impl TableResource for FixedResource {
        async fn fetch_table(&self, _locator: &str) -> Result<Table, SourceError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn rejects_table_without_columns() {
        let resource = FixedResource(Table::default());
        let err = fetch_reference_table(&resource, "https://example.invalid/weather.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MalformedResource { .. }));
    }

    #[tokio::test]
    async fn accepts_header_only_table() {
        let resource = FixedResource(Table::new(
            vec!["Field_ID".to_string(), "Weather_station".to_string()],
            Vec::new(),
        ));
        let table = fetch_reference_table(&resource, "weather.csv").await.unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 2);
    }
}
