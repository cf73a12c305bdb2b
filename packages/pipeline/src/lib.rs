#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field data pipeline orchestration.
//!
//! A run ingests field records from the record store, corrects them,
//! fetches the weather-station table, and left-joins the two:
//!
//! ```text
//! record store ─► ingest ─► correct ─┐
//!                                    ├─► left join ─► MergedDataset
//! weather CSV ─────────► fetch ──────┘
//! ```
//!
//! Every stage returns a `Result`; the first failure aborts the run and is
//! reported as a [`PipelineError`] naming its [`Stage`]. No partial dataset
//! is ever returned.

pub mod output;
pub mod validate;

use std::time::Instant;

use field_data_correct::{CorrectionError, CorrectionPlan, apply_corrections, verify_corrected};
use field_data_dataset_models::{MergedDataset, Table};
use field_data_merge::{MergeError, left_join};
use field_data_pipeline_models::PipelineConfig;
use field_data_source::csv_download::CsvResource;
use field_data_source::duckdb_store::DuckDbStore;
use field_data_source::{
    RecordStore, SourceError, TableResource, fetch_reference_table, ingest_field_records,
};
use strum_macros::{AsRefStr, Display};

/// A step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Reading field records from the store.
    Source,
    /// Swap reversal, sign correction, and canonicalization.
    Correction,
    /// Fetching the weather-station table.
    Reference,
    /// Joining field records with weather-station records.
    Merge,
}

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The record store could not be read.
    #[error("Record source failed: {0}")]
    Source(#[source] SourceError),

    /// The field records could not be corrected.
    #[error("Correction failed: {0}")]
    Correction(#[from] CorrectionError),

    /// The weather-station table could not be fetched.
    #[error("Reference source failed: {0}")]
    Reference(#[source] SourceError),

    /// The join could not be performed.
    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),
}

impl PipelineError {
    /// The stage that failed.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Source(_) => Stage::Source,
            Self::Correction(_) => Stage::Correction,
            Self::Reference(_) => Stage::Reference,
            Self::Merge(_) => Stage::Merge,
        }
    }
}

/// Runs the pipeline for one configuration against a record store and a
/// reference resource.
pub struct FieldDataProcessor<S, R> {
    config: PipelineConfig,
    store: S,
    resource: R,
}

impl FieldDataProcessor<DuckDbStore, CsvResource> {
    /// Creates a processor using the `DuckDB` store and the CSV resource,
    /// with the reference options from `config`.
    #[must_use]
    pub fn from_config(config: PipelineConfig) -> Self {
        let mut resource = CsvResource::new().with_gzip(config.reference.gzip);
        if let Some(timeout) = config.reference.timeout() {
            resource = resource.with_timeout(timeout);
        }
        Self::new(config, DuckDbStore, resource)
    }
}

impl<S, R> FieldDataProcessor<S, R>
where
    S: RecordStore,
    R: TableResource,
{
    /// Creates a processor from its collaborators.
    #[must_use]
    pub const fn new(config: PipelineConfig, store: S, resource: R) -> Self {
        Self {
            config,
            store,
            resource,
        }
    }

    /// The configuration this processor runs with.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage and returns the merged dataset.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure as a [`PipelineError`].
    pub async fn process(&self) -> Result<MergedDataset, PipelineError> {
        process(&self.config, &self.store, &self.resource).await
    }
}

/// Runs every stage for `config` against `store` and `resource` and returns
/// the merged dataset.
///
/// With `reference.concurrent` set, the weather-station fetch runs
/// alongside ingestion and correction. A source or correction failure is
/// returned as soon as it happens and drops the in-flight fetch. A failed
/// fetch is held until the field records settle, so failures are still
/// reported in stage order.
///
/// # Errors
///
/// Returns the first stage failure as a [`PipelineError`].
pub async fn process<S, R>(
    config: &PipelineConfig,
    store: &S,
    resource: &R,
) -> Result<MergedDataset, PipelineError>
where
    S: RecordStore + ?Sized,
    R: TableResource + ?Sized,
{
    let start = Instant::now();
    log::info!("Starting field data pipeline");

    let (fields, reference) = if config.reference.concurrent {
        log::debug!("Fetching reference table concurrently");
        let fields = ingest_and_correct(config, store);
        let reference = fetch_reference(config, resource);
        tokio::pin!(fields, reference);

        tokio::select! {
            biased;
            fields = &mut fields => {
                let fields = fields?;
                (fields, reference.await?)
            }
            reference = &mut reference => {
                let fields = fields.await?;
                (fields, reference?)
            }
        }
    } else {
        let fields = ingest_and_correct(config, store).await?;
        let reference = fetch_reference(config, resource).await?;
        (fields, reference)
    };

    let merged = left_join(
        fields,
        &reference,
        &config.columns.join_key,
        config.merge.duplicate_keys,
    )?;

    if merged.unmatched_rows > 0 {
        log::info!(
            "{} field record(s) have no weather station match",
            merged.unmatched_rows
        );
    }

    log::info!(
        "Pipeline complete: {} rows, {} columns, took {:.1}s",
        merged.len(),
        merged.table.columns.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(merged)
}

async fn ingest_and_correct<S>(config: &PipelineConfig, store: &S) -> Result<Table, PipelineError>
where
    S: RecordStore + ?Sized,
{
    let raw = ingest_field_records(store, &config.store_locator, &config.query_expression)
        .await
        .map_err(PipelineError::Source)?;

    let plan = CorrectionPlan {
        swap: &config.column_swap_rule,
        elevation_column: &config.columns.elevation,
        crop_type_column: &config.columns.crop_type,
        rename_map: &config.values_to_rename,
    };
    let corrected = apply_corrections(raw, &plan)?;

    log::info!(
        "Swapped columns {} and {}",
        config.column_swap_rule.column_a,
        config.column_swap_rule.column_b
    );
    log::info!(
        "Corrected {} and {} with {} rename(s) across {} record(s)",
        config.columns.elevation,
        config.columns.crop_type,
        config.values_to_rename.len(),
        corrected.len()
    );

    let violations = verify_corrected(
        &corrected,
        &config.columns.elevation,
        &config.columns.crop_type,
        config.validation.vocabulary(),
    )?;
    for violation in &violations {
        log::warn!("Corrected record check: {violation}");
    }

    Ok(corrected)
}

async fn fetch_reference<R>(config: &PipelineConfig, resource: &R) -> Result<Table, PipelineError>
where
    R: TableResource + ?Sized,
{
    let locator = &config.weather_resource_locator;
    let table = fetch_reference_table(resource, locator)
        .await
        .map_err(PipelineError::Reference)?;

    log::info!("Loaded {} weather station record(s) from {locator}", table.len());
    Ok(table)
}

/// Runs the pipeline for `config` with the `DuckDB` store and the CSV
/// resource.
///
/// # Errors
///
/// Returns the first stage failure as a [`PipelineError`].
pub async fn run(config: PipelineConfig) -> Result<MergedDataset, PipelineError> {
    FieldDataProcessor::from_config(config).process().await
}
