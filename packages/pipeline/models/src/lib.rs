#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pipeline configuration.
//!
//! A run is described by one TOML file. The store and weather locators can
//! be overridden from the environment ([`STORE_ENV`], [`WEATHER_URL_ENV`])
//! so the same file works against different deployments.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use field_data_dataset_models::{
    CategoricalRenameMap, ChainedRenameError, ColumnSwapRule, DuplicateKeyPolicy,
};
use serde::{Deserialize, Serialize};

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "field_data.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "FIELD_DATA_CONFIG";
/// Environment variable overriding [`PipelineConfig::store_locator`].
pub const STORE_ENV: &str = "FIELD_DATA_STORE";
/// Environment variable overriding [`PipelineConfig::weather_resource_locator`].
pub const WEATHER_URL_ENV: &str = "FIELD_DATA_WEATHER_URL";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML or does not match the schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The rename map would need more than one pass to converge.
    #[error("Invalid values_to_rename: {0}")]
    InvalidRenameMap(#[from] ChainedRenameError),

    /// A required setting is empty.
    #[error("Config value '{key}' must not be empty")]
    Empty {
        /// The setting name.
        key: &'static str,
    },
}

/// Names of the columns the pipeline treats specially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Key shared by field and weather-station records.
    pub join_key: String,
    /// Column whose sign is corrected.
    pub elevation: String,
    /// Column whose spellings are canonicalized.
    pub crop_type: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            join_key: "Field_ID".to_string(),
            elevation: "Elevation".to_string(),
            crop_type: "Crop_type".to_string(),
        }
    }
}

/// Merge behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// What to do with repeated reference keys.
    pub duplicate_keys: DuplicateKeyPolicy,
}

/// Reference fetch behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceOptions {
    /// Whole-request timeout in seconds for remote resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Fetch the reference table while the field records are ingested.
    pub concurrent: bool,
    /// The resource is gzip-compressed.
    pub gzip: bool,
}

impl ReferenceOptions {
    /// The configured timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Post-correction validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Canonical crop types. Empty means crop types are not checked.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub crop_types: Vec<String>,
}

impl ValidationOptions {
    /// The canonical vocabulary, or `None` when none is configured.
    #[must_use]
    pub fn vocabulary(&self) -> Option<&[String]> {
        if self.crop_types.is_empty() {
            None
        } else {
            Some(self.crop_types.as_slice())
        }
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where the field records live (a `DuckDB` file path or `:memory:`).
    pub store_locator: String,
    /// Query producing the field records.
    pub query_expression: String,
    /// Where the weather-station table lives (URL or local path).
    pub weather_resource_locator: String,
    /// The two columns exchanged at the source.
    pub column_swap_rule: ColumnSwapRule,
    /// Raw to canonical crop type spellings.
    #[serde(default)]
    pub values_to_rename: CategoricalRenameMap,
    /// Names of the corrected and joined columns.
    #[serde(default)]
    pub columns: ColumnNames,
    /// Join behavior.
    #[serde(default)]
    pub merge: MergeOptions,
    /// How the weather-station table is fetched.
    #[serde(default)]
    pub reference: ReferenceOptions,
    /// Post-correction checks.
    #[serde(default)]
    pub validation: ValidationOptions,
}

#[derive(Deserialize)]
struct RenameSection {
    #[serde(default)]
    values_to_rename: BTreeMap<String, String>,
}

impl PipelineConfig {
    /// Replaces the store and weather locators with values returned by
    /// `lookup` for [`STORE_ENV`] and [`WEATHER_URL_ENV`].
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(store) = lookup(STORE_ENV) {
            log::debug!("{STORE_ENV} overrides store_locator");
            self.store_locator = store;
        }
        if let Some(url) = lookup(WEATHER_URL_ENV) {
            log::debug!("{WEATHER_URL_ENV} overrides weather_resource_locator");
            self.weather_resource_locator = url;
        }
    }

    /// [`Self::apply_overrides`] from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Checks that required settings are present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] for the first blank required setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("store_locator", &self.store_locator),
            ("query_expression", &self.query_expression),
            ("weather_resource_locator", &self.weather_resource_locator),
            ("columns.join_key", &self.columns.join_key),
            ("columns.elevation", &self.columns.elevation),
            ("columns.crop_type", &self.columns.crop_type),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty { key });
            }
        }
        Ok(())
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Parses a pipeline configuration from a TOML string.
///
/// No environment overrides are applied.
///
/// # Errors
///
/// * [`ConfigError::InvalidRenameMap`] if `values_to_rename` chains
/// * [`ConfigError::Parse`] if the TOML is malformed or incomplete
/// * [`ConfigError::Empty`] if a required setting is blank
pub fn parse_config_toml(toml_str: &str) -> Result<PipelineConfig, ConfigError> {
    let section: RenameSection = toml::de::from_str(toml_str)?;
    CategoricalRenameMap::new(section.values_to_rename)?;

    let config: PipelineConfig = toml::de::from_str(toml_str)?;
    config.validate()?;
    Ok(config)
}

/// Reads the config file at `path` and applies environment overrides.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, or any error
/// from [`parse_config_toml`]. Validation is repeated after the overrides.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    log::debug!("Loading config from {}", path.display());

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = parse_config_toml(&contents)?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
