/// Service configuration loader - parses weather.toml
///
/// Keeps ingestion tuning, output location, and the database schema name
/// out of the code. Every field has a default, so a missing section (or a
/// missing file, via `ServiceConfig::default()`) still yields a usable
/// configuration.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::NOMINAL_SPAN_YEARS;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "weather.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub ingest: IngestConfig,
    pub output: OutputConfig,
    pub database: DatabaseConfig,
}

/// `[ingest]` — read loop and write batching
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Records per read chunk.
    pub chunk_size: usize,
    /// Rows per store write batch.
    pub write_batch_size: usize,
    /// Divisor for `Location::event_frequency`.
    pub nominal_span_years: f64,
    /// When non-empty, only these state codes are ingested.
    pub state_filter: Vec<String>,
    /// Stop after this many chunks.
    pub max_chunks: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            chunk_size: 100_000,
            write_batch_size: 1_000,
            nominal_span_years: NOMINAL_SPAN_YEARS,
            state_filter: Vec::new(),
            max_chunks: None,
        }
    }
}

/// `[output]` — side-channel JSON files
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: PathBuf::from("processed_weather_data"),
        }
    }
}

/// `[database]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub schema: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            schema: "weather".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Rejects values that would stall or corrupt a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.chunk_size == 0 {
            return Err(ConfigError::Invalid("ingest.chunk_size must be positive".to_string()));
        }
        if self.ingest.write_batch_size == 0 {
            return Err(ConfigError::Invalid("ingest.write_batch_size must be positive".to_string()));
        }
        if !(self.ingest.nominal_span_years > 0.0) {
            return Err(ConfigError::Invalid("ingest.nominal_span_years must be positive".to_string()));
        }
        if self.database.schema.is_empty() {
            return Err(ConfigError::Invalid("database.schema must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Parses and validates configuration text.
pub fn parse_config(contents: &str, path: &Path) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads `weather.toml` (or another path).
pub fn load_config(path: impl AsRef<Path>) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents, path)
}

/// Loads the file if it exists, otherwise falls back to defaults.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        log::info!("{} not found, using default configuration", path.display());
        Ok(ServiceConfig::default())
    }
}
