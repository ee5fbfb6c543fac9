use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{
    default_stats_columns, DEFAULT_HISTOGRAM_BINS, DEFAULT_PRODUCT_CODE_LIMIT,
    DEFAULT_PRODUCT_LINE_LIMIT, DEFAULT_SALES_TOLERANCE,
};
use crate::error::{CleanerError, Result};
use crate::pipeline::processing::dedup::DedupPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "sales_cleaner.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
    pub storage: StorageConfig,
}

/// Knobs for the validation/enrichment core
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub product_code_limit: usize,
    pub product_line_limit: usize,
    pub sales_tolerance: f64,
    pub dedup_policy: DedupPolicy,
    /// Extra or overriding country → region entries
    pub territories: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            product_code_limit: DEFAULT_PRODUCT_CODE_LIMIT,
            product_line_limit: DEFAULT_PRODUCT_LINE_LIMIT,
            sales_tolerance: DEFAULT_SALES_TOLERANCE,
            dedup_policy: DedupPolicy::default(),
            territories: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    Html,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Html => "html",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub formats: Vec<OutputFormat>,
    pub histogram_bins: usize,
    /// Numeric columns described in the stats artifact
    pub stats_columns: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: vec![OutputFormat::Json, OutputFormat::Csv, OutputFormat::Html],
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            stats_columns: default_stats_columns(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory standing in for the object store; each bucket is a subdirectory
    pub store_root: Option<PathBuf>,
    /// Bucket that receives cleaned artifacts
    pub output_bucket: Option<String>,
    pub summary_db_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn store_root(&self) -> PathBuf {
        self.store_root.clone().unwrap_or_else(|| PathBuf::from("store"))
    }

    pub fn summary_db_path(&self) -> PathBuf {
        self.summary_db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("summaries.db"))
    }

    pub fn output_bucket(&self) -> Result<&str> {
        self.output_bucket
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| CleanerError::Config("OUTPUT_BUCKET_NAME is not set".to_string()))
    }
}

impl Config {
    /// Load `path` (defaults stand in when it does not exist), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let mut config = if config_path.exists() {
            let config_content = fs::read_to_string(config_path).map_err(|e| {
                CleanerError::Config(format!(
                    "Failed to read config file '{}': {}",
                    config_path.display(),
                    e
                ))
            })?;
            toml::from_str(&config_content)?
        } else if path.is_some() {
            return Err(CleanerError::Config(format!(
                "Config file '{}' does not exist",
                config_path.display()
            )));
        } else {
            debug!("No config file at {}, using defaults", config_path.display());
            Config::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Environment wins over the file. `.env` is read if present.
    pub fn apply_env(&mut self) {
        let _ = dotenv::dotenv();
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup("OUTPUT_BUCKET_NAME") {
            self.storage.output_bucket = Some(bucket);
        }
        if let Some(root) = lookup("STORE_ROOT") {
            self.storage.store_root = Some(PathBuf::from(root));
        }
        if let Some(db) = lookup("SUMMARY_DB_PATH") {
            self.storage.summary_db_path = Some(PathBuf::from(db));
        }
    }
}
