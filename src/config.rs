//! Configuration management for the fraud dashboard

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming an alternate config file
pub const CONFIG_PATH_ENV: &str = "FRAUD_DASHBOARD_CONFIG";

/// Default config file location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub detection: DetectionConfig,
    pub synthetic: SyntheticConfig,
    pub render: RenderConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
    /// Maximum accepted request body (uploaded CSV) in bytes
    pub max_upload_bytes: usize,
}

/// Isolation forest hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Expected share of outliers, in (0, 0.5]
    pub contamination: f64,
    /// Seed for reproducible fits
    pub random_state: u64,
    /// Upper bound on rows drawn per tree
    pub max_samples: usize,
}

/// Synthetic dataset parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub normal_count: usize,
    pub normal_mean: f64,
    pub normal_std: f64,
    pub outlier_count: usize,
    pub outlier_mean: f64,
    pub outlier_std: f64,
    pub merchant_categories: Vec<String>,
    pub locations: Vec<String>,
    pub behaviors: Vec<String>,
}

/// Dashboard rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Browser page title
    pub page_title: String,
    /// Rows shown per table before truncation
    pub max_table_rows: usize,
}

/// Service metrics reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between logged summaries; 0 disables the reporter
    pub report_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `FRAUD_DASHBOARD_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path.
    ///
    /// Built-in defaults are layered under the file, and
    /// `FRAUD_DASHBOARD__SECTION__KEY` environment variables over it. A
    /// missing file is not an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(
                Config::try_from(&AppConfig::default())
                    .context("Failed to serialize default configuration")?,
            )
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("FRAUD_DASHBOARD")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let detection = &self.detection;
        if detection.n_estimators == 0 {
            bail!("detection.n_estimators must be at least 1");
        }
        if !(detection.contamination > 0.0 && detection.contamination <= 0.5) {
            bail!(
                "detection.contamination must be in (0, 0.5], got {}",
                detection.contamination
            );
        }
        if detection.max_samples == 0 {
            bail!("detection.max_samples must be at least 1");
        }

        let synthetic = &self.synthetic;
        if synthetic.merchant_categories.is_empty()
            || synthetic.locations.is_empty()
            || synthetic.behaviors.is_empty()
        {
            bail!("synthetic label sets must not be empty");
        }

        if self.render.max_table_rows == 0 {
            bail!("render.max_table_rows must be at least 1");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            detection: DetectionConfig::default(),
            synthetic: SyntheticConfig::default(),
            render: RenderConfig::default(),
            metrics: MetricsConfig {
                report_interval_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            contamination: 0.04,
            random_state: 42,
            max_samples: 256,
        }
    }
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            normal_count: 400,
            normal_mean: 100.0,
            normal_std: 10.0,
            outlier_count: 100,
            outlier_mean: 1000.0,
            outlier_std: 100.0,
            merchant_categories: labels(&["Entertainment", "Grocery", "Apparel", "Food", "Fuel"]),
            locations: labels(&["Online", "Store"]),
            behaviors: labels(&["Frequent", "Occasional", "Rare"]),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_title: "Fraud Detection Dashboard".to_string(),
            max_table_rows: 1000,
        }
    }
}
