//! Configuration module for the Scratchpad service
//!
//! Supports configuration via:
//! - YAML/TOML config files
//! - Environment variables (with SCRATCHPAD_ prefix)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::editor::EditorConfig;
use crate::engine::EngineConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for the JSON log file; no file sink when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Largest source text accepted by the run endpoints
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,

    /// Interpreter engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Editor panel settings
    #[serde(default)]
    pub editor: EditorConfig,

    /// Metrics settings
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_source_bytes() -> usize {
    1_000_000
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_dir: None,
            max_source_bytes: default_max_source_bytes(),
            engine: EngineConfig::default(),
            editor: EditorConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config/scratchpad").required(false))
            .add_source(config::File::with_name("/etc/scratchpad/config").required(false))
            // SCRATCHPAD__ENGINE__BUNDLE_URL=... overrides engine.bundle_url
            .add_source(
                config::Environment::with_prefix("SCRATCHPAD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.max_source_bytes == 0 {
            anyhow::bail!("Maximum source size cannot be 0");
        }

        if self.engine.load_timeout_seconds == 0 {
            anyhow::bail!("Engine load timeout cannot be 0");
        }

        if let Some(url) = &self.engine.bundle_url {
            reqwest::Url::parse(url)
                .with_context(|| format!("Invalid engine bundle URL: {}", url))?;
        }

        if !self.metrics.path.starts_with('/') {
            anyhow::bail!("Metrics path must start with '/'");
        }

        Ok(())
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.engine.load_timeout_seconds)
    }
}
