/*!
 * Configuration support for the stroke query service
 *
 * Runtime options for dataset loading and the HTTP server. The
 * configuration is passed explicitly to whatever needs it; there is no
 * process-wide instance.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BIND_ADDR, DEFAULT_DATA_PATH, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::dataset::PatientDatasetBuilder;

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Dataset file (Parquet or CSV)
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether to drop invalid rows instead of failing the load
    #[serde(default)]
    pub skip_invalid_records: bool,

    /// Whether to show a progress bar while loading
    #[serde(default = "default_enable_progress_bar")]
    pub enable_progress_bar: bool,

    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            bind_addr: default_bind_addr(),
            request_timeout_secs: default_request_timeout_secs(),
            skip_invalid_records: false,
            enable_progress_bar: default_enable_progress_bar(),
            log_level: default_log_level(),
        }
    }
}

// Default value functions for serde
fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_enable_progress_bar() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `STROKE_DATA_PATH`: dataset file path
    /// - `STROKE_BIND_ADDR`: e.g. "0.0.0.0:8000"
    /// - `STROKE_REQUEST_TIMEOUT_SECS`: number
    /// - `STROKE_SKIP_INVALID`: "true" or "false"
    /// - `STROKE_PROGRESS_BAR`: "true" or "false"
    /// - `STROKE_LOG_LEVEL`: tracing filter, e.g. "debug"
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup on top of this configuration
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("STROKE_DATA_PATH") {
            self.data_path = PathBuf::from(val);
        }

        if let Some(val) = lookup("STROKE_BIND_ADDR") {
            self.bind_addr = val;
        }

        if let Some(val) = lookup("STROKE_REQUEST_TIMEOUT_SECS") {
            match val.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid STROKE_REQUEST_TIMEOUT_SECS"),
            }
        }

        if let Some(val) = lookup("STROKE_SKIP_INVALID") {
            self.skip_invalid_records = val.to_lowercase() == "true";
        }

        if let Some(val) = lookup("STROKE_PROGRESS_BAR") {
            self.enable_progress_bar = val.to_lowercase() == "true";
        }

        if let Some(val) = lookup("STROKE_LOG_LEVEL") {
            self.log_level = val;
        }

        self
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| crate::StrokeError::Configuration {
                message: format!("Failed to parse config file: {}", e),
                suggestion: Some("Check that the file is valid TOML format".to_string()),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::StrokeError::Configuration {
                message: format!("Failed to serialize config: {}", e),
                suggestion: None,
            })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/stroke-query/config.toml` on Unix-like systems
    /// or `%APPDATA%\stroke-query\config.toml` on Windows
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "stroke-query")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location, environment, or defaults
    ///
    /// Priority order:
    /// 1. Default config file (if exists)
    /// 2. Environment variables
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                match Self::from_file(&config_path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(
                        path = %config_path.display(),
                        "ignoring unreadable config file: {e}"
                    ),
                }
            }
        }

        Self::from_env()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Dataset builder preset from this configuration
    pub fn dataset_builder(&self) -> PatientDatasetBuilder {
        #[allow(unused_mut)]
        let mut builder = PatientDatasetBuilder::new()
            .data_file(&self.data_path)
            .skip_invalid_records(self.skip_invalid_records);

        #[cfg(feature = "progress")]
        {
            builder = builder.show_progress(self.enable_progress_bar);
        }

        builder
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> crate::Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(crate::StrokeError::Configuration {
                message: "request timeout must be at least one second".to_string(),
                suggestion: Some("Set STROKE_REQUEST_TIMEOUT_SECS to a positive number".to_string()),
            });
        }
        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(crate::StrokeError::Configuration {
                message: format!("invalid bind address '{}'", self.bind_addr),
                suggestion: Some("Use host:port, e.g. 127.0.0.1:8000".to_string()),
            });
        }
        Ok(())
    }
}

/// Builder for customizing configuration
#[derive(Default)]
pub struct ConfigBuilder {
    config: ServiceConfig,
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Set dataset file
    pub fn data_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.data_path = path.as_ref().to_path_buf();
        self
    }

    /// Set bind address
    pub fn bind_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    /// Set request timeout in seconds
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Set skip invalid records
    pub fn skip_invalid_records(mut self, skip: bool) -> Self {
        self.config.skip_invalid_records = skip;
        self
    }

    /// Set progress bar enabled
    pub fn progress_bar(mut self, enabled: bool) -> Self {
        self.config.enable_progress_bar = enabled;
        self
    }

    /// Set log level
    pub fn log_level<S: Into<String>>(mut self, level: S) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> ServiceConfig {
        self.config
    }
}
