// src/core/config.rs

use crate::core::common::AssetMapError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the asset map service.
///
/// Missing fields in a TOML file fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory the file-backed document store writes into.
    pub data_dir: PathBuf,
    /// Key of the single document holding the whole tree.
    pub document_key: String,
    /// Half-extent of the root cube created on first start.
    pub root_extent: f64,
    /// Descent depth at which an asset is forced into the current node.
    pub max_depth: usize,
    /// Upper bound on one persistence round-trip.
    pub save_timeout_ms: u64,
    /// Prefix prepended to every minted node id.
    pub node_id_prefix: String,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

/// Builder for Config struct implementing the Builder pattern.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    data_dir: Option<PathBuf>,
    document_key: Option<String>,
    root_extent: Option<f64>,
    max_depth: Option<usize>,
    save_timeout_ms: Option<u64>,
    node_id_prefix: Option<String>,
    log_filter: Option<String>,
}

impl ConfigBuilder {
    /// Creates a new ConfigBuilder with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    pub fn document_key<S: Into<String>>(mut self, key: S) -> Self {
        self.document_key = Some(key.into());
        self
    }

    pub fn root_extent(mut self, extent: f64) -> Self {
        self.root_extent = Some(extent);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn save_timeout_ms(mut self, timeout: u64) -> Self {
        self.save_timeout_ms = Some(timeout);
        self
    }

    pub fn node_id_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.node_id_prefix = Some(prefix.into());
        self
    }

    pub fn log_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Builds the Config instance with validation
    pub fn build(self) -> Result<Config, AssetMapError> {
        let defaults = Config::default();
        let config = Config {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            document_key: self.document_key.unwrap_or(defaults.document_key),
            root_extent: self.root_extent.unwrap_or(defaults.root_extent),
            max_depth: self.max_depth.unwrap_or(defaults.max_depth),
            save_timeout_ms: self.save_timeout_ms.unwrap_or(defaults.save_timeout_ms),
            node_id_prefix: self.node_id_prefix.unwrap_or(defaults.node_id_prefix),
            log_filter: self.log_filter.unwrap_or(defaults.log_filter),
        };

        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            document_key: "map".to_string(),
            root_extent: 100_000.0,
            max_depth: 500,
            save_timeout_ms: 5000,
            node_id_prefix: "map-".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Creates a new ConfigBuilder for fluent configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), AssetMapError> {
        if !(self.root_extent.is_finite() && self.root_extent > 0.0) {
            return Err(AssetMapError::Configuration(
                "root_extent must be a positive finite number".to_string(),
            ));
        }

        if self.max_depth == 0 {
            return Err(AssetMapError::Configuration(
                "max_depth must be greater than 0".to_string(),
            ));
        }

        if self.save_timeout_ms == 0 {
            return Err(AssetMapError::Configuration(
                "save_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.document_key.trim().is_empty() {
            return Err(AssetMapError::Configuration("document_key must not be empty".to_string()));
        }

        Ok(())
    }

    /// Persistence round-trip bound as a `Duration`.
    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `AssetMapError::Configuration` if parsing or validation fails.
    pub fn load_from_file(path: &Path) -> Result<Self, AssetMapError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config: Self = toml::from_str(&contents).map_err(|e| {
                    AssetMapError::Configuration(format!(
                        "Failed to parse config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;

                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(AssetMapError::Io(e)),
        }
    }

    /// Loads configuration from an optional TOML file path.
    ///
    /// `None` and a missing file both yield the default configuration.
    pub fn load_or_default(optional_path: Option<&Path>) -> Result<Self, AssetMapError> {
        match optional_path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Config::default()),
        }
    }

    /// Creates a configuration for testing: shallow tree, short timeout.
    pub fn for_testing() -> Result<Self, AssetMapError> {
        Self::builder().max_depth(32).save_timeout_ms(1000).build()
    }
}
