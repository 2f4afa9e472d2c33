//! Configuration for the route advertiser
//!
//! Values come from an optional YAML file, then environment overrides.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming the YAML config file
pub const CONFIG_PATH_ENV: &str = "ROUTE_ADVERTISER_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Node name is required (set NODENAME)")]
    MissingNodeName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Advertiser configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdvertiserConfig {
    /// Node whose local endpoints qualify services for advertisement
    #[serde(default)]
    pub node_name: String,

    /// Prefix prepended to every store key
    #[serde(default)]
    pub key_prefix: String,

    /// Name of the RouteAdvertisement object to follow
    #[serde(default = "default_config_name")]
    pub config_name: String,

    /// Listen address for /metrics and /healthz
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: SocketAddr,

    /// Where to write route snapshots; disabled when unset
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_config_name() -> String {
    advertiser_api::v1alpha1::DEFAULT_ADVERTISEMENT_NAME.to_string()
}

fn default_metrics_addr() -> SocketAddr {
    ([0, 0, 0, 0], 9099).into()
}

impl Default for AdvertiserConfig {
    fn default() -> Self {
        Self {
            node_name: String::new(),
            key_prefix: String::new(),
            config_name: default_config_name(),
            metrics_addr: default_metrics_addr(),
            snapshot_path: None,
            log_format: LogFormat::default(),
        }
    }
}

impl AdvertiserConfig {
    /// Load from the file named by `ROUTE_ADVERTISER_CONFIG`, if any, then
    /// apply environment overrides and validate
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let body = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
        Self::from_yaml(&body)
    }

    pub fn from_yaml(body: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(body)?)
    }

    /// Override fields from the environment through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(val) = lookup("NODENAME") {
            self.node_name = val;
        }

        if let Some(val) = lookup("ROUTE_ADVERTISER_KEY_PREFIX") {
            self.key_prefix = val;
        }

        if let Some(val) = lookup("ROUTE_ADVERTISER_METRICS_ADDR") {
            self.metrics_addr = val.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "ROUTE_ADVERTISER_METRICS_ADDR",
                value: val.clone(),
            })?;
        }

        if let Some(val) = lookup("ROUTE_ADVERTISER_SNAPSHOT_PATH") {
            self.snapshot_path = if val.is_empty() { None } else { Some(PathBuf::from(val)) };
        }

        if let Some(val) = lookup("ROUTE_ADVERTISER_LOG_FORMAT") {
            self.log_format = match val.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: "ROUTE_ADVERTISER_LOG_FORMAT",
                        value: val,
                    })
                }
            };
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_name.trim().is_empty() {
            return Err(ConfigError::MissingNodeName);
        }
        Ok(())
    }
}
