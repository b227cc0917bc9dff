//! Dashboard service configuration.
//!
//! Layered figment load: compiled defaults, then the YAML file, then
//! `DASHSRV_*` environment variables.

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dashboard service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashConfig {
    /// Service identity and listen address
    #[serde(default)]
    pub service: ServiceConfig,
    /// SQLite database
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Change-notification transport
    #[serde(default)]
    pub redis: RedisConfig,
}

/// Service identity and listen address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// SQLite database location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

/// Change-notification transport.
///
/// With `enabled = false` the service runs on the in-process broadcast
/// notifier; change events then only propagate within this process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_redis_url")]
    pub url: String,
}

fn default_service_name() -> String {
    "dashsrv".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8084
}

fn default_db_path() -> String {
    "data/factory.db".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_redis_url(),
        }
    }
}

impl DashConfig {
    /// Load configuration from the first config file found plus environment
    pub fn load() -> Result<Self> {
        let config_paths = ["config/dashsrv/dashsrv.yaml", "config/dashsrv.yaml", "dashsrv.yaml"];
        let yaml_path = config_paths.iter().find(|p| Path::new(p).exists());

        let mut figment = Figment::new().merge(Serialized::defaults(DashConfig::default()));
        if let Some(path) = yaml_path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed("DASHSRV_").split("_"))
            .extract()?;
        Ok(config)
    }

    /// Render the default configuration as YAML
    pub fn generate_default_config() -> String {
        serde_yaml::to_string(&Self::default())
            .unwrap_or_else(|_| "# Failed to generate config file".to_string())
    }
}
