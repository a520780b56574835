//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::fetch::ClientConfig;
use crate::parse_duration;
use crate::table::{SortColumn, SortDirection, SortState};

/// Backend used when neither the config file nor the environment names one.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "MLBB_API_URL";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root URL of the statistics backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (e.g. "10s", "1m")
    #[serde(default = "default_timeout")]
    pub timeout: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> String {
    "10s".to_string()
}

fn default_user_agent() -> String {
    format!("mlbb-meta/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Initial table presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_sort")]
    pub default_sort: SortColumn,

    #[serde(default = "default_direction")]
    pub default_direction: SortDirection,
}

fn default_sort() -> SortColumn {
    SortColumn::Presence
}

fn default_direction() -> SortDirection {
    SortDirection::Desc
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_sort: default_sort(),
            default_direction: default_direction(),
        }
    }
}

impl TableConfig {
    pub fn sort_state(&self) -> SortState {
        SortState::new(self.default_sort, self.default_direction)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub table: TableConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api: ApiConfig::default(),
            table: TableConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    /// Environment overrides are applied either way.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api.base_url = url.trim().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timeout()?;
        self.base_url()?;
        Ok(())
    }

    /// Parsed request timeout.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        match parse_duration(&self.api.timeout) {
            Some(d) if !d.is_zero() => Ok(d),
            Some(_) => Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            )),
            None => Err(ConfigError::ValidationError(format!(
                "Unparsable API timeout: {}",
                self.api.timeout
            ))),
        }
    }

    /// Parsed backend URL; must be absolute http(s).
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::ValidationError(format!("Invalid API URL {}: {}", self.api.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::ValidationError(format!(
                "API URL must be http or https: {}",
                self.api.base_url
            )));
        }
        Ok(url)
    }

    /// Settings for [`crate::fetch::HttpStatsApi`].
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        Ok(ClientConfig {
            base_url: self.base_url()?,
            timeout: self.timeout()?,
            user_agent: self.api.user_agent.clone(),
        })
    }
}
