// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `DATALEX_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default catalog / chat API base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default number of regulations per page
pub const DEFAULT_PAGE_SIZE: u32 = 60;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u32 = 30;

/// Application configuration
///
/// `Debug` redacts `backend_key`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the catalog and chat API
    pub api_base_url: String,
    /// Base URL of the hosted backend used by the admin commands
    #[serde(default)]
    pub backend_url: Option<String>,
    /// API key for the hosted backend
    #[serde(default, skip_serializing)]
    pub backend_key: Option<String>,
    /// Directory with reference data files; bundled tables when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Regulations fetched per page
    pub page_size: u32,
    /// HTTP timeout in seconds
    pub timeout_secs: u32,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("backend_url", &self.backend_url)
            .field("backend_key", &self.backend_key.as_ref().map(|_| "[REDACTED]"))
            .field("data_dir", &self.data_dir)
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            backend_url: None,
            backend_key: None,
            data_dir: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parsed catalog / chat API base URL
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        parse_url("api_base_url", &self.api_base_url)
    }

    /// Parsed backend URL and key, both required by the admin commands
    pub fn backend(&self) -> Result<(Url, String), ConfigError> {
        let raw = self
            .backend_url
            .as_deref()
            .ok_or(ConfigError::Missing("backend_url"))?;
        let key = self
            .backend_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing("backend_key"))?;
        Ok((parse_url("backend_url", raw)?, key))
    }
}

/// Default location of the configuration file
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "datalex")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from defaults, an optional file and the environment
///
/// An explicitly given `path` must exist; the default path is optional.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let defaults = Config::default();
    let mut builder = config::Config::builder()
        .set_default("api_base_url", defaults.api_base_url)?
        .set_default("page_size", i64::from(defaults.page_size))?
        .set_default("timeout_secs", i64::from(defaults.timeout_secs))?
        .set_default("log_level", defaults.log_level)?;

    match path {
        Some(p) => {
            builder = builder.add_source(config::File::from(p.to_path_buf()).required(true));
        }
        None => {
            if let Some(p) = default_config_path() {
                builder = builder.add_source(config::File::from(p).required(false));
            }
        }
    }

    let settings = builder
        .add_source(config::Environment::with_prefix("DATALEX").try_parsing(true))
        .build()?;

    let cfg: Config = settings.try_deserialize()?;
    if cfg.page_size == 0 {
        return Err(ConfigError::Invalid("page_size", "must be greater than zero".into()));
    }
    cfg.api_url()?;
    Ok(cfg)
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(field, e.to_string()))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Building or deserializing the layered configuration failed
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    /// A URL setting does not parse
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(&'static str, String),
    /// A setting required by the requested operation is absent
    #[error("missing configuration value: {0}")]
    Missing(&'static str),
    /// A setting is out of range
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
