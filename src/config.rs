//! Storefront configuration.
//!
//! Defaults work out of the box against the public demo API. Each value can be
//! overridden from the environment, and the CLI flags override the environment.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_API_URL` - catalog/auth base URL (default: `https://dummyjson.com`)
//! - `STOREFRONT_TIMEOUT_SECS` - per-request timeout in seconds (default: 10)
//! - `STOREFRONT_DATA_DIR` - directory of the file-backed store
//!   (default: `<platform data dir>/storefront`)
//! - `STOREFRONT_REFRESH_ON_LOAD` - refresh the remote catalog after each session load
//!   (default: true)
//! - `STOREFRONT_MIRROR_CREATES` - send locally created products to the API as well
//!   (default: true)

use crate::catalog::CatalogQuery;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://dummyjson.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAILBOX_CAPACITY: usize = 32;
const DATA_DIR_NAME: &str = "storefront";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
    #[error("No data directory available; set STOREFRONT_DATA_DIR")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
    pub registry: RegistryConfig,
}

/// Tuning of the product registry actor.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Bound of the request mailbox.
    pub mailbox_capacity: usize,
    /// Fetch the remote catalog in the background after every `load`.
    pub refresh_on_load: bool,
    /// Fire a best-effort `POST /products/add` for each local create.
    pub mirror_remote_creates: bool,
    /// Query used by load-triggered refreshes.
    pub default_query: CatalogQuery,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            refresh_on_load: true,
            mirror_remote_creates: true,
            default_query: CatalogQuery::default(),
        }
    }
}

impl RegistryConfig {
    /// No background network traffic: nothing refreshes or mirrors unless asked.
    pub fn offline() -> Self {
        Self {
            refresh_on_load: false,
            mirror_remote_creates: false,
            ..Self::default()
        }
    }
}

impl StorefrontConfig {
    /// Default settings with the store rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: data_dir.into(),
            registry: RegistryConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = match lookup("STOREFRONT_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let mut config = Self::with_data_dir(data_dir);

        if let Some(url) = lookup("STOREFRONT_API_URL") {
            config.api_base_url = url;
        }
        if let Some(raw) = lookup("STOREFRONT_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: "STOREFRONT_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("STOREFRONT_REFRESH_ON_LOAD") {
            config.registry.refresh_on_load = parse_bool("STOREFRONT_REFRESH_ON_LOAD", &raw)?;
        }
        if let Some(raw) = lookup("STOREFRONT_MIRROR_CREATES") {
            config.registry.mirror_remote_creates = parse_bool("STOREFRONT_MIRROR_CREATES", &raw)?;
        }
        Ok(config)
    }
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .ok_or(ConfigError::NoDataDir)
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
        }),
    }
}
