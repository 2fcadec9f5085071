//! Runtime configuration, loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. CLI flags are applied on top by the binary.

use crate::data::eastmoney::EASTMONEY_BASE_URL;
use crate::data::yahoo::YAHOO_BASE_URL;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// User agent sent upstream unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = concat!("finance-prices/", env!("CARGO_PKG_VERSION"));

const MAX_OFFSET_HOURS: i32 = 23;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceConfig {
    /// Commodity the prices are quoted in.
    pub currency: String,

    /// Fixed UTC offset, in hours, in which timestamps become calendar days.
    pub market_utc_offset_hours: i32,

    /// Fetch symbols concurrently.
    pub parallel: bool,

    pub http: HttpConfig,
    pub providers: ProvidersConfig,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            currency: "CNY".to_string(),
            market_utc_offset_hours: 8,
            parallel: false,
            http: HttpConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Upstream endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvidersConfig {
    pub eastmoney_base_url: String,
    pub yahoo_base_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            eastmoney_base_url: EASTMONEY_BASE_URL.to_string(),
            yahoo_base_url: YAHOO_BASE_URL.to_string(),
        }
    }
}

impl PriceConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency must not be empty".into()));
        }
        if self.market_utc_offset_hours.abs() > MAX_OFFSET_HOURS {
            return Err(ConfigError::Invalid(format!(
                "market_utc_offset_hours must be within ±{MAX_OFFSET_HOURS}, got {}",
                self.market_utc_offset_hours
            )));
        }
        if self.http.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("http.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// The market offset as a chrono offset.
    pub fn market_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.market_utc_offset_hours * 3600).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "market_utc_offset_hours out of range: {}",
                self.market_utc_offset_hours
            ))
        })
    }
}
