//! Client and coordinator settings.
//!
//! Every field has a default, so a host only spells out what it changes:
//!
//! ```yaml
//! client:
//!   timeout_ms: 10000
//! coordinators:
//!   debounce_ms: 250
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1/";

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root every endpoint path is joined onto
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 30_000,
            user_agent: concat!("mealdb-kit/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parses the base URL, adding the trailing slash `Url::join` needs to
    /// keep the last path segment.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let raw = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };
        Url::parse(&raw).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            source,
        })
    }
}

/// Timing and sizing for the search and recommendation flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Quiet period before a text search fires
    pub debounce_ms: u64,
    /// Default number of distinct recommendations per batch
    pub recommendation_count: usize,
    /// Attempt budget per batch, as a multiple of the requested count
    pub recommendation_attempt_factor: usize,
    /// Wall-clock limit for one batch
    pub recommendation_timeout_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            debounce_ms: 300,
            recommendation_count: 4,
            recommendation_attempt_factor: 3,
            recommendation_timeout_ms: 15_000,
        }
    }
}

impl CoordinatorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn recommendation_timeout(&self) -> Duration {
        Duration::from_millis(self.recommendation_timeout_ms)
    }

    /// Maximum number of random fetches one batch of `target` may issue.
    pub fn attempt_budget(&self, target: usize) -> usize {
        target.saturating_mul(self.recommendation_attempt_factor.max(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub coordinators: CoordinatorConfig,
}

impl Config {
    /// Loads configuration from YAML, validating the base URL.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.client.parsed_base_url()?;
        Ok(config)
    }
}
