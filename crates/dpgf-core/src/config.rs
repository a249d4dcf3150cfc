//! Front-end configuration
//!
//! Loaded from TOML. Every section and field is optional, so an empty
//! document (or [`AppConfig::default`]) yields a working configuration.
//!
//! ```toml
//! [api]
//! base_url = "https://dpgf.example.fr/api"
//!
//! [search]
//! debounce_ms = 300
//! ```

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::debounce::DEFAULT_DEBOUNCE_MS;
use crate::endpoint::DEFAULT_PAGE_SIZE;
use crate::query::RetryPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl AppConfig {
    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if self.pagination.page_size == 0 {
            anyhow::bail!("pagination.page_size must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Search tuning; defaults match the backend's own defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Minimum trimmed length for length-gated variants
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
    #[serde(default = "default_fuzzy_min_similarity")]
    pub fuzzy_min_similarity: u32,
    #[serde(default = "default_fuzzy_limit")]
    pub fuzzy_limit: u32,
    #[serde(default = "default_similar_price_tolerance")]
    pub similar_price_tolerance: f64,
    #[serde(default = "default_similar_price_limit")]
    pub similar_price_limit: u32,
    #[serde(default = "default_plain_limit")]
    pub plain_limit: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_len: default_min_query_len(),
            fuzzy_min_similarity: default_fuzzy_min_similarity(),
            fuzzy_limit: default_fuzzy_limit(),
            similar_price_tolerance: default_similar_price_tolerance(),
            similar_price_limit: default_similar_price_limit(),
            plain_limit: default_plain_limit(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_min_query_len() -> usize {
    3
}

fn default_fuzzy_min_similarity() -> u32 {
    70
}

fn default_fuzzy_limit() -> u32 {
    50
}

fn default_similar_price_tolerance() -> f64 {
    20.0
}

fn default_similar_price_limit() -> u32 {
    20
}

fn default_plain_limit() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
    #[serde(default = "default_read_delay_ms")]
    pub read_delay_ms: u64,
}

impl RetryConfig {
    pub fn read_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.read_retries,
            delay: Duration::from_millis(self.read_delay_ms),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            read_retries: default_read_retries(),
            read_delay_ms: default_read_delay_ms(),
        }
    }
}

fn default_read_retries() -> u32 {
    1
}

fn default_read_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
