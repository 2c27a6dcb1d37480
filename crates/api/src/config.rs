use std::time::Duration;

use ffbb_persist::CacheConfig;
use serde::{Deserialize, Serialize};

use crate::ApiError;

pub const DEFAULT_API_URL: &str = "https://api.ffbb.app";
pub const DEFAULT_SEARCH_URL: &str = "https://meilisearch-prod.ffbb.app";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_url: String,
    pub search_url: String,
    /// Bearer token of the REST backend. Fetched from the configuration document when unset.
    pub api_token: Option<String>,
    /// Bearer token of the search engine. Fetched from the configuration document when unset.
    pub search_token: Option<String>,
    pub timeout_secs: u64,
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            search_url: DEFAULT_SEARCH_URL.into(),
            api_token: None,
            search_token: None,
            timeout_secs: 20,
            cache: CacheConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `FFBB_*` variables.
    pub fn from_env() -> Result<Self, ApiError> {
        let mut cfg = Self::default();
        if let Some(v) = env("FFBB_API_URL") { cfg.api_url = v; }
        if let Some(v) = env("FFBB_SEARCH_URL") { cfg.search_url = v; }
        cfg.api_token = env("FFBB_API_TOKEN");
        cfg.search_token = env("FFBB_SEARCH_TOKEN");
        if let Some(v) = env("FFBB_TIMEOUT_SECS") {
            cfg.timeout_secs = v.parse().map_err(|_| ApiError::Config(format!("FFBB_TIMEOUT_SECS={v} is not a number")))?;
        }
        cfg.cache = CacheConfig::from_env().map_err(|e| ApiError::Config(format!("{e:#}")))?;
        Ok(cfg)
    }

    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs.max(1)) }

    pub(crate) fn api_base(&self) -> &str { self.api_url.trim_end_matches('/') }

    pub(crate) fn search_base(&self) -> &str { self.search_url.trim_end_matches('/') }
}

fn env(key: &str) -> Option<String> { std::env::var(key).ok().filter(|v| !v.trim().is_empty()) }
