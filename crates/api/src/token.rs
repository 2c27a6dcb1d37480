//! Bearer tokens for the two backends.

use serde_json::Value;
use tracing::info;

use crate::config::ClientConfig;
use crate::transport::{Headers, Transport};
use crate::ApiError;

/// Collection holding the public client configuration.
pub const CONFIGURATION_PATH: &str = "items/configuration";

#[derive(Clone, PartialEq, Eq)]
pub struct Tokens {
    pub api: String,
    pub search: String,
}

impl std::fmt::Debug for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokens").field("api", &"***").field("search", &"***").finish()
    }
}

pub struct TokenProvider<'a> {
    config: &'a ClientConfig,
}

impl<'a> TokenProvider<'a> {
    pub fn new(config: &'a ClientConfig) -> Self { Self { config } }

    /// Configured tokens first; whatever is missing comes from the configuration
    /// document (`key_dh` for REST, `key_ms` for search). Anything still missing fails.
    pub async fn resolve(&self, transport: &dyn Transport) -> Result<Tokens, ApiError> {
        if let (Some(api), Some(search)) = (&self.config.api_token, &self.config.search_token) {
            return Ok(Tokens { api: api.clone(), search: search.clone() });
        }
        let url = format!("{}/{}", self.config.api_base(), CONFIGURATION_PATH);
        let doc = transport
            .get(&url, &Headers::new())
            .await
            .map_err(|e| ApiError::Token(format!("fetching configuration document: {e}")))?;
        let data = doc.get("data").unwrap_or(&doc);
        let api = self.config.api_token.clone().or_else(|| read_key(data, "key_dh"));
        let search = self.config.search_token.clone().or_else(|| read_key(data, "key_ms"));
        match (api, search) {
            (Some(api), Some(search)) => {
                info!("tokens: resolved from configuration document");
                Ok(Tokens { api, search })
            }
            (api, _) => {
                let missing = if api.is_none() { "key_dh" } else { "key_ms" };
                Err(ApiError::Token(format!("configuration document has no {missing}")))
            }
        }
    }
}

fn read_key(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
