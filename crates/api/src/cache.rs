//! Response cache around any transport.

use std::sync::Arc;

use async_trait::async_trait;
use ffbb_persist::CacheStore;
use metrics::counter;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::transport::{Headers, Method, Transport, TransportError};

/// Cache key: `prefix` + hex SHA-256 of method, URL, body and every header
/// except `Authorization`, so token rotation keeps hitting the same entries.
pub fn fingerprint(prefix: &str, method: Method, url: &str, headers: &Headers, body: Option<&Value>) -> String {
    let mut h = Sha256::new();
    h.update(method.as_str().as_bytes());
    h.update(b"\n");
    h.update(url.as_bytes());
    h.update(b"\n");
    let mut kept: Vec<(String, &str)> = headers
        .iter()
        .filter(|(k, _)| !k.eq_ignore_ascii_case("authorization"))
        .map(|(k, v)| (k.to_ascii_lowercase(), v.as_str()))
        .collect();
    kept.sort();
    for (k, v) in kept {
        h.update(k.as_bytes());
        h.update(b":");
        h.update(v.as_bytes());
        h.update(b"\n");
    }
    if let Some(b) = body {
        h.update(b.to_string().as_bytes());
    }
    format!("{prefix}{}", hex::encode(h.finalize()))
}

/// Serves cached bodies when fresh, otherwise forwards and stores the reply.
/// Store failures are logged and never fail the request.
pub struct CachingTransport<T> {
    inner: T,
    store: Arc<dyn CacheStore>,
    prefix: String,
}

impl<T: Transport> CachingTransport<T> {
    pub fn new(inner: T, store: Arc<dyn CacheStore>, prefix: impl Into<String>) -> Self {
        Self { inner, store, prefix: prefix.into() }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> { &self.store }

    fn lookup(&self, key: &str) -> Option<Value> {
        match self.store.get(key) {
            Ok(Some(body)) => match serde_json::from_str(&body) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(key, error = %e, "cache: unreadable entry ignored");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "cache: read failed");
                None
            }
        }
    }

    fn remember(&self, key: &str, value: &Value) {
        if let Err(e) = self.store.put(key, &value.to_string()) {
            warn!(key, error = %e, "cache: write failed");
        }
    }

    async fn through<F>(&self, method: Method, key: String, fetch: F) -> Result<Value, TransportError>
    where
        F: std::future::Future<Output = Result<Value, TransportError>> + Send,
    {
        if let Some(v) = self.lookup(&key) {
            debug!(method = method.as_str(), key = %key, "cache: hit");
            counter!("cache_hits_total", 1u64, "backend" => backend_label(self.store.as_ref()));
            return Ok(v);
        }
        counter!("cache_misses_total", 1u64, "backend" => backend_label(self.store.as_ref()));
        let v = fetch.await?;
        self.remember(&key, &v);
        Ok(v)
    }
}

fn backend_label(store: &dyn CacheStore) -> &'static str {
    match store.backend() {
        ffbb_persist::CacheBackend::Memory => "memory",
        ffbb_persist::CacheBackend::Sqlite => "sqlite",
    }
}

#[async_trait]
impl<T: Transport> Transport for CachingTransport<T> {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Value, TransportError> {
        let key = fingerprint(&self.prefix, Method::Get, url, headers, None);
        self.through(Method::Get, key, self.inner.get(url, headers)).await
    }

    async fn post(&self, url: &str, headers: &Headers, body: &Value) -> Result<Value, TransportError> {
        let key = fingerprint(&self.prefix, Method::Post, url, headers, Some(body));
        self.through(Method::Post, key, self.inner.post(url, headers, body)).await
    }
}
