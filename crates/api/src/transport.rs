//! HTTP boundary. Everything above this module sees wire values only.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::Value;
use tracing::warn;

/// Request headers as ordered name/value pairs.
pub type Headers = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("connect: {0}")]
    Connect(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("body: {0}")]
    Body(String),
}

impl TransportError {
    /// Failures worth one immediate retry.
    pub fn is_transient(&self) -> bool { matches!(self, TransportError::Timeout(_) | TransportError::Connect(_)) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Value, TransportError>;

    async fn post(&self, url: &str, headers: &Headers, body: &Value) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Value, TransportError> { (**self).get(url, headers).await }

    async fn post(&self, url: &str, headers: &Headers, body: &Value) -> Result<Value, TransportError> {
        (**self).post(url, headers, body).await
    }
}

/// reqwest transport. No retry of its own; wrap in [`RetryingTransport`].
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ffbb-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self { client })
    }

    async fn execute(&self, method: Method, url: &str, rb: reqwest::RequestBuilder) -> Result<Value, TransportError> {
        let started = Instant::now();
        let res = rb.send().await.map_err(|e| map_reqwest(url, e));
        histogram!("http_request_ms", started.elapsed().as_secs_f64() * 1000.0, "method" => method.as_str());
        let resp = res?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND { return Err(TransportError::NotFound(url.to_string())); }
        if !status.is_success() { return Err(TransportError::Status { status: status.as_u16(), url: url.to_string() }); }
        resp.json::<Value>().await.map_err(|e| map_reqwest(url, e))
    }

    fn with_headers(mut rb: reqwest::RequestBuilder, headers: &Headers) -> reqwest::RequestBuilder {
        for (k, v) in headers {
            rb = rb.header(k.as_str(), v.as_str());
        }
        rb
    }
}

fn map_reqwest(url: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(url.to_string())
    } else if e.is_connect() {
        TransportError::Connect(format!("{url}: {e}"))
    } else {
        TransportError::Body(format!("{url}: {e}"))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Value, TransportError> {
        let rb = Self::with_headers(self.client.get(url), headers);
        self.execute(Method::Get, url, rb).await
    }

    async fn post(&self, url: &str, headers: &Headers, body: &Value) -> Result<Value, TransportError> {
        let rb = Self::with_headers(self.client.post(url), headers).json(body);
        self.execute(Method::Post, url, rb).await
    }
}

/// One immediate retry on timeout or connection error; anything else, or a
/// second failure, propagates.
pub struct RetryingTransport<T> {
    inner: T,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(inner: T) -> Self { Self { inner } }

    pub fn inner(&self) -> &T { &self.inner }

    fn note_retry(method: Method, url: &str, err: &TransportError) {
        warn!(method = method.as_str(), url, error = %err, "transport: transient failure; retrying once");
        counter!("http_retries_total", 1u64, "method" => method.as_str());
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryingTransport<T> {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Value, TransportError> {
        match self.inner.get(url, headers).await {
            Err(e) if e.is_transient() => {
                Self::note_retry(Method::Get, url, &e);
                self.inner.get(url, headers).await
            }
            other => other,
        }
    }

    async fn post(&self, url: &str, headers: &Headers, body: &Value) -> Result<Value, TransportError> {
        match self.inner.post(url, headers, body).await {
            Err(e) if e.is_transient() => {
                Self::note_retry(Method::Post, url, &e);
                self.inner.post(url, headers, body).await
            }
            other => other,
        }
    }
}
