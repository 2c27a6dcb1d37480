//! Canned transport for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::transport::{Headers, Method, Transport, TransportError};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Value>,
}

impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

struct Route {
    method: Method,
    url_contains: String,
    /// Served front to back; the last reply repeats.
    replies: VecDeque<Result<Value, TransportError>>,
}

/// Serves replies by method and URL substring (first registered route wins)
/// and records every call. Unrouted requests get `NotFound`.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self { Self::default() }

    pub fn on_get(self, url_contains: &str, reply: Result<Value, TransportError>) -> Self {
        self.route(Method::Get, url_contains, vec![reply])
    }

    pub fn on_post(self, url_contains: &str, reply: Result<Value, TransportError>) -> Self {
        self.route(Method::Post, url_contains, vec![reply])
    }

    /// Serve `replies` in order on successive matching calls.
    pub fn route(self, method: Method, url_contains: &str, replies: Vec<Result<Value, TransportError>>) -> Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(Route { method, url_contains: url_contains.to_string(), replies: replies.into() });
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> { self.calls.lock().map(|c| c.clone()).unwrap_or_default() }

    pub fn call_count(&self) -> usize { self.calls.lock().map(|c| c.len()).unwrap_or(0) }

    fn serve(&self, method: Method, url: &str, headers: &Headers, body: Option<&Value>) -> Result<Value, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall { method, url: url.to_string(), headers: headers.clone(), body: body.cloned() });
        }
        let mut routes = self.routes.lock().map_err(|_| TransportError::Body("mock lock poisoned".into()))?;
        let route = routes
            .iter_mut()
            .find(|r| r.method == method && url.contains(&r.url_contains))
            .ok_or_else(|| TransportError::NotFound(url.to_string()))?;
        let reply = if route.replies.len() > 1 { route.replies.pop_front() } else { route.replies.front().cloned() };
        reply.unwrap_or_else(|| Err(TransportError::NotFound(url.to_string())))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Value, TransportError> { self.serve(Method::Get, url, headers, None) }

    async fn post(&self, url: &str, headers: &Headers, body: &Value) -> Result<Value, TransportError> {
        self.serve(Method::Post, url, headers, Some(body))
    }
}
