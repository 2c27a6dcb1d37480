//! FFBB public API façade.
//!
//! Frontends depend on [`FfbbApi`]; [`FfbbClient`] implements it over a
//! [`Transport`] stack (reqwest, one-shot retry, optional response cache).
//! [`BlockingClient`] wraps the same calls for synchronous callers.

#![forbid(unsafe_code)]

pub mod blocking;
pub mod cache;
pub mod client;
pub mod config;
pub mod mock;
pub mod token;
pub mod transport;

use ffbb_core::fields::{FieldError, FieldSet};
use ffbb_core::DecodeError;
use ffbb_schema::{Competition, Live, Organisme, Poule, Rencontre, Saison};
use ffbb_search::{SearchError, SearchQuery, SearchResult};

pub use blocking::BlockingClient;
pub use cache::CachingTransport;
pub use client::FfbbClient;
pub use config::ClientConfig;
pub use mock::MockTransport;
pub use token::{TokenProvider, Tokens};
pub use transport::{Headers, HttpTransport, Method, RetryingTransport, Transport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("search: {0}")]
    Search(#[from] SearchError),
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("token: {0}")]
    Token(String),
    #[error("config: {0}")]
    Config(String),
    #[error("fields: {0}")]
    Fields(#[from] FieldError),
    #[error("cache: {0}")]
    Cache(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Typed FFBB surface. Single-entity lookups return `Ok(None)` when the
/// platform has no such record or cannot be reached; list and search calls
/// return an empty list in the latter case. Decode, search and token errors raise.
#[async_trait::async_trait]
pub trait FfbbApi: Send + Sync {
    async fn organisme(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Organisme>>;

    async fn competition(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Competition>>;

    async fn poule(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Poule>>;

    async fn rencontre(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Rencontre>>;

    /// All seasons, or only those flagged active.
    async fn saisons(&self, active_only: bool, fields: &FieldSet) -> ApiResult<Vec<Saison>>;

    async fn lives(&self) -> ApiResult<Vec<Live>>;

    /// One multi-search round trip; each result already passed client-side filtering.
    async fn search(&self, queries: Vec<SearchQuery>) -> ApiResult<Vec<SearchResult>>;
}
