use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use ffbb_core::fields::{default_deep_limits, resolve, DeepLimit, EntityKind, FieldSet};
use ffbb_core::{expect_list, DecodeError, Record};
use ffbb_schema::{Competition, Live, Organisme, Poule, Rencontre, Saison};
use ffbb_search::{generate_queries, MatchedResult, SearchBatch, SearchQuery, SearchResult};
use serde_json::Value;
use metrics::counter;
use tracing::{info, warn};

use crate::cache::CachingTransport;
use crate::config::ClientConfig;
use crate::token::{TokenProvider, Tokens};
use crate::transport::{Headers, HttpTransport, RetryingTransport, Transport, TransportError};
use crate::{ApiError, ApiResult, FfbbApi};

pub const LIVES_PATH: &str = "items/lives";
pub const MULTI_SEARCH_PATH: &str = "multi-search";

/// Async client over both backends. Construction resolves tokens, so a
/// client that exists can always authenticate.
pub struct FfbbClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    tokens: Tokens,
}

impl FfbbClient {
    /// reqwest transport with one-shot retry, behind the response cache when enabled.
    pub async fn connect(config: ClientConfig) -> ApiResult<Self> {
        let retrying = RetryingTransport::new(HttpTransport::new(config.timeout())?);
        let transport: Arc<dyn Transport> = match config.cache.open().map_err(|e| ApiError::Cache(format!("{e:#}")))? {
            Some(store) => {
                info!(backend = ?store.backend(), "api: response cache enabled");
                Arc::new(CachingTransport::new(retrying, store, config.cache.key_prefix.clone()))
            }
            None => Arc::new(retrying),
        };
        Self::with_transport(config, transport).await
    }

    pub async fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> ApiResult<Self> {
        let tokens = TokenProvider::new(&config).resolve(transport.as_ref()).await?;
        Ok(Self { config, transport, tokens })
    }

    pub fn config(&self) -> &ClientConfig { &self.config }

    fn api_headers(&self) -> Headers { vec![("Authorization".into(), format!("Bearer {}", self.tokens.api))] }

    fn search_headers(&self) -> Headers { vec![("Authorization".into(), format!("Bearer {}", self.tokens.search))] }

    /// `{base}/items/{collection}[/{id}]?fields[]=..&deep[..][_limit]=N&extra..`
    pub fn item_url(&self, kind: EntityKind, id: Option<&str>, fields: &[String], extra: &[(&str, &str)]) -> ApiResult<String> {
        let base = format!("{}/items/{}", self.config.api_base(), kind.collection());
        let mut url = reqwest::Url::parse(&base).map_err(|e| ApiError::Config(format!("api url {base:?}: {e}")))?;
        if let Some(id) = id {
            url.path_segments_mut().map_err(|_| ApiError::Config(format!("api url {base:?} cannot take a path")))?.push(id);
        }
        let deep: Vec<DeepLimit> = if id.is_some() { default_deep_limits(kind) } else { Vec::new() };
        if !fields.is_empty() || !deep.is_empty() || !extra.is_empty() {
            let mut q = url.query_pairs_mut();
            for f in fields {
                q.append_pair("fields[]", f);
            }
            for d in &deep {
                q.append_pair(&d.query_key(), &d.limit.to_string());
            }
            for (k, v) in extra {
                q.append_pair(k, v);
            }
        }
        Ok(url.into())
    }

    async fn get_entity<T: Record>(&self, kind: EntityKind, id: &str, fields: &FieldSet) -> ApiResult<Option<T>> {
        let t0 = Instant::now();
        let paths = resolve(kind, fields)?;
        let url = self.item_url(kind, Some(id), &paths, &[])?;
        let out = match self.transport.get(&url, &self.api_headers()).await {
            Err(TransportError::NotFound(_)) => None,
            Err(e) => {
                gave_up(T::ENTITY, &url, &e);
                None
            }
            Ok(doc) => match envelope(&doc)? {
                Value::Null => None,
                data => Some(T::from_wire(data)?),
            },
        };
        info!(entity = T::ENTITY, id, found = out.is_some(), took_ms = %t0.elapsed().as_millis(), "api: get ok");
        Ok(out)
    }

    async fn get_list<T: Record>(&self, url: &str, headers: &Headers) -> ApiResult<Vec<T>> {
        let doc = match self.transport.get(url, headers).await {
            Ok(doc) => doc,
            Err(TransportError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => {
                gave_up(T::ENTITY, url, &e);
                return Ok(Vec::new());
            }
        };
        match envelope(&doc)? {
            Value::Null => Ok(Vec::new()),
            data => Ok(expect_list(data, T::from_wire).map_err(|e| e.in_entity("Envelope"))?),
        }
    }

    /// Submit a batch and pair every result with its query. Nothing comes
    /// back when the search engine stays unreachable.
    pub async fn multi_search(&self, batch: &SearchBatch) -> ApiResult<Vec<MatchedResult>> {
        let t0 = Instant::now();
        let url = format!("{}/{}", self.config.search_base(), MULTI_SEARCH_PATH);
        let resp = match self.transport.post(&url, &self.search_headers(), &batch.body()).await {
            Ok(resp) => resp,
            Err(e) => {
                gave_up("multi-search", &url, &e);
                return Ok(Vec::new());
            }
        };
        let matched = batch.match_results(&resp)?;
        info!(queries = batch.len(), took_ms = %t0.elapsed().as_millis(), "api: multi-search ok");
        Ok(matched)
    }

    /// Every index with the same term, narrowed client-side.
    pub async fn search_all(&self, term: Option<&str>) -> ApiResult<Vec<SearchResult>> { self.search(generate_queries(term)).await }
}

/// Transport failure after retries: logged and counted, then reported as no result.
fn gave_up(what: &'static str, url: &str, err: &TransportError) {
    warn!(what, url, error = %err, "api: transport failed; returning no result");
    counter!("api_transport_failures_total", 1u64, "what" => what);
}

/// The `data` member of a REST response.
fn envelope(doc: &Value) -> Result<&Value, DecodeError> {
    match doc {
        Value::Object(map) => map.get("data").ok_or_else(|| DecodeError::missing("data").in_entity("Envelope")),
        other => Err(DecodeError::shape("object", other).in_entity("Envelope")),
    }
}

#[async_trait]
impl FfbbApi for FfbbClient {
    async fn organisme(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Organisme>> {
        self.get_entity(EntityKind::Organisme, id, fields).await
    }

    async fn competition(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Competition>> {
        self.get_entity(EntityKind::Competition, id, fields).await
    }

    async fn poule(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Poule>> {
        self.get_entity(EntityKind::Poule, id, fields).await
    }

    async fn rencontre(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Rencontre>> {
        self.get_entity(EntityKind::Rencontre, id, fields).await
    }

    async fn saisons(&self, active_only: bool, fields: &FieldSet) -> ApiResult<Vec<Saison>> {
        let t0 = Instant::now();
        let paths = resolve(EntityKind::Saison, fields)?;
        let extra: &[(&str, &str)] = if active_only { &[("filter[actif][_eq]", "true")] } else { &[] };
        let url = self.item_url(EntityKind::Saison, None, &paths, extra)?;
        let out: Vec<Saison> = self.get_list(&url, &self.api_headers()).await?;
        info!(count = out.len(), active_only, took_ms = %t0.elapsed().as_millis(), "api: saisons ok");
        Ok(out)
    }

    async fn lives(&self) -> ApiResult<Vec<Live>> {
        let t0 = Instant::now();
        let url = format!("{}/{}", self.config.api_base(), LIVES_PATH);
        let out: Vec<Live> = self.get_list(&url, &self.api_headers()).await?;
        info!(count = out.len(), took_ms = %t0.elapsed().as_millis(), "api: lives ok");
        Ok(out)
    }

    async fn search(&self, queries: Vec<SearchQuery>) -> ApiResult<Vec<SearchResult>> {
        let batch = SearchBatch::new(queries)?;
        let matched = self.multi_search(&batch).await?;
        Ok(matched.iter().map(MatchedResult::filtered).collect())
    }
}
