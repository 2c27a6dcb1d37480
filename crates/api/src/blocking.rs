//! Synchronous wrapper: one current-thread runtime per client.

use std::sync::Arc;

use ffbb_core::fields::FieldSet;
use ffbb_schema::{Competition, Live, Organisme, Poule, Rencontre, Saison};
use ffbb_search::{SearchQuery, SearchResult};
use tokio::runtime::{Builder, Runtime};

use crate::client::FfbbClient;
use crate::config::ClientConfig;
use crate::transport::Transport;
use crate::{ApiResult, FfbbApi};

/// Must not be used from inside another tokio runtime.
pub struct BlockingClient {
    rt: Runtime,
    inner: FfbbClient,
}

impl BlockingClient {
    pub fn connect(config: ClientConfig) -> ApiResult<Self> {
        let rt = runtime()?;
        let inner = rt.block_on(FfbbClient::connect(config))?;
        Ok(Self { rt, inner })
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> ApiResult<Self> {
        let rt = runtime()?;
        let inner = rt.block_on(FfbbClient::with_transport(config, transport))?;
        Ok(Self { rt, inner })
    }

    pub fn client(&self) -> &FfbbClient { &self.inner }

    pub fn organisme(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Organisme>> {
        self.rt.block_on(self.inner.organisme(id, fields))
    }

    pub fn competition(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Competition>> {
        self.rt.block_on(self.inner.competition(id, fields))
    }

    pub fn poule(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Poule>> { self.rt.block_on(self.inner.poule(id, fields)) }

    pub fn rencontre(&self, id: &str, fields: &FieldSet) -> ApiResult<Option<Rencontre>> {
        self.rt.block_on(self.inner.rencontre(id, fields))
    }

    pub fn saisons(&self, active_only: bool, fields: &FieldSet) -> ApiResult<Vec<Saison>> {
        self.rt.block_on(self.inner.saisons(active_only, fields))
    }

    pub fn lives(&self) -> ApiResult<Vec<Live>> { self.rt.block_on(self.inner.lives()) }

    pub fn search(&self, queries: Vec<SearchQuery>) -> ApiResult<Vec<SearchResult>> { self.rt.block_on(self.inner.search(queries)) }

    pub fn search_all(&self, term: Option<&str>) -> ApiResult<Vec<SearchResult>> { self.rt.block_on(self.inner.search_all(term)) }
}

fn runtime() -> ApiResult<Runtime> { Ok(Builder::new_current_thread().enable_all().build()?) }
