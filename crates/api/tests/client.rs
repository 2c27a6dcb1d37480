use std::sync::Arc;

use ffbb_api::{ApiError, CachingTransport, ClientConfig, FfbbApi, FfbbClient, Method, MockTransport, RetryingTransport, Transport, TransportError};
use ffbb_core::fields::{FieldPreset, FieldSet};
use ffbb_persist::{CacheStore, MemoryStore, StorePolicy};
use ffbb_schema::Hit;
use ffbb_search::{CategoryFilter, SearchIndex, SearchQuery};
use serde_json::{json, Value};

fn cfg_with_tokens() -> ClientConfig {
    ClientConfig {
        api_url: "https://api.test".into(),
        search_url: "https://search.test/".into(),
        api_token: Some("dh".into()),
        search_token: Some("ms".into()),
        ..ClientConfig::default()
    }
}

fn query_of(url: &str) -> Vec<(String, String)> {
    reqwest::Url::parse(url).unwrap().query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
}

fn search_result(uid: &str, hits: Value) -> Value {
    json!({"indexUid": uid, "hits": hits, "query": "Test", "limit": 10, "offset": 0,
           "estimatedTotalHits": hits.as_array().map(|a| a.len()).unwrap_or(0), "processingTimeMs": 1})
}

async fn client(mock: &Arc<MockTransport>) -> FfbbClient {
    FfbbClient::with_transport(cfg_with_tokens(), mock.clone()).await.unwrap()
}

#[tokio::test]
async fn configured_tokens_skip_the_configuration_document() {
    let mock = Arc::new(MockTransport::new());
    let _c = client(&mock).await;
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn tokens_come_from_the_configuration_document() {
    let mock = Arc::new(
        MockTransport::new()
            .on_get("items/configuration", Ok(json!({"data": {"key_dh": "from-doc", "key_ms": "search-doc"}})))
            .on_get("ffbbserver_organismes", Ok(json!({"data": {"id": "9", "nom": "Test BC"}}))),
    );
    let cfg = ClientConfig { api_token: None, search_token: None, ..cfg_with_tokens() };
    let c = FfbbClient::with_transport(cfg, mock.clone()).await.unwrap();
    c.organisme("9", &FieldSet::default()).await.unwrap();
    let calls = mock.calls();
    assert_eq!(calls[0].url, "https://api.test/items/configuration");
    assert_eq!(calls[0].header("Authorization"), None);
    assert_eq!(calls[1].header("authorization"), Some("Bearer from-doc"));
}

#[tokio::test]
async fn missing_token_fails_before_any_data_call() {
    let mock = Arc::new(MockTransport::new().on_get("items/configuration", Ok(json!({"data": {"key_dh": "dh"}}))));
    let cfg = ClientConfig { api_token: None, search_token: None, ..cfg_with_tokens() };
    let err = FfbbClient::with_transport(cfg, mock.clone()).await.err().unwrap();
    assert!(matches!(err, ApiError::Token(ref m) if m.contains("key_ms")), "{err}");
    assert_eq!(mock.call_count(), 1);

    let unreachable = Arc::new(MockTransport::new());
    let cfg = ClientConfig { search_token: None, ..cfg_with_tokens() };
    assert!(matches!(FfbbClient::with_transport(cfg, unreachable).await, Err(ApiError::Token(_))));
}

#[tokio::test]
async fn organisme_request_carries_fields_and_deep_limits() {
    let mock = Arc::new(MockTransport::new().on_get(
        "ffbbserver_organismes/9326",
        Ok(json!({"data": {"id": 9326, "nom": "Test BC", "code": "ARA0001", "type": "Club"}})),
    ));
    let c = client(&mock).await;
    let org = c.organisme("9326", &FieldSet::Preset(FieldPreset::Basic)).await.unwrap().unwrap();
    assert_eq!(org.id, "9326");
    assert_eq!(org.display_name(), "Test BC (ARA0001)");

    let call = &mock.calls()[0];
    assert_eq!(call.method, Method::Get);
    assert!(call.url.starts_with("https://api.test/items/ffbbserver_organismes/9326?"));
    let q = query_of(&call.url);
    assert!(q.iter().any(|(k, v)| k == "fields[]" && v == "id"));
    assert!(q.iter().any(|(k, v)| k == "deep[engagements][_limit]" && v == "200"));
}

#[tokio::test]
async fn absent_records_are_none() {
    let mock = Arc::new(
        MockTransport::new()
            .on_get("ffbbserver_poules/gone", Err(TransportError::NotFound("gone".into())))
            .on_get("ffbbserver_poules/empty", Ok(json!({"data": null}))),
    );
    let c = client(&mock).await;
    assert_eq!(c.poule("gone", &FieldSet::default()).await.unwrap(), None);
    assert_eq!(c.poule("empty", &FieldSet::default()).await.unwrap(), None);
}

#[tokio::test]
async fn malformed_records_and_envelopes_are_decode_errors() {
    let mock = Arc::new(
        MockTransport::new()
            .on_get("ffbbserver_competitions/noid", Ok(json!({"data": {"nom": "Championnat"}})))
            .on_get("ffbbserver_competitions/bare", Ok(json!({"id": "bare"}))),
    );
    let c = client(&mock).await;
    assert!(matches!(c.competition("noid", &FieldSet::default()).await, Err(ApiError::Decode(_))));
    assert!(matches!(c.competition("bare", &FieldSet::default()).await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn inapplicable_preset_fails_without_a_request() {
    let mock = Arc::new(MockTransport::new());
    let c = client(&mock).await;
    let err = c.rencontre("1", &FieldSet::Preset(FieldPreset::RankingOnly)).await.unwrap_err();
    assert!(matches!(err, ApiError::Fields(_)));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn transport_failures_surface_as_no_result() {
    let status = || Err(TransportError::Status { status: 500, url: "x".into() });
    let mock = Arc::new(
        MockTransport::new()
            .on_get("ffbbserver_rencontres", status())
            .on_get("ffbbserver_saisons", status())
            .on_get("items/lives", Err(TransportError::Body("truncated".into())))
            .on_post("multi-search", Err(TransportError::Timeout("t".into()))),
    );
    let c = client(&mock).await;
    assert_eq!(c.rencontre("1", &FieldSet::default()).await.unwrap(), None);
    assert!(c.saisons(false, &FieldSet::default()).await.unwrap().is_empty());
    assert!(c.lives().await.unwrap().is_empty());
    assert!(c.search(vec![SearchQuery::new(SearchIndex::Salles)]).await.unwrap().is_empty());
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn active_saisons_use_an_equality_filter() {
    let mock = Arc::new(MockTransport::new().on_get(
        "ffbbserver_saisons",
        Ok(json!({"data": [{"id": "2024", "libelle": "2024-2025", "actif": true}]})),
    ));
    let c = client(&mock).await;
    let saisons = c.saisons(true, &FieldSet::default()).await.unwrap();
    assert_eq!(saisons.len(), 1);
    assert!(saisons[0].is_current());
    let q = query_of(&mock.calls()[0].url);
    assert!(q.contains(&("filter[actif][_eq]".to_string(), "true".to_string())));
    assert!(!q.iter().any(|(k, _)| k.starts_with("deep[")));
}

#[tokio::test]
async fn lives_decode_as_a_list() {
    let mock = Arc::new(MockTransport::new().on_get(
        "items/lives",
        Ok(json!({"data": [{"matchId": 1, "teamName_home": "A", "teamName_out": "B", "score_home": 72, "score_out": 65}]})),
    ));
    let c = client(&mock).await;
    let lives = c.lives().await.unwrap();
    assert_eq!(lives[0].match_id, "1");
    assert_eq!(lives[0].score_line(), "72 - 65");
}

#[tokio::test]
async fn transient_failures_are_retried_once() {
    let mock = Arc::new(MockTransport::new().route(
        Method::Get,
        "ffbbserver_organismes",
        vec![Err(TransportError::Timeout("t".into())), Ok(json!({"data": {"id": "1"}}))],
    ));
    let retrying: Arc<dyn Transport> = Arc::new(RetryingTransport::new(mock.clone()));
    let c = FfbbClient::with_transport(cfg_with_tokens(), retrying).await.unwrap();
    assert!(c.organisme("1", &FieldSet::default()).await.unwrap().is_some());
    assert_eq!(mock.call_count(), 2);

    let failing = Arc::new(MockTransport::new().on_get("ffbbserver_organismes", Err(TransportError::Connect("refused".into()))));
    let retrying: Arc<dyn Transport> = Arc::new(RetryingTransport::new(failing.clone()));
    let c = FfbbClient::with_transport(cfg_with_tokens(), retrying).await.unwrap();
    assert_eq!(c.organisme("1", &FieldSet::default()).await.unwrap(), None);
    assert_eq!(failing.call_count(), 2);

    let missing = Arc::new(MockTransport::new());
    let retrying: Arc<dyn Transport> = Arc::new(RetryingTransport::new(missing.clone()));
    let c = FfbbClient::with_transport(cfg_with_tokens(), retrying).await.unwrap();
    assert_eq!(c.organisme("1", &FieldSet::default()).await.unwrap(), None);
    assert_eq!(missing.call_count(), 1);
}

#[tokio::test]
async fn cached_responses_skip_the_network() {
    let mock = Arc::new(MockTransport::new().on_get("ffbbserver_organismes", Ok(json!({"data": {"id": "1", "nom": "Test BC"}}))));
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new(StorePolicy::default()));
    let cached: Arc<dyn Transport> = Arc::new(CachingTransport::new(mock.clone(), store.clone(), "ffbb:"));
    let c = FfbbClient::with_transport(cfg_with_tokens(), cached).await.unwrap();
    let a = c.organisme("1", &FieldSet::default()).await.unwrap();
    let b = c.organisme("1", &FieldSet::default()).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(mock.call_count(), 1);
    assert_eq!(store.len().unwrap(), 1);
}

#[tokio::test]
async fn search_sends_one_batch_and_filters_hits() {
    let mock = Arc::new(MockTransport::new().on_post(
        "multi-search",
        Ok(json!({"results": [
            search_result("ffbbserver_salles", json!([{"id": "s1", "libelle": "Salle Test"}])),
            search_result("ffbbserver_rencontres", json!([
                {"id": "match_Test_1", "nomEquipe1": "Test A", "nomEquipe2": "B",
                 "competitionId": {"id": "c1", "categorie": {"code": "U11M"}}},
                {"id": "match_Test_2", "nomEquipe1": "Test A", "nomEquipe2": "B",
                 "competitionId": {"id": "c2", "categorie": {"code": "U13F"}}},
                {"id": "other", "nomEquipe1": "A", "nomEquipe2": "B",
                 "competitionId": {"id": "c3", "categorie": {"code": "U11M"}}}
            ])),
        ]})),
    ));
    let c = client(&mock).await;
    let results = c
        .search(vec![
            SearchQuery::new(SearchIndex::Rencontres).term("Test").category(CategoryFilter::new("U11M")),
            SearchQuery::new(SearchIndex::Salles).term("Test"),
        ])
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].index, SearchIndex::Rencontres);
    assert_eq!(results[0].hits.len(), 1);
    assert_eq!(results[0].hits[0].id(), "match_Test_1");
    assert_eq!(results[0].estimated_total_hits, Some(1));
    assert!(matches!(results[1].hits[0], Hit::Salle(_)));

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, "https://search.test/multi-search");
    assert_eq!(calls[0].header("Authorization"), Some("Bearer ms"));
    let body = calls[0].body.as_ref().unwrap();
    assert_eq!(body["queries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn search_batch_mismatch_is_an_error() {
    let mock = Arc::new(MockTransport::new().on_post("multi-search", Ok(json!({"results": []}))));
    let c = client(&mock).await;
    let err = c.search(vec![SearchQuery::new(SearchIndex::Salles)]).await.unwrap_err();
    assert!(matches!(err, ApiError::Search(_)));
}

#[tokio::test]
async fn search_all_queries_every_index() {
    let results: Vec<Value> = SearchIndex::ALL.iter().map(|i| search_result(i.uid(), json!([]))).collect();
    let mock = Arc::new(MockTransport::new().on_post("multi-search", Ok(json!({ "results": results }))));
    let c = client(&mock).await;
    let out = c.search_all(Some("Test")).await.unwrap();
    assert_eq!(out.len(), SearchIndex::ALL.len());
    assert!(out.iter().all(|r| r.hits.is_empty()));
}
