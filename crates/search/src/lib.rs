//! FFBB multi-index search: query construction, batch matching and client-side
//! result narrowing.
//!
//! Lifecycle of a query: built with [`SearchQuery`] (or [`generate_queries`]),
//! bundled into a [`SearchBatch`] keyed by index uid, matched back to its
//! result by uid (never by position), then optionally narrowed with
//! [`SearchQuery::filter_result`].

#![forbid(unsafe_code)]

use std::fmt;

use ffbb_core::{expect_list, DecodeError, PathSeg, RecordReader, RecordWriter, Wire, WireEnum};
use ffbb_schema::{Hit, HitKind};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tracing::debug;

pub mod facets;
mod filter;

pub use facets::{FacetDistribution, FacetRange, FacetStats, FacetTally};
pub use filter::{fold, CategoryFilter};

pub const DEFAULT_LIMIT: u32 = 10;

ffbb_core::wire_enum! {
    /// Indices of the search engine. The wire string is the index uid.
    pub enum SearchIndex {
        Organismes => "ffbbserver_organismes",
        Rencontres => "ffbbserver_rencontres",
        Salles => "ffbbserver_salles",
        Terrains => "ffbbserver_terrains",
        Tournois => "ffbbserver_tournois",
        Competitions => "ffbbserver_competitions",
        Pratiques => "ffbbserver_pratiques",
    }
}

impl SearchIndex {
    pub const ALL: [SearchIndex; 7] = [
        SearchIndex::Organismes,
        SearchIndex::Rencontres,
        SearchIndex::Salles,
        SearchIndex::Terrains,
        SearchIndex::Tournois,
        SearchIndex::Competitions,
        SearchIndex::Pratiques,
    ];

    pub fn uid(&self) -> &'static str { self.wire_str() }

    pub fn from_uid(uid: &str) -> Option<Self> {
        Self::VARIANTS.iter().find(|(w, _)| *w == uid).map(|(_, v)| *v)
    }

    /// Accepts the full uid or its short name (`rencontres`).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::from_uid(&s).or_else(|| Self::from_uid(&format!("ffbbserver_{s}")))
    }

    pub fn hit_kind(&self) -> HitKind {
        match self {
            SearchIndex::Organismes => HitKind::Organisme,
            SearchIndex::Rencontres => HitKind::Rencontre,
            SearchIndex::Salles => HitKind::Salle,
            SearchIndex::Terrains => HitKind::Terrain,
            SearchIndex::Tournois => HitKind::Tournoi,
            SearchIndex::Competitions => HitKind::Competition,
            SearchIndex::Pratiques => HitKind::Pratique,
        }
    }

    /// Facets requested by [`generate_queries`].
    pub fn default_facets(&self) -> &'static [&'static str] {
        match self {
            SearchIndex::Organismes => &["type", "offresPratiques", "labellisation"],
            SearchIndex::Rencontres => &["niveau", "competitionId.categorie.code", "competitionId.typeCompetition"],
            SearchIndex::Salles => &[],
            SearchIndex::Terrains => &[],
            SearchIndex::Tournois => &["type", "sexe"],
            SearchIndex::Competitions => &["sexe", "typeCompetition", "categorie.code"],
            SearchIndex::Pratiques => &["type"],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("decode search response: {0}")]
    Decode(#[from] DecodeError),
    #[error("batch mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    BatchMismatch { missing: Vec<String>, unexpected: Vec<String> },
    #[error("index {0} queried twice in one batch")]
    DuplicateIndex(&'static str),
    #[error("empty batch")]
    EmptyBatch,
}

// ---------------- Query ----------------

/// One request unit against one index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub index: SearchIndex,
    pub term: Option<String>,
    pub facets: Vec<String>,
    pub filter: Vec<String>,
    pub sort: Vec<String>,
    pub limit: u32,
    pub offset: u32,
    /// Client-side only; never sent.
    pub category: Option<CategoryFilter>,
}

impl SearchQuery {
    pub fn new(index: SearchIndex) -> Self {
        Self { index, term: None, facets: Vec::new(), filter: Vec::new(), sort: Vec::new(), limit: DEFAULT_LIMIT, offset: 0, category: None }
    }

    pub fn term(mut self, term: impl Into<String>) -> Self {
        let t = term.into();
        self.term = if t.trim().is_empty() { None } else { Some(t) };
        self
    }

    pub fn facets<I, S>(mut self, facets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets = facets.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, expr: impl Into<String>) -> Self {
        self.filter.push(expr.into());
        self
    }

    pub fn sort(mut self, expr: impl Into<String>) -> Self {
        self.sort.push(expr.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn category(mut self, filter: CategoryFilter) -> Self {
        self.category = Some(filter);
        self
    }

    /// One element of the `queries` array. Empty lists and an absent term are omitted.
    pub fn to_wire(&self) -> Value {
        let mut m = Map::new();
        m.insert("indexUid".into(), Value::from(self.index.uid()));
        if let Some(t) = &self.term { m.insert("q".into(), Value::from(t.as_str())); }
        if !self.facets.is_empty() { m.insert("facets".into(), Value::from(self.facets.clone())); }
        m.insert("limit".into(), Value::from(self.limit));
        m.insert("offset".into(), Value::from(self.offset));
        if !self.filter.is_empty() { m.insert("filter".into(), Value::from(self.filter.clone())); }
        if !self.sort.is_empty() { m.insert("sort".into(), Value::from(self.sort.clone())); }
        Value::Object(m)
    }

    /// Relevance predicate for hits of this query's index. Always true without a term.
    pub fn is_valid_hit(&self, hit: &Hit) -> bool {
        match &self.term {
            None => true,
            Some(term) => filter::hit_matches_tokens(hit, &filter::term_tokens(term)),
        }
    }

    fn accepts(&self, hit: &Hit, tokens: &[String]) -> bool {
        filter::hit_matches_tokens(hit, tokens) && self.category.as_ref().map(|c| c.accepts(hit)).unwrap_or(true)
    }

    /// Keep only hits that pass the term predicate and the category filter.
    ///
    /// Without term and category the result is returned unchanged. Otherwise
    /// `estimated_total_hits` becomes the filtered hit count.
    pub fn filter_result(&self, result: &SearchResult) -> SearchResult {
        if self.term.is_none() && self.category.is_none() { return result.clone(); }
        let tokens = self.term.as_deref().map(filter::term_tokens).unwrap_or_default();
        let hits: Vec<Hit> = result.hits.iter().filter(|h| self.accepts(h, &tokens)).cloned().collect();
        let removed = result.hits.len() - hits.len();
        if removed > 0 {
            debug!(index = self.index.uid(), removed, kept = hits.len(), "search: narrowed hits");
        }
        metrics::histogram!("search_filtered_hits", removed as f64, "index" => self.index.uid());
        SearchResult { estimated_total_hits: Some(hits.len() as u64), hits, ..result.clone() }
    }
}

/// One query per known index, all scoped with the same term.
pub fn generate_queries(term: Option<&str>) -> Vec<SearchQuery> {
    SearchIndex::ALL
        .iter()
        .map(|idx| {
            let q = SearchQuery::new(*idx).facets(idx.default_facets().iter().copied());
            match term {
                Some(t) => q.term(t),
                None => q,
            }
        })
        .collect()
}

// ---------------- Result ----------------

/// Result of one index inside a `multi-search` response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub index: SearchIndex,
    pub hits: Vec<Hit>,
    pub query: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub estimated_total_hits: Option<u64>,
    pub processing_time_ms: Option<u64>,
    pub facet_distribution: Option<FacetDistribution>,
    pub facet_stats: Option<FacetStats>,
}

impl SearchResult {
    pub fn index_uid(&self) -> &'static str { self.index.uid() }
}

impl Wire for SearchResult {
    const SHAPE: &'static str = "SearchResult";

    fn from_wire(value: &Value) -> Result<Self, DecodeError> {
        let r = RecordReader::new("SearchResult", value)?;
        let index: SearchIndex = r.required("indexUid")?;
        let kind = index.hit_kind();
        Ok(Self {
            index,
            hits: r.required_with("hits", |v| expect_list(v, |h| kind.decode(h)))?,
            query: r.optional("query"),
            limit: r.optional("limit"),
            offset: r.optional("offset"),
            estimated_total_hits: r.optional("estimatedTotalHits"),
            processing_time_ms: r.optional("processingTimeMs"),
            facet_distribution: r.strict("facetDistribution")?,
            facet_stats: r.strict("facetStats")?,
        })
    }

    fn to_wire(&self) -> Value {
        let mut w = RecordWriter::new();
        w.put("indexUid", &self.index)
            .put_opt("query", &self.query)
            .put_opt("limit", &self.limit)
            .put_opt("offset", &self.offset)
            .put_opt("estimatedTotalHits", &self.estimated_total_hits)
            .put_opt("processingTimeMs", &self.processing_time_ms)
            .put_opt("facetDistribution", &self.facet_distribution)
            .put_opt("facetStats", &self.facet_stats);
        let mut v = w.finish();
        if let Value::Object(m) = &mut v {
            m.insert("hits".into(), Value::Array(self.hits.iter().map(Hit::to_wire).collect()));
        }
        v
    }
}

// ---------------- Batch ----------------

/// Queries submitted together, keyed by index uid.
#[derive(Debug, Clone)]
pub struct SearchBatch {
    order: Vec<SearchIndex>,
    queries: FxHashMap<&'static str, SearchQuery>,
}

/// A result paired with the query that produced it.
#[derive(Debug, Clone)]
pub struct MatchedResult {
    pub query: SearchQuery,
    pub result: SearchResult,
}

impl MatchedResult {
    pub fn filtered(&self) -> SearchResult { self.query.filter_result(&self.result) }
}

impl SearchBatch {
    pub fn new(queries: impl IntoIterator<Item = SearchQuery>) -> Result<Self, SearchError> {
        let mut order = Vec::new();
        let mut map: FxHashMap<&'static str, SearchQuery> = FxHashMap::default();
        for q in queries {
            let uid = q.index.uid();
            if map.contains_key(uid) { return Err(SearchError::DuplicateIndex(uid)); }
            order.push(q.index);
            map.insert(uid, q);
        }
        if order.is_empty() { return Err(SearchError::EmptyBatch); }
        Ok(Self { order, queries: map })
    }

    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    pub fn get(&self, index: SearchIndex) -> Option<&SearchQuery> { self.queries.get(index.uid()) }

    pub fn queries(&self) -> impl Iterator<Item = &SearchQuery> { self.order.iter().filter_map(|i| self.queries.get(i.uid())) }

    /// `{"queries": [...]}` in submission order.
    pub fn body(&self) -> Value {
        let qs: Vec<Value> = self.queries().map(SearchQuery::to_wire).collect();
        let mut m = Map::new();
        m.insert("queries".into(), Value::Array(qs));
        Value::Object(m)
    }

    /// Pair every result of `{"results": [...]}` with its query by index uid.
    ///
    /// Output follows submission order. A missing or unexpected index fails
    /// the whole batch.
    pub fn match_results(&self, response: &Value) -> Result<Vec<MatchedResult>, SearchError> {
        const ENTITY: &str = "MultiSearchResponse";
        let r = RecordReader::new(ENTITY, response)?;
        let raw = match r.raw("results") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(DecodeError::shape("list", other).within(PathSeg::Key("results".into())).in_entity(ENTITY).into())
            }
            None => return Err(DecodeError::missing("results").in_entity(ENTITY).into()),
        };

        let mut by_uid: FxHashMap<String, &Value> = FxHashMap::default();
        let mut unexpected = Vec::new();
        for v in raw {
            let uid = v.get("indexUid").and_then(Value::as_str).unwrap_or_default().to_string();
            if self.queries.contains_key(uid.as_str()) && !by_uid.contains_key(&uid) {
                by_uid.insert(uid, v);
            } else {
                unexpected.push(uid);
            }
        }
        let missing: Vec<String> =
            self.order.iter().map(|i| i.uid()).filter(|uid| !by_uid.contains_key(*uid)).map(str::to_string).collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(SearchError::BatchMismatch { missing, unexpected });
        }

        let mut out = Vec::with_capacity(self.order.len());
        for idx in &self.order {
            let (Some(query), Some(v)) = (self.queries.get(idx.uid()), by_uid.get(idx.uid())) else { continue };
            out.push(MatchedResult { query: query.clone(), result: SearchResult::from_wire(v)? });
        }
        Ok(out)
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} q={:?} limit={} offset={}", self.index.uid(), self.term.as_deref().unwrap_or(""), self.limit, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn index_uids_round_trip() {
        for idx in SearchIndex::ALL {
            assert_eq!(SearchIndex::from_uid(idx.uid()), Some(idx));
        }
        assert_eq!(SearchIndex::parse("rencontres"), Some(SearchIndex::Rencontres));
        assert_eq!(SearchIndex::parse("ffbbserver_salles"), Some(SearchIndex::Salles));
        assert_eq!(SearchIndex::parse("joueurs"), None);
    }

    #[test]
    fn query_wire_shape() {
        let q = SearchQuery::new(SearchIndex::Rencontres).term("Orléans").facets(["niveau"]).filter("niveau = 'Départemental'").limit(5);
        assert_eq!(
            q.to_wire(),
            json!({"indexUid": "ffbbserver_rencontres", "q": "Orléans", "facets": ["niveau"],
                   "limit": 5, "offset": 0, "filter": ["niveau = 'Départemental'"]})
        );
        let bare = SearchQuery::new(SearchIndex::Salles).term("  ");
        assert_eq!(bare.to_wire(), json!({"indexUid": "ffbbserver_salles", "limit": 10, "offset": 0}));
    }

    #[test]
    fn generate_queries_covers_every_index_once() {
        let qs = generate_queries(Some("Paris"));
        assert_eq!(qs.len(), SearchIndex::ALL.len());
        assert!(qs.iter().all(|q| q.term.as_deref() == Some("Paris")));
        let batch = SearchBatch::new(qs).unwrap();
        assert_eq!(batch.body()["queries"].as_array().map(Vec::len), Some(7));
        assert!(generate_queries(None).iter().all(|q| q.term.is_none()));
    }

    #[test]
    fn duplicate_and_empty_batches_are_rejected() {
        let qs = vec![SearchQuery::new(SearchIndex::Salles), SearchQuery::new(SearchIndex::Salles)];
        assert!(matches!(SearchBatch::new(qs), Err(SearchError::DuplicateIndex("ffbbserver_salles"))));
        assert!(matches!(SearchBatch::new(Vec::new()), Err(SearchError::EmptyBatch)));
    }

    #[test]
    fn result_with_list_facets_fails() {
        let v = json!({"indexUid": "ffbbserver_salles", "hits": [], "facetDistribution": []});
        assert!(SearchResult::from_wire(&v).is_err());
        let v = json!({"indexUid": "ffbbserver_joueurs", "hits": []});
        assert!(SearchResult::from_wire(&v).is_err());
    }
}
