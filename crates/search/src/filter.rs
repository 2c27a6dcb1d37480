//! Client-side narrowing of search hits.

use ffbb_schema::{Hit, HitKind};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Case and accent folding: NFD, drop combining marks, lowercase, collapse whitespace.
pub fn fold(s: &str) -> String {
    let stripped: String = s.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Folded term tokens; empty when the term carries no text.
pub(crate) fn term_tokens(term: &str) -> Vec<String> { fold(term).split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect() }

/// Every token of the term occurs in the hit's identifying text.
pub(crate) fn hit_matches_tokens(hit: &Hit, tokens: &[String]) -> bool {
    if tokens.is_empty() { return true; }
    let haystack = fold(&hit.identifying_text().join(" "));
    tokens.iter().all(|t| haystack.contains(t.as_str()))
}

/// Narrow hits by competition category (code such as `U11M`, or label).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    needle: String,
}

impl CategoryFilter {
    pub fn new(code_or_label: impl Into<String>) -> Self { Self { needle: code_or_label.into().trim().to_string() } }

    pub fn needle(&self) -> &str { &self.needle }

    /// Hits of kinds without a category pass. Match and competition hits must
    /// carry a category equal to the needle.
    pub fn accepts(&self, hit: &Hit) -> bool {
        match hit.kind() {
            HitKind::Rencontre | HitKind::Competition => hit
                .categorie()
                .map(|c| c.matches(&self.needle) || c.libelle.as_deref().map(|l| fold(l) == fold(&self.needle)).unwrap_or(false))
                .unwrap_or(false),
            _ => true,
        }
    }
}
