// src/matching/normalize.rs

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;

/// Generic legal suffixes dropped during normalization. These carry no
/// identity signal ("Acme, Inc." and "Acme LLC" are the same company).
pub const COMPANY_SUFFIXES: [&str; 20] = [
    "inc",
    "llc",
    "lp",
    "l.p.",
    "corp",
    "corporation",
    "ltd",
    "limited",
    "co",
    "holdings",
    "group",
    "holdco",
    "parent",
    "topco",
    "bidco",
    "buyer",
    "acquiror",
    "investor",
    "acquisition",
    "purchaser",
];

/// Connector words dropped during normalization.
pub const CONNECTOR_WORDS: [&str; 6] = ["and", "the", "of", "dba", "fka", "aka"];

/// Default capacity for per-worker normalization caches. Holdings repeat the
/// same raw names across filings, so the hit rate is high.
pub const NORMALIZER_CACHE_CAPACITY: usize = 10_000;

static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());
static PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,.()]").unwrap());

static SUFFIX_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| COMPANY_SUFFIXES.iter().copied().collect());
static CONNECTOR_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| CONNECTOR_WORDS.iter().copied().collect());

/// Normalize a company name for comparison:
/// lowercase, remove parenthetical content (e.g. "(dba Aptean)"), replace
/// punctuation with spaces, drop legal suffixes and connector words, and
/// rejoin on single spaces. Pure and deterministic; the result doubles as a
/// lookup key, so any change here invalidates stored normalized indexes.
pub fn normalize_name(name: &str) -> String {
    if name.trim().is_empty() {
        return String::new();
    }

    let text = name.to_lowercase();
    let text = PAREN_RE.replace_all(&text, "");
    let text = PUNCT_RE.replace_all(&text, " ");

    text.split_whitespace()
        .filter(|word| !SUFFIX_SET.contains(word) && !CONNECTOR_SET.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Single predicate for "this company_id is not set". Upstream CSV sources
/// leave several sentinel spellings behind (empty cell, "nan", "none").
pub fn is_absent(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(raw) => {
            let trimmed = raw.trim();
            trimmed.is_empty()
                || trimmed.eq_ignore_ascii_case("nan")
                || trimmed.eq_ignore_ascii_case("none")
                || trimmed.eq_ignore_ascii_case("null")
        }
    }
}

/// The normalized view of one raw name: the normalized string plus its token
/// set, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub normalized: String,
    pub tokens: HashSet<String>,
}

impl NormalizedName {
    pub fn of(raw: &str) -> Self {
        let normalized = normalize_name(raw);
        let tokens = if normalized.is_empty() {
            HashSet::new()
        } else {
            normalized.split_whitespace().map(str::to_string).collect()
        };
        Self { normalized, tokens }
    }
}

/// Bounded memo over [`NormalizedName::of`]. Each resolver worker owns one,
/// so there is no cross-task contention.
pub struct CachedNormalizer {
    cache: LruCache<String, Arc<NormalizedName>>,
}

impl CachedNormalizer {
    pub fn new() -> Self {
        Self::with_capacity(NORMALIZER_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, raw: &str) -> Arc<NormalizedName> {
        if let Some(hit) = self.cache.get(raw) {
            return Arc::clone(hit);
        }
        let computed = Arc::new(NormalizedName::of(raw));
        self.cache.put(raw.to_string(), Arc::clone(&computed));
        computed
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for CachedNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_suffix_and_punctuation() {
        assert_eq!(normalize_name("Acme, Inc."), "acme");
        assert_eq!(normalize_name("ACME INC"), "acme");
        assert_eq!(normalize_name("Acme, Inc."), normalize_name("ACME INC"));
    }

    #[test]
    fn removes_parenthetical_content() {
        assert_eq!(
            normalize_name("Step2 Holdings (fka The Step2 Company)"),
            "step2"
        );
        assert_eq!(normalize_name("Aptean, Inc. (dba Aptean)"), "aptean");
    }

    #[test]
    fn drops_connector_words() {
        assert_eq!(
            normalize_name("The Brock Group of Companies"),
            "brock companies"
        );
    }

    #[test]
    fn empty_and_whitespace_yield_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
        assert_eq!(normalize_name("Inc. LLC"), "");
    }

    #[test]
    fn preserves_identity_tokens() {
        assert_eq!(
            normalize_name("Mustang Prospects Holdco, LLC"),
            "mustang prospects"
        );
        assert_eq!(
            normalize_name("Summit Behavioral Healthcare, LLC"),
            "summit behavioral healthcare"
        );
    }

    #[test]
    fn absent_detects_all_sentinels() {
        assert!(is_absent(None));
        assert!(is_absent(Some("")));
        assert!(is_absent(Some("   ")));
        assert!(is_absent(Some("nan")));
        assert!(is_absent(Some("NaN")));
        assert!(is_absent(Some("None")));
        assert!(!is_absent(Some("cmp_0001")));
    }

    #[test]
    fn cached_normalizer_returns_same_view() {
        let mut cache = CachedNormalizer::with_capacity(4);
        let first = cache.get("Acme Technologies, Inc.");
        let second = cache.get("Acme Technologies, Inc.");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.normalized, "acme technologies");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn normalized_name_tokens_match_normalized_form() {
        let view = NormalizedName::of("Mustang Prospects Holdco, LLC");
        assert_eq!(view.normalized, "mustang prospects");
        assert!(view.tokens.contains("mustang"));
        assert!(view.tokens.contains("prospects"));
        assert_eq!(view.tokens.len(), 2);
    }
}
