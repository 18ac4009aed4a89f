// src/models/matching.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The matching strategy that produced (or failed to produce) a match.
/// Each method carries a fixed confidence tier, not a learned probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Direct,
    Alias,
    Normalized,
    TokenOverlap,
    FirstEntity,
    Unresolved,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Direct => "direct",
            MatchMethod::Alias => "alias",
            MatchMethod::Normalized => "normalized",
            MatchMethod::TokenOverlap => "token_overlap",
            MatchMethod::FirstEntity => "first_entity",
            MatchMethod::Unresolved => "unresolved",
        }
    }

    /// Fixed confidence tier for the method.
    pub fn base_confidence(&self) -> f64 {
        match self {
            MatchMethod::Direct => 1.0,
            MatchMethod::Alias => 0.95,
            MatchMethod::Normalized => 0.90,
            MatchMethod::TokenOverlap => 0.80,
            MatchMethod::FirstEntity => 0.75,
            MatchMethod::Unresolved => 0.0,
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful match proposed by one cascade strategy.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub company_id: String,
    pub method: MatchMethod,
    pub confidence: f64,
    /// Jaccard similarity, for token-overlap matches.
    pub similarity: Option<f64>,
    /// The intermediate name the match went through (extracted first entity).
    pub via: Option<String>,
}

impl MatchCandidate {
    pub fn new(company_id: String, method: MatchMethod) -> Self {
        Self {
            company_id,
            confidence: method.base_confidence(),
            method,
            similarity: None,
            via: None,
        }
    }
}

/// One row of the append-only resolution log: every holding processed in a
/// run produces exactly one entry, matched or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionLogEntry {
    #[serde(rename = "reported_holding_id")]
    pub holding_id: String,
    pub raw_company_name: String,
    #[serde(default)]
    pub matched_company_id: Option<String>,
    pub match_method: MatchMethod,
    pub match_confidence: f64,
}

/// One row of the append-only consolidation log, per (canonical, duplicate)
/// pair actually merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationLogEntry {
    pub timestamp: NaiveDateTime,
    pub canonical_company_id: String,
    pub canonical_company_name: String,
    pub duplicate_company_id: String,
    pub duplicate_company_name: String,
    pub method: MatchMethod,
    pub reason: String,
}

/// A consolidation candidate that failed a safety check. Skipped candidates
/// are reported, never silently dropped.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedCandidate {
    pub subject: String,
    pub method: MatchMethod,
    pub reason: String,
}

/// A group of canonical companies judged to be the same real-world entity.
#[derive(Debug, Clone)]
pub struct ConsolidationGroup {
    pub canonical_id: String,
    pub duplicate_ids: Vec<String>,
    pub method: MatchMethod,
    pub reason: String,
}
