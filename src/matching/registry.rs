// src/matching/registry.rs

use std::collections::{HashMap, HashSet};

use log::debug;
use sha2::{Digest, Sha256};

use crate::matching::normalize::normalize_name;
use crate::matching::tokens::jaccard_similarity;
use crate::models::core::{CanonicalCompany, EntityAlias};

/// One similarity-search entry: the token set of a distinct normalized
/// company name. Kept in a Vec so iteration order (and therefore tie-breaks)
/// is the company-input order, not hash order.
#[derive(Debug, Clone)]
pub struct TokenEntry {
    pub normalized: String,
    pub tokens: HashSet<String>,
    pub company_id: String,
}

/// Immutable per-run index over canonical companies and their known aliases.
/// Built once from the input tables and shared read-only across resolver
/// workers. If a consolidation run appended aliases, the registry must be
/// rebuilt before the next resolver pass.
#[derive(Debug, Default)]
pub struct CompanyRegistry {
    exact: HashMap<String, String>,
    alias: HashMap<String, String>,
    normalized: HashMap<String, String>,
    token_sets: Vec<TokenEntry>,
    id_to_name: HashMap<String, String>,
    fingerprint: String,
}

impl CompanyRegistry {
    pub fn build(companies: &[CanonicalCompany], aliases: &[EntityAlias]) -> Self {
        let mut exact: HashMap<String, String> = HashMap::with_capacity(companies.len());
        let mut id_to_name: HashMap<String, String> = HashMap::with_capacity(companies.len());

        // Last writer wins on exact-name collisions, mirroring upstream
        // behavior when two rows share a lowercased name.
        for company in companies {
            let name_lower = company.company_name.to_lowercase().trim().to_string();
            exact.insert(name_lower, company.company_id.clone());
            id_to_name.insert(company.company_id.clone(), company.company_name.clone());
        }

        let mut alias_map: HashMap<String, String> = HashMap::new();
        for alias in aliases {
            if alias.is_company() {
                let alias_lower = alias.alias_text.to_lowercase().trim().to_string();
                alias_map.insert(alias_lower, alias.entity_id.clone());
            }
        }

        // Normalized and token indexes are first-writer-wins and iterate the
        // company table in input order so collisions resolve the same way on
        // every run.
        let mut normalized: HashMap<String, String> = HashMap::new();
        let mut token_sets: Vec<TokenEntry> = Vec::new();
        let mut seen_token_keys: HashSet<String> = HashSet::new();

        for company in companies {
            let norm = normalize_name(&company.company_name);
            if norm.is_empty() {
                continue;
            }
            normalized
                .entry(norm.clone())
                .or_insert_with(|| company.company_id.clone());
            if seen_token_keys.insert(norm.clone()) {
                let tokens: HashSet<String> =
                    norm.split_whitespace().map(str::to_string).collect();
                token_sets.push(TokenEntry {
                    normalized: norm,
                    tokens,
                    company_id: company.company_id.clone(),
                });
            }
        }

        let fingerprint = compute_fingerprint(companies, aliases);
        debug!(
            "Registry built: {} exact names, {} aliases, {} normalized forms, fingerprint {}",
            exact.len(),
            alias_map.len(),
            normalized.len(),
            &fingerprint[..12]
        );

        Self {
            exact,
            alias: alias_map,
            normalized,
            token_sets,
            id_to_name,
            fingerprint,
        }
    }

    /// Tier 1.0: exact case-insensitive company-name lookup.
    pub fn lookup_exact(&self, raw_name_lower: &str) -> Option<&str> {
        self.exact.get(raw_name_lower).map(String::as_str)
    }

    /// Tier 0.95: case-insensitive alias lookup (company aliases only).
    pub fn lookup_alias(&self, raw_name_lower: &str) -> Option<&str> {
        self.alias.get(raw_name_lower).map(String::as_str)
    }

    /// Tier 0.90: normalized-form lookup.
    pub fn lookup_normalized(&self, normalized: &str) -> Option<&str> {
        if normalized.is_empty() {
            return None;
        }
        self.normalized.get(normalized).map(String::as_str)
    }

    /// Tier 0.80: best Jaccard match at or above `threshold` over all
    /// registry token sets. Ties keep the first-encountered entry.
    pub fn best_token_match(
        &self,
        tokens: &HashSet<String>,
        threshold: f64,
    ) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for entry in &self.token_sets {
            let similarity = jaccard_similarity(tokens, &entry.tokens);
            if similarity >= threshold && best.map_or(true, |(_, s)| similarity > s) {
                best = Some((entry.company_id.as_str(), similarity));
            }
        }
        best
    }

    pub fn company_name(&self, company_id: &str) -> Option<&str> {
        self.id_to_name.get(company_id).map(String::as_str)
    }

    pub fn company_count(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn alias_count(&self) -> usize {
        self.alias.len()
    }

    /// SHA-256 over the sorted input rows; identifies the registry state in
    /// logs and the run report so reruns against unchanged inputs are
    /// recognizable.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn compute_fingerprint(companies: &[CanonicalCompany], aliases: &[EntityAlias]) -> String {
    let mut company_rows: Vec<String> = companies
        .iter()
        .map(|c| format!("{}\x1f{}", c.company_id, c.company_name))
        .collect();
    company_rows.sort();

    let mut alias_rows: Vec<String> = aliases
        .iter()
        .map(|a| {
            format!(
                "{}\x1f{}\x1f{}\x1f{}",
                a.alias_id, a.entity_type, a.entity_id, a.alias_text
            )
        })
        .collect();
    alias_rows.sort();

    let mut hasher = Sha256::new();
    for row in company_rows.iter().chain(alias_rows.iter()) {
        hasher.update(row.as_bytes());
        hasher.update(b"\x1e");
    }
    hex::encode(hasher.finalize())
}
