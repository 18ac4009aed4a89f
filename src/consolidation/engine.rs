// src/consolidation/engine.rs - Applying a merge plan to holdings, aliases,
// and the consolidation log.

use std::collections::{HashMap, HashSet};

use anyhow::{ensure, Result};
use chrono::Utc;
use log::{debug, info};

use crate::consolidation::candidates::{find_consolidation_groups, ConsolidationPlan};
use crate::matching::normalize::is_absent;
use crate::models::core::{CanonicalCompany, EntityAlias};
use crate::models::matching::{ConsolidationLogEntry, SkippedCandidate};
use crate::models::stats_models::ConsolidationStats;
use crate::store::HoldingSet;
use crate::utils::config::MatchingConfig;

const ALIAS_ID_PREFIX: &str = "alias_";
const ALIAS_SOURCE: &str = "consolidation";

/// Everything one consolidation pass produced. `duplicate_map` is a function
/// (each duplicate maps to exactly one canonical id) and acyclic; both are
/// enforced before anything is applied.
pub struct ConsolidationReport {
    pub plan: ConsolidationPlan,
    pub duplicate_map: HashMap<String, String>,
    pub log_entries: Vec<ConsolidationLogEntry>,
    pub stats: ConsolidationStats,
}

/// Plan and apply one consolidation pass. Holdings pointing at a duplicate
/// are redirected to its canonical company, duplicate names become aliases
/// of the canonical record, and each pair that changed anything is logged.
/// Canonical company rows are never deleted; re-running against unchanged
/// data changes nothing.
pub fn consolidate_companies(
    companies: &[CanonicalCompany],
    holdings: &mut HoldingSet,
    aliases: &mut Vec<EntityAlias>,
    config: &MatchingConfig,
) -> Result<ConsolidationReport> {
    let plan = find_consolidation_groups(companies, config);
    apply_consolidation(plan, companies, holdings, aliases)
}

/// Apply a previously computed plan. Split from planning so a dry run can
/// inspect the plan without touching any state.
pub fn apply_consolidation(
    plan: ConsolidationPlan,
    companies: &[CanonicalCompany],
    holdings: &mut HoldingSet,
    aliases: &mut Vec<EntityAlias>,
) -> Result<ConsolidationReport> {
    let id_to_name: HashMap<&str, &str> = companies
        .iter()
        .map(|c| (c.company_id.as_str(), c.company_name.as_str()))
        .collect();

    let duplicate_map = build_duplicate_map(&plan)?;

    let mut stats = ConsolidationStats {
        total_companies: companies.len(),
        candidates_skipped: plan.skipped.len(),
        ..Default::default()
    };
    for group in &plan.groups {
        stats.record_group(group.method, group.duplicate_ids.len());
    }

    // Redirect holdings that point at a duplicate. This is the only place a
    // previously resolved holding's company_id may change.
    let mut remapped_per_duplicate: HashMap<String, usize> = HashMap::new();
    for row in holdings.rows_mut() {
        if is_absent(row.company_id.as_deref()) {
            continue;
        }
        let canonical = match row.company_id.as_deref().and_then(|c| duplicate_map.get(c)) {
            Some(canonical) => canonical.clone(),
            None => continue,
        };
        let previous = row.company_id.take().unwrap_or_default();
        *remapped_per_duplicate.entry(previous).or_insert(0) += 1;
        row.company_id = Some(canonical);
        stats.holdings_updated += 1;
    }

    // Record duplicate names as aliases of the canonical company, skipping
    // texts that already exist in any spelling case.
    let mut existing_alias_texts: HashSet<String> = aliases
        .iter()
        .map(|a| a.alias_text.to_lowercase())
        .collect();
    let mut next_alias_number = next_alias_number(aliases);

    let timestamp = Utc::now().naive_utc();
    let mut log_entries: Vec<ConsolidationLogEntry> = Vec::new();

    for group in &plan.groups {
        let canonical_name = id_to_name
            .get(group.canonical_id.as_str())
            .copied()
            .unwrap_or_default();
        for duplicate_id in &group.duplicate_ids {
            let duplicate_name = id_to_name
                .get(duplicate_id.as_str())
                .copied()
                .unwrap_or_default();

            let mut alias_added = false;
            if existing_alias_texts.insert(duplicate_name.to_lowercase()) {
                aliases.push(EntityAlias {
                    alias_id: format!("{}{:04}", ALIAS_ID_PREFIX, next_alias_number),
                    entity_type: EntityAlias::ENTITY_TYPE_COMPANY.to_string(),
                    entity_id: group.canonical_id.clone(),
                    alias_text: duplicate_name.to_string(),
                    confidence: Some(group.method.base_confidence()),
                    source: Some(ALIAS_SOURCE.to_string()),
                });
                next_alias_number += 1;
                alias_added = true;
                stats.aliases_added += 1;
            }

            let holdings_moved = remapped_per_duplicate
                .get(duplicate_id.as_str())
                .copied()
                .unwrap_or(0);

            // Idempotence: a pair that moved nothing and aliased nothing was
            // applied by an earlier run; do not log it again.
            if alias_added || holdings_moved > 0 {
                log_entries.push(ConsolidationLogEntry {
                    timestamp,
                    canonical_company_id: group.canonical_id.clone(),
                    canonical_company_name: canonical_name.to_string(),
                    duplicate_company_id: duplicate_id.clone(),
                    duplicate_company_name: duplicate_name.to_string(),
                    method: group.method,
                    reason: group.reason.clone(),
                });
                stats.pairs_logged += 1;
            } else {
                stats.pairs_already_applied += 1;
                debug!(
                    "Pair already applied: '{}' -> '{}'",
                    duplicate_name, canonical_name
                );
            }
        }
    }

    log_consolidation_summary(&stats, &plan.skipped);

    Ok(ConsolidationReport {
        plan,
        duplicate_map,
        log_entries,
        stats,
    })
}

/// Flatten the groups into a duplicate -> canonical function with no
/// transitive chains: following any entry exactly once lands on a company
/// that is never itself a key.
fn build_duplicate_map(plan: &ConsolidationPlan) -> Result<HashMap<String, String>> {
    let mut map: HashMap<String, String> = HashMap::new();
    for group in &plan.groups {
        for duplicate_id in &group.duplicate_ids {
            let previous = map.insert(duplicate_id.clone(), group.canonical_id.clone());
            ensure!(
                previous.is_none(),
                "duplicate company {} mapped to more than one canonical",
                duplicate_id
            );
        }
    }

    // Groups are disjoint by construction, so chains should not occur; if
    // one ever does, resolve it to the root rather than leaving a dangling
    // intermediate.
    let keys: Vec<String> = map.keys().cloned().collect();
    for key in keys {
        let mut root = map[&key].clone();
        let mut hops = 0;
        while let Some(next) = map.get(&root) {
            root = next.clone();
            hops += 1;
            ensure!(
                hops <= map.len(),
                "cycle detected in consolidation map at {}",
                key
            );
        }
        map.insert(key, root);
    }

    for canonical in map.values() {
        ensure!(
            !map.contains_key(canonical),
            "consolidation map still contains a chained canonical {}",
            canonical
        );
    }
    Ok(map)
}

fn next_alias_number(aliases: &[EntityAlias]) -> u64 {
    aliases
        .iter()
        .filter_map(|a| a.alias_id.strip_prefix(ALIAS_ID_PREFIX))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

fn log_consolidation_summary(stats: &ConsolidationStats, skipped: &[SkippedCandidate]) {
    info!("=== Company Consolidation Summary ===");
    info!("Groups consolidated:        {}", stats.groups_found);
    info!("  normalized duplicates:    {}", stats.duplicates_normalized);
    info!("  token overlap (strict):   {}", stats.duplicates_token_overlap);
    info!("  first entity:             {}", stats.duplicates_first_entity);
    info!("Holdings updated:           {}", stats.holdings_updated);
    info!("Aliases added:              {}", stats.aliases_added);
    info!("Pairs logged:               {}", stats.pairs_logged);
    info!("Pairs already applied:      {}", stats.pairs_already_applied);
    info!("Candidates skipped:         {}", stats.candidates_skipped);
    for candidate in skipped {
        debug!(
            "SKIP [{}] {}: {}",
            candidate.method, candidate.subject, candidate.reason
        );
    }
}
