// src/consolidation/candidates.rs - Duplicate-group discovery over canonical
// companies. Planning only: nothing here mutates holdings, aliases, or logs,
// which keeps dry runs first-class.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info};
use petgraph::unionfind::UnionFind;
use strsim::jaro_winkler;

use crate::matching::first_entity::extract_first_entity;
use crate::matching::normalize::normalize_name;
use crate::matching::tokens::jaccard_similarity;
use crate::models::core::CanonicalCompany;
use crate::models::matching::{ConsolidationGroup, MatchMethod, SkippedCandidate};
use crate::utils::config::MatchingConfig;

/// Precomputed per-company views, held in company_id order so every pass
/// below iterates deterministically.
#[derive(Debug, Clone)]
struct CompanyRecord {
    company_id: String,
    company_name: String,
    normalized: String,
    tokens: HashSet<String>,
}

/// The merge plan: accepted groups plus every candidate rejected by a safety
/// rule, with its reason.
#[derive(Debug, Default)]
pub struct ConsolidationPlan {
    pub groups: Vec<ConsolidationGroup>,
    pub skipped: Vec<SkippedCandidate>,
}

/// Find groups of canonical companies that are the same real-world entity,
/// using the resolver's primitives under stricter acceptance rules. The
/// company set is iterated sorted by company_id; group membership and skip
/// reporting are reproducible across runs.
pub fn find_consolidation_groups(
    companies: &[CanonicalCompany],
    config: &MatchingConfig,
) -> ConsolidationPlan {
    let mut records: Vec<CompanyRecord> = companies
        .iter()
        .map(|c| {
            let normalized = normalize_name(&c.company_name);
            let tokens = normalized.split_whitespace().map(str::to_string).collect();
            CompanyRecord {
                company_id: c.company_id.clone(),
                company_name: c.company_name.clone(),
                normalized,
                tokens,
            }
        })
        .collect();
    records.sort_by(|a, b| a.company_id.cmp(&b.company_id));

    let mut plan = ConsolidationPlan::default();
    let mut grouped: HashSet<usize> = HashSet::new();

    find_normalized_groups(&records, config, &mut plan, &mut grouped);
    find_token_overlap_groups(&records, config, &mut plan, &mut grouped);
    find_first_entity_groups(&records, config, &mut plan, &mut grouped);

    info!(
        "Consolidation plan: {} groups, {} candidates skipped by safety rules",
        plan.groups.len(),
        plan.skipped.len()
    );
    plan
}

/// Companies whose names normalize to the same form. A group is only safe if
/// the shared form has at least two tokens (single words like "summit" are
/// too generic) and every member leads with the same token.
fn find_normalized_groups(
    records: &[CompanyRecord],
    config: &MatchingConfig,
    plan: &mut ConsolidationPlan,
    grouped: &mut HashSet<usize>,
) {
    let mut by_normalized: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, record) in records.iter().enumerate() {
        if !record.normalized.is_empty() {
            by_normalized.entry(&record.normalized).or_default().push(idx);
        }
    }

    for (normalized, members) in by_normalized {
        if members.len() <= 1 {
            continue;
        }

        if normalized.split_whitespace().count() < config.min_token_count {
            plan.skipped.push(SkippedCandidate {
                subject: normalized.to_string(),
                method: MatchMethod::Normalized,
                reason: format!("single-word match '{}' too generic", normalized),
            });
            continue;
        }

        let first_words: HashSet<&str> = members
            .iter()
            .filter_map(|&idx| records[idx].normalized.split_whitespace().next())
            .collect();
        if first_words.len() > 1 {
            let mut words: Vec<&str> = first_words.into_iter().collect();
            words.sort_unstable();
            plan.skipped.push(SkippedCandidate {
                subject: normalized.to_string(),
                method: MatchMethod::Normalized,
                reason: format!("variants have different first words: {:?}", words),
            });
            continue;
        }

        push_group(
            records,
            &members,
            MatchMethod::Normalized,
            format!("normalized='{}'", normalized),
            plan,
            grouped,
        );
    }
}

/// Pairwise token overlap among still-ungrouped companies at the stricter
/// consolidation threshold. Pairs landing between the holding and
/// consolidation thresholds would have merged under the resolver's rules and
/// are logged as skipped so near misses stay visible. Groups are connected
/// components of the accepted-pair graph.
fn find_token_overlap_groups(
    records: &[CompanyRecord],
    config: &MatchingConfig,
    plan: &mut ConsolidationPlan,
    grouped: &mut HashSet<usize>,
) {
    let candidates: Vec<usize> = (0..records.len())
        .filter(|idx| !grouped.contains(idx))
        .filter(|&idx| records[idx].tokens.len() >= config.min_token_count)
        .collect();

    let mut union: UnionFind<usize> = UnionFind::new(candidates.len());
    let mut edges = 0usize;
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let a = &records[candidates[i]];
            let b = &records[candidates[j]];
            let similarity = jaccard_similarity(&a.tokens, &b.tokens);
            if similarity >= config.consolidation_token_threshold {
                union.union(i, j);
                edges += 1;
            } else if similarity >= config.holding_token_threshold {
                let diagnostic = jaro_winkler(&a.normalized, &b.normalized);
                plan.skipped.push(SkippedCandidate {
                    subject: format!("{} <-> {}", a.company_name, b.company_name),
                    method: MatchMethod::TokenOverlap,
                    reason: format!(
                        "Jaccard {:.2} < {:.2} threshold (jaro-winkler {:.2})",
                        similarity, config.consolidation_token_threshold, diagnostic
                    ),
                });
            }
        }
    }
    debug!(
        "Token overlap: {} candidates, {} accepted edges",
        candidates.len(),
        edges
    );

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &record_idx) in candidates.iter().enumerate() {
        components.entry(union.find(i)).or_default().push(record_idx);
    }
    // Members accumulate in ascending candidate order, so ordering groups by
    // their first member follows company_id order.
    let mut component_groups: Vec<Vec<usize>> = components
        .into_values()
        .filter(|members| members.len() > 1)
        .collect();
    component_groups.sort_by_key(|members| members[0]);

    for members in component_groups {
        push_group(
            records,
            &members,
            MatchMethod::TokenOverlap,
            format!("Jaccard >= {:.2}", config.consolidation_token_threshold),
            plan,
            grouped,
        );
    }
}

/// Multi-entity canonical names whose first entity is itself a canonical
/// company. The extraction must normalize to at least two tokens before it
/// is trusted.
fn find_first_entity_groups(
    records: &[CompanyRecord],
    config: &MatchingConfig,
    plan: &mut ConsolidationPlan,
    grouped: &mut HashSet<usize>,
) {
    for idx in 0..records.len() {
        if grouped.contains(&idx) {
            continue;
        }
        let record = &records[idx];
        let first = extract_first_entity(&record.company_name);
        if first.to_lowercase() == record.company_name.to_lowercase() {
            continue;
        }
        let first_normalized = normalize_name(&first);
        if first_normalized.is_empty() {
            continue;
        }
        if first_normalized.split_whitespace().count() < config.min_first_entity_tokens {
            plan.skipped.push(SkippedCandidate {
                subject: record.company_name.clone(),
                method: MatchMethod::FirstEntity,
                reason: format!(
                    "first entity '{}' has <{} words",
                    first, config.min_first_entity_tokens
                ),
            });
            continue;
        }

        let partner = (0..records.len()).find(|&other| {
            other != idx && !grouped.contains(&other) && records[other].normalized == first_normalized
        });
        if let Some(other) = partner {
            push_group(
                records,
                &[idx, other],
                MatchMethod::FirstEntity,
                format!("first entity='{}'", first),
                plan,
                grouped,
            );
        }
    }
}

fn push_group(
    records: &[CompanyRecord],
    members: &[usize],
    method: MatchMethod,
    reason: String,
    plan: &mut ConsolidationPlan,
    grouped: &mut HashSet<usize>,
) {
    let names: Vec<&str> = members
        .iter()
        .map(|&idx| records[idx].company_name.as_str())
        .collect();
    let canonical_pos = pick_canonical(&names);
    let canonical_id = records[members[canonical_pos]].company_id.clone();
    let duplicate_ids: Vec<String> = members
        .iter()
        .enumerate()
        .filter(|&(pos, _)| pos != canonical_pos)
        .map(|(_, &idx)| records[idx].company_id.clone())
        .collect();

    grouped.extend(members.iter().copied());
    plan.groups.push(ConsolidationGroup {
        canonical_id,
        duplicate_ids,
        method,
        reason,
    });
}

/// Choose the canonical member of a duplicate group: prefer names without
/// " and " (single entities), then without parentheses (no dba/fka notes),
/// then the shortest, then the first encountered.
pub fn pick_canonical(names: &[&str]) -> usize {
    names
        .iter()
        .enumerate()
        .min_by_key(|(idx, name)| {
            let has_and = name.to_lowercase().contains(" and ");
            let has_parens = name.contains('(');
            (has_and, has_parens, name.len(), *idx)
        })
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(id: &str, name: &str) -> CanonicalCompany {
        CanonicalCompany {
            company_id: id.to_string(),
            company_name: name.to_string(),
        }
    }

    fn plan(companies: &[CanonicalCompany]) -> ConsolidationPlan {
        find_consolidation_groups(companies, &MatchingConfig::default())
    }

    #[test]
    fn normalized_duplicates_consolidate_to_shortest_name() {
        let companies = [
            company("c1", "Aptean Software, Inc."),
            company("c2", "Aptean Software Acquiror, Inc."),
        ];
        let result = plan(&companies);
        assert_eq!(result.groups.len(), 1);
        let group = &result.groups[0];
        assert_eq!(group.method, MatchMethod::Normalized);
        assert_eq!(group.canonical_id, "c1");
        assert_eq!(group.duplicate_ids, vec!["c2".to_string()]);
        assert!(group.reason.contains("aptean software"));
    }

    #[test]
    fn single_word_normalized_groups_are_skipped() {
        let companies = [company("c1", "Summit"), company("c2", "Summit, Inc.")];
        let result = plan(&companies);
        assert!(result.groups.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].method, MatchMethod::Normalized);
        assert!(result.skipped[0].reason.contains("too generic"));
    }

    #[test]
    fn token_overlap_uses_strict_threshold_and_logs_near_misses() {
        // 9 of 10 shared tokens: 0.9 Jaccard, merged. 3 of 4: 0.75, skipped.
        let companies = [
            company("c1", "Alpha Beta Gamma Delta Epsilon Zeta Eta Theta Iota Kappa"),
            company("c2", "Alpha Beta Gamma Delta Epsilon Zeta Eta Theta Iota"),
            company("c3", "Summit Behavioral Healthcare Partners"),
            company("c4", "Summit Behavioral Healthcare"),
        ];
        let result = plan(&companies);

        assert_eq!(result.groups.len(), 1);
        let group = &result.groups[0];
        assert_eq!(group.method, MatchMethod::TokenOverlap);
        assert_eq!(group.canonical_id, "c2");
        assert_eq!(group.duplicate_ids, vec!["c1".to_string()]);

        let near_miss: Vec<_> = result
            .skipped
            .iter()
            .filter(|s| s.method == MatchMethod::TokenOverlap)
            .collect();
        assert_eq!(near_miss.len(), 1);
        assert!(near_miss[0].subject.contains("Summit Behavioral Healthcare"));
        assert!(near_miss[0].reason.contains("< 0.90 threshold"));
    }

    #[test]
    fn first_entity_pairing_requires_two_words() {
        let companies = [
            company("c1", "Mustang Prospects Holdco, LLC, Jaguar Finance Partners, LLC"),
            company("c2", "Mustang Prospects Holdco, LLC"),
            company("c3", "Zenith Holdco, LLC, Watchtower Partners, LP"),
        ];
        let result = plan(&companies);

        let first_entity_groups: Vec<_> = result
            .groups
            .iter()
            .filter(|g| g.method == MatchMethod::FirstEntity)
            .collect();
        assert_eq!(first_entity_groups.len(), 1);
        // The simpler single-entity name wins the canonical pick.
        assert_eq!(first_entity_groups[0].canonical_id, "c2");
        assert_eq!(first_entity_groups[0].duplicate_ids, vec!["c1".to_string()]);

        // "Zenith Holdco, LLC" normalizes to the single word "zenith";
        // skipped with reason.
        let skipped: Vec<_> = result
            .skipped
            .iter()
            .filter(|s| s.method == MatchMethod::FirstEntity)
            .collect();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].reason.contains("<2 words"));
    }

    #[test]
    fn groups_are_disjoint_across_passes() {
        let companies = [
            company("c1", "Acme Global Services, Inc."),
            company("c2", "Acme Global Services LLC"),
            company("c3", "Acme Global Services Holdings"),
        ];
        let result = plan(&companies);
        let mut seen: HashSet<&str> = HashSet::new();
        for group in &result.groups {
            assert!(seen.insert(group.canonical_id.as_str()));
            for dup in &group.duplicate_ids {
                assert!(seen.insert(dup.as_str()));
            }
        }
    }

    #[test]
    fn canonical_pick_prefers_clean_short_names() {
        assert_eq!(
            pick_canonical(&[
                "Acme Holdings and Acme Partners",
                "Acme Holdings (dba Acme)",
                "Acme Holdings Incorporated",
                "Acme Holdings",
            ]),
            3
        );
        // First encountered wins a full tie.
        assert_eq!(pick_canonical(&["Acme Corp", "Acme Core"]), 0);
    }
}
