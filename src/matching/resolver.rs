// src/matching/resolver.rs - The ordered match cascade over raw holdings.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use crate::matching::first_entity::extract_first_entity;
use crate::matching::normalize::{is_absent, CachedNormalizer, NormalizedName};
use crate::matching::registry::CompanyRegistry;
use crate::models::matching::{MatchCandidate, MatchMethod, ResolutionLogEntry};
use crate::models::stats_models::ResolutionStats;
use crate::store::HoldingSet;
use crate::utils::config::MatchingConfig;

const BATCH_SIZE: usize = 500;
const MAX_CONCURRENT_BATCHES: usize = 8;
const EXAMPLE_LIMIT: usize = 5;

/// Everything a strategy needs, shared read-only across workers.
pub struct StrategyContext {
    pub registry: Arc<CompanyRegistry>,
    pub config: MatchingConfig,
}

/// Per-holding views of the raw name, computed once per row.
pub struct RawNameView {
    pub raw: String,
    pub lower: String,
    pub normalized: Arc<NormalizedName>,
}

type Strategy = fn(&StrategyContext, &RawNameView) -> Result<Option<MatchCandidate>>;

/// The cascade, in precedence order. The first strategy that produces a
/// match wins; order is data, so precedence is testable on its own.
pub const CASCADE: &[(MatchMethod, Strategy)] = &[
    (MatchMethod::Direct, match_direct),
    (MatchMethod::Alias, match_alias),
    (MatchMethod::Normalized, match_normalized),
    (MatchMethod::TokenOverlap, match_token_overlap),
    (MatchMethod::FirstEntity, match_first_entity),
];

fn match_direct(ctx: &StrategyContext, name: &RawNameView) -> Result<Option<MatchCandidate>> {
    Ok(ctx
        .registry
        .lookup_exact(&name.lower)
        .map(|id| MatchCandidate::new(id.to_string(), MatchMethod::Direct)))
}

fn match_alias(ctx: &StrategyContext, name: &RawNameView) -> Result<Option<MatchCandidate>> {
    Ok(ctx
        .registry
        .lookup_alias(&name.lower)
        .map(|id| MatchCandidate::new(id.to_string(), MatchMethod::Alias)))
}

fn match_normalized(ctx: &StrategyContext, name: &RawNameView) -> Result<Option<MatchCandidate>> {
    Ok(ctx
        .registry
        .lookup_normalized(&name.normalized.normalized)
        .map(|id| MatchCandidate::new(id.to_string(), MatchMethod::Normalized)))
}

fn match_token_overlap(
    ctx: &StrategyContext,
    name: &RawNameView,
) -> Result<Option<MatchCandidate>> {
    // Single-word names over-match; require a multi-token set before even
    // looking.
    if name.normalized.tokens.len() < ctx.config.min_token_count {
        return Ok(None);
    }
    Ok(ctx
        .registry
        .best_token_match(&name.normalized.tokens, ctx.config.holding_token_threshold)
        .map(|(id, similarity)| {
            let mut candidate = MatchCandidate::new(id.to_string(), MatchMethod::TokenOverlap);
            candidate.similarity = Some(similarity);
            candidate
        }))
}

fn match_first_entity(ctx: &StrategyContext, name: &RawNameView) -> Result<Option<MatchCandidate>> {
    let first = extract_first_entity(&name.raw);
    if first.is_empty() || first.to_lowercase() == name.lower {
        return Ok(None);
    }
    let first_normalized = crate::matching::normalize::normalize_name(&first);
    Ok(ctx
        .registry
        .lookup_normalized(&first_normalized)
        .map(|id| {
            let mut candidate = MatchCandidate::new(id.to_string(), MatchMethod::FirstEntity);
            candidate.via = Some(first.clone());
            candidate
        }))
}

/// Run the cascade for one raw name. A strategy error degrades the row to
/// unresolved at the caller; it never aborts the batch.
pub fn resolve_name(ctx: &StrategyContext, name: &RawNameView) -> Result<Option<MatchCandidate>> {
    for (_, strategy) in CASCADE {
        if let Some(candidate) = strategy(ctx, name)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

struct ResolveJob {
    holding_id: String,
    raw_name: String,
}

struct RowOutcome {
    holding_id: String,
    raw_name: String,
    candidate: Option<MatchCandidate>,
}

/// Result of one resolver pass: the append-only log slice for this run plus
/// its stats. Entries are sorted by holding id for stable output.
pub struct ResolutionReport {
    pub entries: Vec<ResolutionLogEntry>,
    pub stats: ResolutionStats,
}

/// Resolve every holding with an absent company_id against the registry.
/// Already-resolved rows are skipped and counted; assigning the matched
/// company_id on the arena row is the only mutation performed here.
pub async fn resolve_holdings(
    holdings: &mut HoldingSet,
    registry: Arc<CompanyRegistry>,
    config: &MatchingConfig,
    multi_progress: Option<MultiProgress>,
) -> Result<ResolutionReport> {
    let mut stats = ResolutionStats {
        total_holdings: holdings.len(),
        ..Default::default()
    };

    let jobs: Vec<ResolveJob> = holdings
        .rows()
        .iter()
        .filter(|row| is_absent(row.company_id.as_deref()))
        .map(|row| ResolveJob {
            holding_id: row.holding_id.clone(),
            raw_name: row.raw_company_name.clone(),
        })
        .collect();
    stats.already_resolved = holdings.len() - jobs.len();

    info!(
        "Resolver: {} holdings, {} already resolved, {} to process (registry {} companies, {} aliases)",
        holdings.len(),
        stats.already_resolved,
        jobs.len(),
        registry.company_count(),
        registry.alias_count()
    );

    if jobs.is_empty() {
        return Ok(ResolutionReport {
            entries: Vec::new(),
            stats,
        });
    }

    let pb = match &multi_progress {
        Some(mp) => mp.add(ProgressBar::new(jobs.len() as u64)),
        None => ProgressBar::hidden(),
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  🔎 [{elapsed_precise}] {bar:30.green/blue} {pos}/{len} Resolving holdings...")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );

    let ctx = Arc::new(StrategyContext {
        registry: Arc::clone(&registry),
        config: config.clone(),
    });

    let max_workers = num_cpus::get().min(MAX_CONCURRENT_BATCHES).max(1);
    let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(jobs.len());

    let mut batches: Vec<Vec<ResolveJob>> = Vec::new();
    let mut jobs = jobs;
    while !jobs.is_empty() {
        let rest = jobs.split_off(jobs.len().min(BATCH_SIZE));
        batches.push(std::mem::replace(&mut jobs, rest));
    }
    debug!(
        "Resolver: {} batches of up to {} rows, {} workers",
        batches.len(),
        BATCH_SIZE,
        max_workers
    );

    for chunk in batches.chunks_mut(max_workers) {
        let mut futures = Vec::with_capacity(chunk.len());
        for batch in chunk.iter_mut() {
            let batch = std::mem::take(batch);
            let ctx = Arc::clone(&ctx);
            let pb = pb.clone();
            futures.push(tokio::spawn(async move {
                resolve_batch(batch, ctx, pb)
            }));
        }
        for joined in join_all(futures).await {
            match joined {
                Ok((batch_outcomes, batch_stats)) => {
                    outcomes.extend(batch_outcomes);
                    stats.merge(&batch_stats);
                }
                Err(e) => {
                    // A panicked worker loses its rows; surface it loudly
                    // rather than silently under-logging the run.
                    warn!("Resolver batch task failed: {}", e);
                }
            }
        }
    }
    pb.finish_with_message("Resolution complete");

    // Apply assignments and build the log on the arena thread; sort so the
    // output ordering is independent of worker scheduling.
    outcomes.sort_by(|a, b| a.holding_id.cmp(&b.holding_id));

    let mut entries = Vec::with_capacity(outcomes.len());
    let mut examples_normalized: Vec<(String, String)> = Vec::new();
    let mut examples_token: Vec<(String, String, f64)> = Vec::new();
    let mut examples_first: Vec<(String, String, String)> = Vec::new();

    for outcome in outcomes {
        let (matched_company_id, method, confidence) = match &outcome.candidate {
            Some(candidate) => {
                holdings.assign_company(&outcome.holding_id, candidate.company_id.clone());
                let matched_name = registry
                    .company_name(&candidate.company_id)
                    .unwrap_or_default()
                    .to_string();
                match candidate.method {
                    MatchMethod::Normalized if examples_normalized.len() < EXAMPLE_LIMIT => {
                        examples_normalized.push((outcome.raw_name.clone(), matched_name));
                    }
                    MatchMethod::TokenOverlap if examples_token.len() < EXAMPLE_LIMIT => {
                        examples_token.push((
                            outcome.raw_name.clone(),
                            matched_name,
                            candidate.similarity.unwrap_or_default(),
                        ));
                    }
                    MatchMethod::FirstEntity if examples_first.len() < EXAMPLE_LIMIT => {
                        examples_first.push((
                            outcome.raw_name.clone(),
                            candidate.via.clone().unwrap_or_default(),
                            matched_name,
                        ));
                    }
                    _ => {}
                }
                (
                    Some(candidate.company_id.clone()),
                    candidate.method,
                    candidate.confidence,
                )
            }
            None => (None, MatchMethod::Unresolved, 0.0),
        };
        entries.push(ResolutionLogEntry {
            holding_id: outcome.holding_id,
            raw_company_name: outcome.raw_name,
            matched_company_id,
            match_method: method,
            match_confidence: confidence,
        });
    }

    log_pass_summary(&stats, &examples_normalized, &examples_token, &examples_first);

    Ok(ResolutionReport { entries, stats })
}

fn resolve_batch(
    batch: Vec<ResolveJob>,
    ctx: Arc<StrategyContext>,
    pb: ProgressBar,
) -> (Vec<RowOutcome>, ResolutionStats) {
    let mut normalizer = CachedNormalizer::new();
    let mut outcomes = Vec::with_capacity(batch.len());
    let mut stats = ResolutionStats::default();

    for job in batch {
        stats.processed += 1;
        let view = RawNameView {
            lower: job.raw_name.trim().to_lowercase(),
            normalized: normalizer.get(&job.raw_name),
            raw: job.raw_name.clone(),
        };
        let candidate = match resolve_name(&ctx, &view) {
            Ok(candidate) => candidate,
            Err(e) => {
                // Partial-failure isolation: a broken row is unresolved, the
                // batch keeps going.
                warn!(
                    "Resolution failed for holding {} ('{}'): {}; recording unresolved",
                    job.holding_id, job.raw_name, e
                );
                stats.row_errors += 1;
                None
            }
        };
        match &candidate {
            Some(c) => stats.record(c.method),
            None => stats.record(MatchMethod::Unresolved),
        }
        outcomes.push(RowOutcome {
            holding_id: job.holding_id,
            raw_name: job.raw_name,
            candidate,
        });
        pb.inc(1);
    }
    (outcomes, stats)
}

fn log_pass_summary(
    stats: &ResolutionStats,
    examples_normalized: &[(String, String)],
    examples_token: &[(String, String, f64)],
    examples_first: &[(String, String, String)],
) {
    info!("=== Entity Resolution Summary ===");
    info!("Already resolved (skipped):      {}", stats.already_resolved);
    info!("Processed (absent company_id):   {}", stats.processed);
    info!("  1. Direct match (1.00):        {}", stats.resolved_direct);
    info!("  2. Alias match (0.95):         {}", stats.resolved_alias);
    info!("  3. Normalized match (0.90):    {}", stats.resolved_normalized);
    info!("  4. Token overlap match (0.80): {}", stats.resolved_token_overlap);
    info!("  5. First entity match (0.75):  {}", stats.resolved_first_entity);
    info!("  Unresolved:                    {}", stats.unresolved);
    info!(
        "Total resolved: {} ({:.1}%)",
        stats.total_resolved(),
        stats.resolution_rate() * 100.0
    );
    if stats.row_errors > 0 {
        warn!("⚠️ {} rows degraded to unresolved after errors", stats.row_errors);
    }

    for (raw, matched) in examples_normalized {
        debug!("normalized: '{}' -> '{}'", raw, matched);
    }
    for (raw, matched, similarity) in examples_token {
        debug!(
            "token_overlap: '{}' -> '{}' (similarity: {:.2})",
            raw, matched, similarity
        );
    }
    for (raw, first, matched) in examples_first {
        debug!(
            "first_entity: '{}' -> first entity '{}' -> '{}'",
            raw, first, matched
        );
    }
}

/// Read-only sweep reporting what the fuzzy strategies would match for
/// distinct raw names that have no exact or alias match. Nothing is mutated;
/// this exists so threshold changes can be previewed against real data.
#[derive(Debug, Default)]
pub struct MatchAnalysis {
    pub unique_names: usize,
    pub unresolved_names: usize,
    pub normalized: Vec<(String, String)>,
    pub token_overlap: Vec<(String, String, f64)>,
    pub first_entity: Vec<(String, String, String)>,
}

impl MatchAnalysis {
    pub fn total_additional(&self) -> usize {
        self.normalized.len() + self.token_overlap.len() + self.first_entity.len()
    }
}

pub fn analyze_potential_matches(
    holdings: &HoldingSet,
    registry: &CompanyRegistry,
    config: &MatchingConfig,
) -> MatchAnalysis {
    let mut analysis = MatchAnalysis::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut normalizer = CachedNormalizer::new();

    for row in holdings.rows() {
        let raw = row.raw_company_name.trim();
        if raw.is_empty() || is_absent(Some(raw)) {
            continue;
        }
        if !seen.insert(raw.to_string()) {
            continue;
        }
        analysis.unique_names += 1;
        if is_absent(row.company_id.as_deref()) {
            analysis.unresolved_names += 1;
        }

        let lower = raw.to_lowercase();
        if registry.lookup_exact(&lower).is_some() || registry.lookup_alias(&lower).is_some() {
            continue;
        }

        let view = normalizer.get(raw);

        if let Some(id) = registry.lookup_normalized(&view.normalized) {
            if let Some(matched_name) = registry.company_name(id) {
                if matched_name.to_lowercase() != lower {
                    analysis
                        .normalized
                        .push((raw.to_string(), matched_name.to_string()));
                }
            }
            continue;
        }

        if view.tokens.len() >= config.min_token_count {
            if let Some((id, similarity)) =
                registry.best_token_match(&view.tokens, config.holding_token_threshold)
            {
                if let Some(matched_name) = registry.company_name(id) {
                    if matched_name.to_lowercase() != lower {
                        analysis.token_overlap.push((
                            raw.to_string(),
                            matched_name.to_string(),
                            similarity,
                        ));
                    }
                }
                continue;
            }
        }

        let first = extract_first_entity(raw);
        if !first.is_empty() && first.to_lowercase() != lower {
            let first_normalized = crate::matching::normalize::normalize_name(&first);
            if let Some(id) = registry.lookup_normalized(&first_normalized) {
                if let Some(matched_name) = registry.company_name(id) {
                    analysis.first_entity.push((
                        raw.to_string(),
                        first,
                        matched_name.to_string(),
                    ));
                }
            }
        }
    }
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::{CanonicalCompany, EntityAlias, RawHolding};

    fn company(id: &str, name: &str) -> CanonicalCompany {
        CanonicalCompany {
            company_id: id.to_string(),
            company_name: name.to_string(),
        }
    }

    fn alias(id: &str, entity_id: &str, text: &str) -> EntityAlias {
        EntityAlias {
            alias_id: id.to_string(),
            entity_type: "company".to_string(),
            entity_id: entity_id.to_string(),
            alias_text: text.to_string(),
            confidence: None,
            source: None,
        }
    }

    fn holding(id: &str, name: &str, company_id: Option<&str>) -> RawHolding {
        RawHolding {
            holding_id: id.to_string(),
            raw_company_name: name.to_string(),
            company_id: company_id.map(str::to_string),
        }
    }

    fn registry(companies: &[CanonicalCompany], aliases: &[EntityAlias]) -> Arc<CompanyRegistry> {
        Arc::new(CompanyRegistry::build(companies, aliases))
    }

    async fn run(
        holdings: &mut HoldingSet,
        registry: Arc<CompanyRegistry>,
    ) -> ResolutionReport {
        resolve_holdings(holdings, registry, &MatchingConfig::default(), None)
            .await
            .unwrap()
    }

    #[test]
    fn cascade_order_is_fixed() {
        let order: Vec<MatchMethod> = CASCADE.iter().map(|(method, _)| *method).collect();
        assert_eq!(
            order,
            vec![
                MatchMethod::Direct,
                MatchMethod::Alias,
                MatchMethod::Normalized,
                MatchMethod::TokenOverlap,
                MatchMethod::FirstEntity,
            ]
        );
    }

    #[tokio::test]
    async fn direct_match_beats_weaker_strategies() {
        // The same name is both a canonical name and an alias of another
        // company; the cascade must report the direct match.
        let reg = registry(
            &[company("c1", "Acme Technologies"), company("c2", "Other Corp")],
            &[alias("a1", "c2", "Acme Technologies")],
        );
        let mut holdings = HoldingSet::new(vec![holding("h1", "ACME TECHNOLOGIES", None)]);

        let report = run(&mut holdings, reg).await;
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].match_method, MatchMethod::Direct);
        assert_eq!(report.entries[0].match_confidence, 1.0);
        assert_eq!(holdings.get("h1").unwrap().company_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn alias_match_resolves_known_variants() {
        let reg = registry(
            &[company("c1", "International Business Machines")],
            &[alias("a1", "c1", "IBM")],
        );
        let mut holdings = HoldingSet::new(vec![holding("h1", "ibm", None)]);

        let report = run(&mut holdings, reg).await;
        assert_eq!(report.entries[0].match_method, MatchMethod::Alias);
        assert_eq!(report.entries[0].match_confidence, 0.95);
        assert_eq!(holdings.get("h1").unwrap().company_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn normalized_match_strips_legal_suffixes() {
        let reg = registry(&[company("c1", "Acme Technologies")], &[]);
        let mut holdings =
            HoldingSet::new(vec![holding("h1", "Acme Technologies, Inc.", None)]);

        let report = run(&mut holdings, reg).await;
        assert_eq!(report.entries[0].match_method, MatchMethod::Normalized);
        assert_eq!(report.entries[0].match_confidence, 0.90);
        assert_eq!(holdings.get("h1").unwrap().company_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn token_overlap_requires_multiple_tokens() {
        let reg = registry(&[company("c1", "Summit Behavioral Healthcare")], &[]);
        // "Summit" alone normalizes to a single token and must not match;
        // "Partners" survives normalization, so h2 misses the normalized
        // lookup and lands in token overlap at 3/4 similarity.
        let mut holdings = HoldingSet::new(vec![
            holding("h1", "Summit", None),
            holding("h2", "Summit Behavioral Healthcare Partners", None),
        ]);

        let report = run(&mut holdings, reg).await;
        let by_id: std::collections::HashMap<_, _> = report
            .entries
            .iter()
            .map(|e| (e.holding_id.as_str(), e))
            .collect();
        assert_eq!(by_id["h1"].match_method, MatchMethod::Unresolved);
        assert_eq!(by_id["h2"].match_method, MatchMethod::TokenOverlap);
        assert_eq!(by_id["h2"].match_confidence, 0.80);
    }

    #[tokio::test]
    async fn first_entity_match_splits_multi_entity_names() {
        let reg = registry(&[company("c1", "Mustang Prospects Holdco, LLC")], &[]);
        // The co-borrowers contribute enough distinct tokens that token
        // overlap stays below threshold, leaving the split as the only path.
        let mut holdings = HoldingSet::new(vec![holding(
            "h1",
            "Mustang Prospects Holdco, LLC, Jaguar Finance Partners, LLC and Falcon Energy Topco, LP",
            None,
        )]);

        let report = run(&mut holdings, reg).await;
        assert_eq!(report.entries[0].match_method, MatchMethod::FirstEntity);
        assert_eq!(report.entries[0].match_confidence, 0.75);
        assert_eq!(holdings.get("h1").unwrap().company_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn unresolved_rows_are_logged_and_left_null() {
        let reg = registry(&[company("c1", "Acme Technologies")], &[]);
        let mut holdings = HoldingSet::new(vec![holding("h1", "Zenith Widgets", None)]);

        let report = run(&mut holdings, reg).await;
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].match_method, MatchMethod::Unresolved);
        assert_eq!(report.entries[0].match_confidence, 0.0);
        assert!(report.entries[0].matched_company_id.is_none());
        assert!(holdings.get("h1").unwrap().company_id.is_none());
        assert_eq!(report.stats.unresolved, 1);
    }

    #[tokio::test]
    async fn resolver_is_idempotent_and_never_overwrites() {
        let reg = registry(
            &[company("c1", "Acme Technologies"), company("c2", "Zenith Widgets")],
            &[],
        );
        let mut holdings = HoldingSet::new(vec![
            holding("h1", "Acme Technologies, Inc.", None),
            // Pre-resolved to a different company than the cascade would
            // pick; must stay untouched.
            holding("h2", "Acme Technologies", Some("c2")),
        ]);

        let first = run(&mut holdings, Arc::clone(&reg)).await;
        assert_eq!(first.stats.processed, 1);
        assert_eq!(first.stats.already_resolved, 1);
        assert_eq!(holdings.get("h2").unwrap().company_id.as_deref(), Some("c2"));

        let second = run(&mut holdings, reg).await;
        assert_eq!(second.stats.processed, 0);
        assert_eq!(second.stats.already_resolved, 2);
        assert!(second.entries.is_empty());
        assert_eq!(holdings.get("h1").unwrap().company_id.as_deref(), Some("c1"));
        assert_eq!(holdings.get("h2").unwrap().company_id.as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn sentinel_company_ids_count_as_absent() {
        let reg = registry(&[company("c1", "Acme Technologies")], &[]);
        let mut holdings =
            HoldingSet::new(vec![holding("h1", "Acme Technologies", Some("nan"))]);

        let report = run(&mut holdings, reg).await;
        assert_eq!(report.stats.processed, 1);
        assert_eq!(holdings.get("h1").unwrap().company_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn log_entries_are_sorted_by_holding_id() {
        let reg = registry(&[company("c1", "Acme Technologies")], &[]);
        let mut holdings = HoldingSet::new(vec![
            holding("h3", "Acme Technologies", None),
            holding("h1", "Zenith Widgets", None),
            holding("h2", "Acme Technologies, Inc.", None),
        ]);

        let report = run(&mut holdings, reg).await;
        let ids: Vec<&str> = report.entries.iter().map(|e| e.holding_id.as_str()).collect();
        assert_eq!(ids, vec!["h1", "h2", "h3"]);
    }

    #[tokio::test]
    async fn outcome_is_independent_of_input_order() {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let companies = [
            company("c1", "Acme Technologies"),
            company("c2", "Summit Behavioral Healthcare"),
            company("c3", "Mustang Prospects Holdco, LLC"),
        ];
        let mut rows = vec![
            holding("h1", "Acme Technologies, Inc.", None),
            holding("h2", "ACME TECHNOLOGIES", None),
            holding("h3", "Summit Behavioral Healthcare Partners", None),
            holding("h4", "Zenith Widgets", None),
            holding("h5", "Summit", None),
        ];

        let reg = registry(&companies, &[]);
        let mut baseline_holdings = HoldingSet::new(rows.clone());
        let baseline = run(&mut baseline_holdings, Arc::clone(&reg)).await;

        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        rows.shuffle(&mut rng);
        let mut shuffled_holdings = HoldingSet::new(rows);
        let shuffled = run(&mut shuffled_holdings, reg).await;

        let key = |e: &ResolutionLogEntry| {
            (
                e.holding_id.clone(),
                e.matched_company_id.clone(),
                e.match_method,
            )
        };
        assert_eq!(
            baseline.entries.iter().map(key).collect::<Vec<_>>(),
            shuffled.entries.iter().map(key).collect::<Vec<_>>()
        );
        for row in baseline_holdings.rows() {
            assert_eq!(
                row.company_id,
                shuffled_holdings.get(&row.holding_id).unwrap().company_id
            );
        }
    }

    #[test]
    fn analysis_reports_fuzzy_candidates_without_mutating() {
        let reg = CompanyRegistry::build(
            &[company("c1", "Acme Technologies"), company("c2", "Mustang Prospects Holdco, LLC")],
            &[],
        );
        let holdings = HoldingSet::new(vec![
            holding("h1", "Acme Technologies, Inc.", None),
            holding("h2", "Acme Technologies", None),
            holding(
                "h3",
                "Mustang Prospects Holdco, LLC, Jaguar Finance Partners, LLC and Falcon Energy Topco, LP",
                None,
            ),
        ]);

        let analysis =
            analyze_potential_matches(&holdings, &reg, &MatchingConfig::default());
        assert_eq!(analysis.unique_names, 3);
        assert_eq!(analysis.normalized.len(), 1);
        assert_eq!(analysis.first_entity.len(), 1);
        assert_eq!(analysis.total_additional(), 2);
        assert!(holdings.get("h1").unwrap().company_id.is_none());
    }
}
