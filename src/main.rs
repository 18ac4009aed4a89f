use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::info;

use resolution_lib::consolidation::{consolidate_companies, find_consolidation_groups};
use resolution_lib::matching::registry::CompanyRegistry;
use resolution_lib::matching::resolver::{analyze_potential_matches, resolve_holdings};
use resolution_lib::report::RunReport;
use resolution_lib::store::TableStore;
use resolution_lib::utils::config::MatchingConfig;
use resolution_lib::utils::env::load_env;
use resolution_lib::utils::get_memory_usage;

#[derive(Parser)]
#[command(
    name = "resolve",
    about = "Entity resolution and company consolidation for filing holdings"
)]
struct Cli {
    /// Root of the data directory (expects silver/ tables, writes gold/ logs)
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve raw holding names against the canonical company registry
    Resolve,
    /// Merge duplicate canonical companies and redirect references
    Consolidate {
        /// Plan and report only; mutate nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Report what the fuzzy strategies would match, without mutating
    Analyze,
    /// Resolve holdings, then consolidate duplicate companies
    Full,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();

    let cli = Cli::parse();
    let config = MatchingConfig::from_env();
    config.log_config();

    let store = TableStore::new(&cli.data_dir);
    info!(
        "Starting entity resolution pipeline (data dir: {}, memory: {} MB)",
        cli.data_dir.display(),
        get_memory_usage()
    );

    let command_name = match &cli.command {
        Command::Resolve => "resolve",
        Command::Consolidate { dry_run: true } => "consolidate --dry-run",
        Command::Consolidate { dry_run: false } => "consolidate",
        Command::Analyze => "analyze",
        Command::Full => "full",
    };
    let mut report = RunReport::new(command_name);
    info!("Run ID: {}", report.run_id);

    let multi_progress = MultiProgress::new();
    let total_start = Instant::now();

    match cli.command {
        Command::Resolve => {
            run_resolution(&store, &config, &multi_progress, &mut report).await?;
        }
        Command::Consolidate { dry_run } => {
            run_consolidation(&store, &config, dry_run, &mut report)?;
        }
        Command::Analyze => {
            run_analysis(&store, &config)?;
        }
        Command::Full => {
            run_resolution(&store, &config, &multi_progress, &mut report).await?;
            run_consolidation(&store, &config, false, &mut report)?;
        }
    }

    report.record_phase("total", total_start.elapsed());
    let report_path = report.write(&store.gold_dir())?;
    info!(
        "Pipeline completed in {:.2?}; run report appended to {}",
        total_start.elapsed(),
        report_path.display()
    );
    Ok(())
}

async fn run_resolution(
    store: &TableStore,
    config: &MatchingConfig,
    multi_progress: &MultiProgress,
    report: &mut RunReport,
) -> Result<()> {
    let phase_start = Instant::now();
    info!("Phase: holding resolution starting...");

    let companies = store.load_companies()?;
    let aliases = store.load_aliases()?;
    let mut holdings = store.load_holdings()?;

    let registry = Arc::new(CompanyRegistry::build(&companies, &aliases));
    info!(
        "Registry: {} companies, {} aliases, fingerprint {}",
        registry.company_count(),
        registry.alias_count(),
        &registry.fingerprint()[..12]
    );
    report.registry_fingerprint = Some(registry.fingerprint().to_string());

    let outcome = resolve_holdings(
        &mut holdings,
        Arc::clone(&registry),
        config,
        Some(multi_progress.clone()),
    )
    .await?;

    store.save_holdings(&holdings)?;
    store.append_resolution_log(&outcome.entries)?;

    info!(
        "Phase: holding resolution complete in {:.2?} ({} resolved / {} processed)",
        phase_start.elapsed(),
        outcome.stats.total_resolved(),
        outcome.stats.processed
    );
    report.record_phase("resolution", phase_start.elapsed());
    report.resolution = Some(outcome.stats);
    Ok(())
}

fn run_consolidation(
    store: &TableStore,
    config: &MatchingConfig,
    dry_run: bool,
    report: &mut RunReport,
) -> Result<()> {
    let phase_start = Instant::now();
    info!(
        "Phase: company consolidation starting{}...",
        if dry_run { " (dry run)" } else { "" }
    );

    let companies = store.load_companies()?;
    let mut holdings = store.load_holdings()?;
    let mut aliases = store.load_aliases()?;

    if dry_run {
        let plan = find_consolidation_groups(&companies, config);
        let id_to_name: std::collections::HashMap<&str, &str> = companies
            .iter()
            .map(|c| (c.company_id.as_str(), c.company_name.as_str()))
            .collect();
        for group in &plan.groups {
            info!(
                "[{}] {} CANONICAL: '{}'",
                group.method,
                group.reason,
                id_to_name.get(group.canonical_id.as_str()).unwrap_or(&"?")
            );
            for duplicate in &group.duplicate_ids {
                info!("  <- '{}'", id_to_name.get(duplicate.as_str()).unwrap_or(&"?"));
            }
        }
        for skipped in &plan.skipped {
            info!("SKIP [{}] {}: {}", skipped.method, skipped.subject, skipped.reason);
        }
        info!(
            "Dry run: {} groups, {} skipped candidates; nothing written",
            plan.groups.len(),
            plan.skipped.len()
        );
    } else {
        let outcome = consolidate_companies(&companies, &mut holdings, &mut aliases, config)?;
        store.save_holdings(&holdings)?;
        store.save_aliases(&aliases)?;
        store.append_consolidation_log(&outcome.log_entries)?;
        report.consolidation = Some(outcome.stats);
    }

    info!(
        "Phase: company consolidation complete in {:.2?}",
        phase_start.elapsed()
    );
    report.record_phase("consolidation", phase_start.elapsed());
    Ok(())
}

fn run_analysis(store: &TableStore, config: &MatchingConfig) -> Result<()> {
    let companies = store.load_companies()?;
    let aliases = store.load_aliases()?;
    let holdings = store.load_holdings()?;
    let registry = CompanyRegistry::build(&companies, &aliases);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("    {spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message("Analyzing potential matches...");

    let analysis = analyze_potential_matches(&holdings, &registry, config);
    spinner.finish_and_clear();

    info!("=== Potential Match Analysis ===");
    info!("Unique company names in holdings: {}", analysis.unique_names);
    info!("Currently unresolved names:       {}", analysis.unresolved_names);
    info!("NORMALIZED would find {} additional matches", analysis.normalized.len());
    for (raw, matched) in analysis.normalized.iter().take(5) {
        info!("  '{}' -> '{}'", raw, matched);
    }
    info!(
        "TOKEN OVERLAP would find {} additional matches",
        analysis.token_overlap.len()
    );
    for (raw, matched, similarity) in analysis.token_overlap.iter().take(5) {
        info!("  '{}' -> '{}' (Jaccard: {:.2})", raw, matched, similarity);
    }
    info!(
        "FIRST ENTITY would find {} additional matches",
        analysis.first_entity.len()
    );
    for (raw, first, matched) in analysis.first_entity.iter().take(5) {
        info!("  '{}' -> first entity '{}' -> '{}'", raw, first, matched);
    }
    info!("TOTAL ADDITIONAL MATCHES: {}", analysis.total_additional());
    Ok(())
}
