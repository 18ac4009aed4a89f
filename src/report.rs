// src/report.rs - Per-run summary record, appended to the gold directory.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::stats_models::{ConsolidationStats, ResolutionStats};

pub const RUN_REPORT_FILE: &str = "pipeline_runs.jsonl";

/// One batch invocation's identity, timings, and outcomes. Serialized as a
/// single JSON line so the gold directory keeps the full run history.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub command: String,
    pub registry_fingerprint: Option<String>,
    pub phase_timings_secs: BTreeMap<String, f64>,
    pub resolution: Option<ResolutionStats>,
    pub consolidation: Option<ConsolidationStats>,
}

impl RunReport {
    pub fn new(command: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            run_timestamp: Utc::now().naive_utc(),
            command: command.to_string(),
            registry_fingerprint: None,
            phase_timings_secs: BTreeMap::new(),
            resolution: None,
            consolidation: None,
        }
    }

    pub fn record_phase(&mut self, phase: &str, elapsed: Duration) {
        self.phase_timings_secs
            .insert(phase.to_string(), elapsed.as_secs_f64());
    }

    /// Append this run as one JSON line under the gold directory.
    pub fn write(&self, gold_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(gold_dir)
            .with_context(|| format!("Failed to create {}", gold_dir.display()))?;
        let path = gold_dir.join(RUN_REPORT_FILE);
        let line = serde_json::to_string(self).context("Failed to serialize run report")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open run report {}", path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to append run report {}", path.display()))?;
        Ok(path)
    }
}
