// src/store/mod.rs - CSV table adapter and the holding arena.
//
// The engine itself is storage-agnostic: it consumes and produces plain
// record collections. This module is the one place that knows the on-disk
// layout (the silver/gold table directories of the upstream pipeline).

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;

use crate::models::core::{CanonicalCompany, EntityAlias, RawHolding};
use crate::models::matching::{ConsolidationLogEntry, ResolutionLogEntry};

pub const HOLDINGS_FILE: &str = "fact_reported_holding.csv";
pub const COMPANIES_FILE: &str = "dim_company.csv";
pub const ALIASES_FILE: &str = "dim_entity_alias.csv";
pub const RESOLUTION_LOG_FILE: &str = "entity_resolution_log.csv";
pub const CONSOLIDATION_LOG_FILE: &str = "company_consolidation_log.csv";

/// Holdings arena: rows in input order plus a stable id -> index lookup.
/// All mutation goes through the arena so a holding is always addressed by
/// its `holding_id`, never by a transient position.
#[derive(Debug, Default)]
pub struct HoldingSet {
    rows: Vec<RawHolding>,
    index: HashMap<String, usize>,
}

impl HoldingSet {
    pub fn new(rows: Vec<RawHolding>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if index.insert(row.holding_id.clone(), i).is_some() {
                warn!(
                    "Duplicate holding_id '{}' in input; later row shadows earlier in lookups",
                    row.holding_id
                );
            }
        }
        Self { rows, index }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[RawHolding] {
        &self.rows
    }

    pub fn get(&self, holding_id: &str) -> Option<&RawHolding> {
        self.index.get(holding_id).map(|&i| &self.rows[i])
    }

    /// Set a holding's company_id. Returns false for an unknown id.
    pub fn assign_company(&mut self, holding_id: &str, company_id: String) -> bool {
        match self.index.get(holding_id) {
            Some(&i) => {
                self.rows[i].company_id = Some(company_id);
                true
            }
            None => false,
        }
    }

    /// Mutable sweep over rows, for the consolidation remap. The holding_id
    /// key must not be modified through this.
    pub fn rows_mut(&mut self) -> &mut [RawHolding] {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<RawHolding> {
        self.rows
    }
}

/// File-system table store over the upstream data layout:
/// `<root>/silver/` holds the input tables, `<root>/gold/` the append-only
/// logs and reports.
#[derive(Debug, Clone)]
pub struct TableStore {
    root: PathBuf,
}

impl TableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn silver_dir(&self) -> PathBuf {
        self.root.join("silver")
    }

    pub fn gold_dir(&self) -> PathBuf {
        self.root.join("gold")
    }

    /// Required table; missing or unreadable is fatal for the run.
    pub fn load_holdings(&self) -> Result<HoldingSet> {
        let path = self.silver_dir().join(HOLDINGS_FILE);
        let rows: Vec<RawHolding> = read_table(&path)
            .with_context(|| format!("Missing required holdings table: {}", path.display()))?;
        Ok(HoldingSet::new(rows))
    }

    /// Required table; missing or unreadable is fatal for the run.
    pub fn load_companies(&self) -> Result<Vec<CanonicalCompany>> {
        let path = self.silver_dir().join(COMPANIES_FILE);
        read_table(&path)
            .with_context(|| format!("Missing required companies table: {}", path.display()))
    }

    /// Optional table: a data set with no aliases yet is a normal state.
    pub fn load_aliases(&self) -> Result<Vec<EntityAlias>> {
        let path = self.silver_dir().join(ALIASES_FILE);
        if !path.exists() {
            warn!("No alias table at {}; starting empty", path.display());
            return Ok(Vec::new());
        }
        read_table(&path)
            .with_context(|| format!("Failed to read alias table: {}", path.display()))
    }

    pub fn save_holdings(&self, holdings: &HoldingSet) -> Result<()> {
        let path = self.silver_dir().join(HOLDINGS_FILE);
        write_table(&path, holdings.rows())
            .with_context(|| format!("Failed to write holdings table: {}", path.display()))
    }

    pub fn save_aliases(&self, aliases: &[EntityAlias]) -> Result<()> {
        let path = self.silver_dir().join(ALIASES_FILE);
        write_table(&path, aliases)
            .with_context(|| format!("Failed to write alias table: {}", path.display()))
    }

    pub fn append_resolution_log(&self, entries: &[ResolutionLogEntry]) -> Result<()> {
        let path = self.gold_dir().join(RESOLUTION_LOG_FILE);
        append_table(&path, entries)
            .with_context(|| format!("Failed to append resolution log: {}", path.display()))
    }

    pub fn append_consolidation_log(&self, entries: &[ConsolidationLogEntry]) -> Result<()> {
        let path = self.gold_dir().join(CONSOLIDATION_LOG_FILE);
        append_table(&path, entries)
            .with_context(|| format!("Failed to append consolidation log: {}", path.display()))
    }
}

fn read_table<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn write_table<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn append_table<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let exists = path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(!exists)
        .from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
