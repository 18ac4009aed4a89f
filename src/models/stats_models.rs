// src/models/stats_models.rs

use serde::Serialize;

use crate::models::matching::MatchMethod;

/// Per-method outcome counts for one resolver pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionStats {
    pub total_holdings: usize,
    pub already_resolved: usize,
    pub processed: usize,
    pub resolved_direct: usize,
    pub resolved_alias: usize,
    pub resolved_normalized: usize,
    pub resolved_token_overlap: usize,
    pub resolved_first_entity: usize,
    pub unresolved: usize,
    pub row_errors: usize,
}

impl ResolutionStats {
    pub fn record(&mut self, method: MatchMethod) {
        match method {
            MatchMethod::Direct => self.resolved_direct += 1,
            MatchMethod::Alias => self.resolved_alias += 1,
            MatchMethod::Normalized => self.resolved_normalized += 1,
            MatchMethod::TokenOverlap => self.resolved_token_overlap += 1,
            MatchMethod::FirstEntity => self.resolved_first_entity += 1,
            MatchMethod::Unresolved => self.unresolved += 1,
        }
    }

    pub fn total_resolved(&self) -> usize {
        self.resolved_direct
            + self.resolved_alias
            + self.resolved_normalized
            + self.resolved_token_overlap
            + self.resolved_first_entity
    }

    pub fn resolution_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.total_resolved() as f64 / self.processed as f64
        }
    }

    pub fn merge(&mut self, other: &ResolutionStats) {
        self.processed += other.processed;
        self.resolved_direct += other.resolved_direct;
        self.resolved_alias += other.resolved_alias;
        self.resolved_normalized += other.resolved_normalized;
        self.resolved_token_overlap += other.resolved_token_overlap;
        self.resolved_first_entity += other.resolved_first_entity;
        self.unresolved += other.unresolved;
        self.row_errors += other.row_errors;
    }
}

/// Outcome counts for one consolidation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsolidationStats {
    pub total_companies: usize,
    pub groups_found: usize,
    pub duplicates_normalized: usize,
    pub duplicates_token_overlap: usize,
    pub duplicates_first_entity: usize,
    pub holdings_updated: usize,
    pub aliases_added: usize,
    pub pairs_logged: usize,
    pub pairs_already_applied: usize,
    pub candidates_skipped: usize,
}

impl ConsolidationStats {
    pub fn record_group(&mut self, method: MatchMethod, duplicate_count: usize) {
        self.groups_found += 1;
        match method {
            MatchMethod::Normalized => self.duplicates_normalized += duplicate_count,
            MatchMethod::TokenOverlap => self.duplicates_token_overlap += duplicate_count,
            MatchMethod::FirstEntity => self.duplicates_first_entity += duplicate_count,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_rate_handles_empty_pass() {
        let stats = ResolutionStats::default();
        assert_eq!(stats.resolution_rate(), 0.0);
    }

    #[test]
    fn merge_accumulates_counts() {
        let mut a = ResolutionStats {
            processed: 3,
            resolved_direct: 2,
            unresolved: 1,
            ..Default::default()
        };
        let b = ResolutionStats {
            processed: 2,
            resolved_alias: 2,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.processed, 5);
        assert_eq!(a.total_resolved(), 4);
        assert_eq!(a.unresolved, 1);
    }
}
