//! Entity resolution and company consolidation for financial filing
//! holdings.
//!
//! Raw company names extracted from filings are resolved to canonical
//! company identities by an ordered matching cascade with fixed confidence
//! tiers; a second, stricter pass merges canonical companies that turn out
//! to be duplicates, redirecting references and recording aliases without
//! ever deleting a record.

pub mod consolidation;
pub mod matching;
pub mod models;
pub mod report;
pub mod store;
pub mod utils;

// Re-export the main entry points for convenience
pub use consolidation::{
    apply_consolidation, consolidate_companies, find_consolidation_groups, ConsolidationPlan,
    ConsolidationReport,
};
pub use matching::registry::CompanyRegistry;
pub use matching::resolver::{
    analyze_potential_matches, resolve_holdings, MatchAnalysis, ResolutionReport,
};
pub use models::core::{CanonicalCompany, EntityAlias, RawHolding};
pub use models::matching::{
    ConsolidationLogEntry, MatchMethod, ResolutionLogEntry, SkippedCandidate,
};
pub use store::{HoldingSet, TableStore};
pub use utils::config::MatchingConfig;
