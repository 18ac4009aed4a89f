pub mod candidates;
pub mod engine;

pub use candidates::{find_consolidation_groups, ConsolidationPlan};
pub use engine::{apply_consolidation, consolidate_companies, ConsolidationReport};
