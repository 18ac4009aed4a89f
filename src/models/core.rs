// src/models/core.rs

use serde::{Deserialize, Serialize};

/// A raw holding row as reported in a filing. `company_id` starts out absent
/// and is filled in by the resolver; the consolidation pass may later redirect
/// it to a canonical company. Rows are never deleted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHolding {
    #[serde(rename = "reported_holding_id")]
    pub holding_id: String,
    pub raw_company_name: String,
    #[serde(default)]
    pub company_id: Option<String>,
}

/// The authoritative company record raw names resolve to. The set is fixed
/// during a resolution run; consolidation merges references between rows but
/// never deletes one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalCompany {
    pub company_id: String,
    pub company_name: String,
}

/// A known alternate spelling of an entity's name. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityAlias {
    pub alias_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub alias_text: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
}

impl EntityAlias {
    pub const ENTITY_TYPE_COMPANY: &'static str = "company";

    /// Whether this alias row refers to a company (case-insensitive on the
    /// stored entity_type, which upstream sources do not normalize).
    pub fn is_company(&self) -> bool {
        self.entity_type.eq_ignore_ascii_case(Self::ENTITY_TYPE_COMPANY)
    }
}
