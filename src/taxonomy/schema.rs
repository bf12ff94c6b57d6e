//! On-disk shape of the mapping tables. Everything here is validated into
//! [`super::Taxonomy`] before use.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::{AccountingStandard, PeriodKind, RuleScope, StatementType, ValueType};

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyFile {
    #[serde(default)]
    pub accounting_standard_aliases: BTreeMap<String, String>,
    #[serde(default = "default_currency")]
    pub default_currency: String,
    #[serde(default)]
    pub skip_file_patterns: Vec<String>,
    #[serde(default)]
    pub period_matching: PeriodMatching,
    pub dei: DeiTags,
    #[serde(default)]
    pub profiles: Vec<ProfileDef>,
    pub bs_anchor_keys: Vec<String>,
    pub rules: Vec<RuleDef>,
    pub fact_keys: Vec<FactKeyDef>,
}

fn default_currency() -> String {
    "JPY".to_string()
}

/// Tolerances used when matching context dates against the declared
/// fiscal year end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodMatching {
    /// How far a duration end date may sit from the declared year end and
    /// still anchor a period bucket.
    #[serde(default = "default_year_end_drift")]
    pub max_year_end_drift_days: i64,
    /// How far the balance-sheet anchor pass may move away from the
    /// duration-derived instant date.
    #[serde(default = "default_anchor_drift")]
    pub max_anchor_drift_days: i64,
}

fn default_year_end_drift() -> i64 {
    31
}

fn default_anchor_drift() -> i64 {
    93
}

impl Default for PeriodMatching {
    fn default() -> Self {
        Self {
            max_year_end_drift_days: default_year_end_drift(),
            max_anchor_drift_days: default_anchor_drift(),
        }
    }
}

/// Header (DEI) tag lists, each in priority order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeiTags {
    pub security_code: Vec<String>,
    #[serde(default)]
    pub company_name: Vec<String>,
    #[serde(default)]
    pub edinet_code: Vec<String>,
    pub accounting_standard: Vec<String>,
    #[serde(default)]
    pub whether_consolidated: Vec<String>,
    pub fiscal_year_end: Vec<String>,
    /// End of the reported period; differs from the fiscal year end for
    /// quarterly and half-year reports.
    #[serde(default)]
    pub current_period_end: Vec<String>,
    #[serde(default)]
    pub type_of_current_period: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDef {
    pub name: String,
    pub indicator_tags: Vec<String>,
    #[serde(default = "default_min_matches")]
    pub min_matches: usize,
}

fn default_min_matches() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleDef {
    pub key: String,
    pub statement: StatementType,
    #[serde(default)]
    pub period_kind: Option<PeriodKind>,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub scope: RuleScope,
    pub candidates: Vec<CandidateDef>,
    #[serde(default)]
    pub gap_hints: Vec<String>,
    #[serde(default)]
    pub not_applicable_profiles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateDef {
    pub standard: AccountingStandard,
    pub tag: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactKeyDef {
    pub key: String,
    #[serde(default)]
    pub derived: bool,
    #[serde(default)]
    pub sources: Vec<String>,
}
