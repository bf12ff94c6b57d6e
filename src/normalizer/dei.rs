use chrono::NaiveDate;

use crate::core::{AccountingStandard, ConsolidationScope, CurrentPeriodType, ReportType};
use crate::taxonomy::Taxonomy;

use super::FilingFacts;

/// Filing-level metadata read from the DEI header facts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilingHeader {
    pub security_code: Option<String>,
    pub company_name: Option<String>,
    pub edinet_code: Option<String>,
    /// As disclosed, before alias resolution.
    pub accounting_standard_raw: Option<String>,
    pub accounting_standard: Option<AccountingStandard>,
    pub whether_consolidated: Option<bool>,
    pub fiscal_year_end_raw: Option<String>,
    pub fiscal_year_end: Option<NaiveDate>,
    pub current_period_end: Option<NaiveDate>,
    pub period_type: Option<CurrentPeriodType>,
}

impl FilingHeader {
    pub fn extract(facts: &FilingFacts, taxonomy: &Taxonomy) -> Self {
        let dei = taxonomy.dei();
        let text = |tags: &[String]| first_text(facts, tags);

        let accounting_standard_raw = text(&dei.accounting_standard);
        let accounting_standard = accounting_standard_raw
            .as_deref()
            .and_then(|raw| taxonomy.resolve_standard(raw));

        let fiscal_year_end_raw = text(&dei.fiscal_year_end);
        let fiscal_year_end = fiscal_year_end_raw.as_deref().and_then(parse_date);

        let header = Self {
            security_code: text(&dei.security_code),
            company_name: text(&dei.company_name),
            edinet_code: text(&dei.edinet_code).or_else(|| entity_code(facts)),
            accounting_standard_raw,
            accounting_standard,
            whether_consolidated: text(&dei.whether_consolidated).and_then(|v| parse_flag(&v)),
            fiscal_year_end_raw,
            fiscal_year_end,
            current_period_end: text(&dei.current_period_end)
                .as_deref()
                .and_then(parse_date),
            period_type: text(&dei.type_of_current_period).and_then(|v| v.parse().ok()),
        };
        log::debug!("DEI header: {:?}", header);
        header
    }

    /// Consolidation boundary of the filing's default contexts.
    pub fn consolidation_scope(&self) -> ConsolidationScope {
        match self.whether_consolidated {
            Some(false) => ConsolidationScope::NonConsolidated,
            _ => ConsolidationScope::Consolidated,
        }
    }

    pub fn report_type(&self) -> ReportType {
        self.period_type
            .map(|p| p.report_type())
            .unwrap_or(ReportType::Annual)
    }

    /// Date the current period is expected to end on.
    pub fn period_target(&self) -> Option<NaiveDate> {
        self.current_period_end.or(self.fiscal_year_end)
    }
}

/// First non-empty, non-nil text for the highest-priority tag present.
fn first_text(facts: &FilingFacts, tags: &[String]) -> Option<String> {
    tags.iter().find_map(|tag| {
        facts
            .iter()
            .filter(|f| &f.fact.local_name == tag && !f.fact.is_nil)
            .find_map(|f| {
                f.fact
                    .value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
    })
}

/// Filer code from the context entity identifier, `E00001-000` -> `E00001`.
fn entity_code(facts: &FilingFacts) -> Option<String> {
    facts
        .contexts()
        .find_map(|c| c.entity_identifier.as_deref())
        .and_then(|id| id.split('-').next())
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
