use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::core::{
    AccountingStandard, Amount, ConsolidationScope, CurrentPeriodType, NullReason, PeriodBucket,
    ReportType,
};

/// A canonical key's final value in one period block.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub value: Option<Amount>,
    /// Set exactly when `value` is `None`.
    pub null_reason: Option<NullReason>,
    /// Rule key that supplied the outcome.
    pub source_key: Option<String>,
    pub source_tag: Option<String>,
    pub unit_ref: Option<String>,
}

impl Metric {
    pub fn null(reason: NullReason) -> Self {
        Self {
            value: None,
            null_reason: Some(reason),
            source_key: None,
            source_tag: None,
            unit_ref: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBlock {
    pub bucket: PeriodBucket,
    pub period_start: Option<NaiveDate>,
    pub period_end: NaiveDate,
    /// Instant date the balance-sheet values were taken from.
    pub balance_sheet_date: NaiveDate,
    /// Every non-derived catalog key.
    pub metrics: BTreeMap<String, Metric>,
}

impl PeriodBlock {
    pub fn value(&self, key: &str) -> Option<Amount> {
        self.metrics.get(key).and_then(|m| m.value)
    }

    pub fn null_reason(&self, key: &str) -> Option<NullReason> {
        self.metrics.get(key).and_then(|m| m.null_reason)
    }

    pub fn non_null_count(&self) -> usize {
        self.metrics.values().filter(|m| m.value.is_some()).count()
    }
}

/// One filing's integrated output.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialRecord {
    pub doc_id: String,
    pub security_code: String,
    pub company_name: Option<String>,
    pub edinet_code: Option<String>,
    pub accounting_standard: AccountingStandard,
    pub consolidation_type: ConsolidationScope,
    pub report_type: ReportType,
    pub period_type: Option<CurrentPeriodType>,
    pub fiscal_year_end: NaiveDate,
    pub currency: String,
    pub current_year: PeriodBlock,
    /// Absent when the prior period has no non-null values at all.
    pub prior_year: Option<PeriodBlock>,
}
