//! JSON export of financial records.
//!
//! Files are laid out as `{dataset}/{report_type}/{data_version}/{security_code}.json`.
//! The document carries no generation timestamp, so exporting the same record
//! twice yields identical bytes.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::{
    AccountingStandard, Amount, ConsolidationScope, CurrentPeriodType, NullReason, ReportType,
};
use crate::financial::{FinancialRecord, PeriodBlock};

pub const SCHEMA_VERSION: &str = "1.0";
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct PeriodRange {
    pub start: Option<NaiveDate>,
    pub end: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct PeriodDocument {
    pub period: PeriodRange,
    pub balance_sheet_date: NaiveDate,
    /// Every catalog key, `null` when absent.
    pub metrics: BTreeMap<String, Option<Amount>>,
    pub null_reasons: BTreeMap<String, NullReason>,
}

impl From<&PeriodBlock> for PeriodDocument {
    fn from(block: &PeriodBlock) -> Self {
        let metrics = block
            .metrics
            .iter()
            .map(|(key, metric)| (key.clone(), metric.value))
            .collect();
        let null_reasons = block
            .metrics
            .iter()
            .filter_map(|(key, metric)| metric.null_reason.map(|r| (key.clone(), r)))
            .collect();
        Self {
            period: PeriodRange {
                start: block.period_start,
                end: block.period_end,
            },
            balance_sheet_date: block.balance_sheet_date,
            metrics,
            null_reasons,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FinancialDocument {
    pub schema_version: &'static str,
    pub engine_version: &'static str,
    pub data_version: String,
    pub doc_id: String,
    pub security_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edinet_code: Option<String>,
    pub report_type: ReportType,
    pub consolidation_type: ConsolidationScope,
    pub accounting_standard: AccountingStandard,
    pub fiscal_year_end: NaiveDate,
    pub currency: String,
    pub unit: String,
    pub current_year: PeriodDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_year: Option<PeriodDocument>,
}

impl From<&FinancialRecord> for FinancialDocument {
    fn from(record: &FinancialRecord) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            engine_version: ENGINE_VERSION,
            data_version: data_version(record),
            doc_id: record.doc_id.clone(),
            security_code: normalize_security_code(&record.security_code),
            company_name: record.company_name.clone(),
            edinet_code: record.edinet_code.clone(),
            report_type: record.report_type,
            consolidation_type: record.consolidation_type,
            accounting_standard: record.accounting_standard,
            fiscal_year_end: record.fiscal_year_end,
            currency: record.currency.clone(),
            unit: record.currency.clone(),
            current_year: PeriodDocument::from(&record.current_year),
            prior_year: record.prior_year.as_ref().map(PeriodDocument::from),
        }
    }
}

/// Five-digit codes ending in `0` are shortened to the four-digit listing
/// code; anything else is kept as disclosed.
pub fn normalize_security_code(raw: &str) -> String {
    let code = raw.trim();
    if code.chars().count() == 5 && code.ends_with('0') {
        code.chars().take(4).collect()
    } else {
        code.to_string()
    }
}

/// Fiscal period identity: `2025FY`, `2025HY`, `2025Q3`. The year is the
/// calendar year the current period ends in.
pub fn data_version(record: &FinancialRecord) -> String {
    let end = record.current_year.period_end;
    match (record.report_type, record.period_type) {
        (ReportType::Annual, _) => format!("{}FY", end.year()),
        (ReportType::SemiAnnual, _) => format!("{}HY", end.year()),
        (ReportType::Quarterly, Some(CurrentPeriodType::Quarter(n))) => {
            format!("{}Q{}", end.year(), n)
        }
        (ReportType::Quarterly, _) => {
            let quarter = match end.month() {
                1..=3 => 1,
                4..=6 => 2,
                7..=9 => 3,
                _ => 4,
            };
            format!("{}Q{}", end.year(), quarter)
        }
    }
}

pub fn to_json(record: &FinancialRecord, pretty: bool) -> serde_json::Result<String> {
    let document = FinancialDocument::from(record);
    if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
}

pub fn output_path(dataset_dir: &Path, record: &FinancialRecord) -> PathBuf {
    dataset_dir
        .join(record.report_type.to_string())
        .join(data_version(record))
        .join(format!("{}.json", normalize_security_code(&record.security_code)))
}

/// Writes the record under `dataset_dir` and returns the file path.
pub fn write_record(dataset_dir: &Path, record: &FinancialRecord, pretty: bool) -> Result<PathBuf> {
    let path = output_path(dataset_dir, record);
    if let Some(parent) = path.parent() {
        crate::utils::dirs::ensure_dir(parent)?;
    }
    let json = to_json(record, pretty)
        .with_context(|| format!("Failed to serialize record for {}", record.doc_id))?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("{}: saved {}", record.doc_id, path.display());
    Ok(path)
}
