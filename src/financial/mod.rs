//! Integrates normalized statements into one `FinancialRecord` per filing.

pub mod record;

pub use record::{FinancialRecord, Metric, PeriodBlock};

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::core::{
    AccountingStandard, ConsolidationScope, CurrentPeriodType, NullReason, ReportType,
    StatementType,
};
use crate::error::{FilingRejected, RejectionReason};
use crate::normalizer::{FactOutcome, FilingHeader, NormalizedPeriod};
use crate::taxonomy::{FactKey, Taxonomy};
use crate::xbrl::UnitTable;

/// Identifying metadata a filing must have before anything is normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct FilingIdentity {
    pub doc_id: String,
    pub security_code: String,
    pub company_name: Option<String>,
    pub edinet_code: Option<String>,
    pub accounting_standard: AccountingStandard,
    pub consolidation_scope: ConsolidationScope,
    pub fiscal_year_end: NaiveDate,
    /// Expected end of the current period.
    pub period_target: NaiveDate,
    pub report_type: ReportType,
    pub period_type: Option<CurrentPeriodType>,
}

impl FilingIdentity {
    /// Rejects the filing when its security code, fiscal year end or
    /// accounting standard cannot be resolved from the header.
    pub fn from_header(doc_id: &str, header: &FilingHeader) -> Result<Self, FilingRejected> {
        let reject = |reason: RejectionReason| FilingRejected {
            doc_id: doc_id.to_string(),
            reason,
        };

        let security_code = header
            .security_code
            .clone()
            .ok_or_else(|| reject(RejectionReason::MissingSecurityCode))?;
        // Used verbatim as the output file name.
        if !security_code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(reject(RejectionReason::InvalidSecurityCode(security_code)));
        }

        let fiscal_year_end = match (&header.fiscal_year_end, &header.fiscal_year_end_raw) {
            (Some(date), _) => *date,
            (None, Some(raw)) => {
                return Err(reject(RejectionReason::InvalidFiscalYearEnd(raw.clone())))
            }
            (None, None) => return Err(reject(RejectionReason::MissingFiscalYearEnd)),
        };

        let accounting_standard = header.accounting_standard.ok_or_else(|| {
            reject(RejectionReason::UnknownAccountingStandard(
                header.accounting_standard_raw.clone(),
            ))
        })?;

        Ok(Self {
            doc_id: doc_id.to_string(),
            security_code,
            company_name: header.company_name.clone(),
            edinet_code: header.edinet_code.clone(),
            accounting_standard,
            consolidation_scope: header.consolidation_scope(),
            fiscal_year_end,
            period_target: header.period_target().unwrap_or(fiscal_year_end),
            report_type: header.report_type(),
            period_type: header.period_type,
        })
    }
}

pub struct FinancialMaster<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> FinancialMaster<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn assemble(
        &self,
        identity: &FilingIdentity,
        current: &NormalizedPeriod,
        prior: Option<&NormalizedPeriod>,
        units: &UnitTable,
    ) -> FinancialRecord {
        let current_year = self.period_block(current);
        let prior_year = prior
            .map(|period| self.period_block(period))
            .filter(|block| {
                let keep = block.non_null_count() > 0;
                if !keep {
                    log::debug!("{}: prior period has no values, omitted", identity.doc_id);
                }
                keep
            });

        let currency = self.currency(&current_year, units);

        log::info!(
            "{}: {} {} current={} prior={}",
            identity.doc_id,
            identity.security_code,
            identity.accounting_standard,
            current_year.non_null_count(),
            prior_year.as_ref().map_or(0, |b| b.non_null_count())
        );

        FinancialRecord {
            doc_id: identity.doc_id.clone(),
            security_code: identity.security_code.clone(),
            company_name: identity.company_name.clone(),
            edinet_code: identity.edinet_code.clone(),
            accounting_standard: identity.accounting_standard,
            consolidation_type: identity.consolidation_scope,
            report_type: identity.report_type,
            period_type: identity.period_type,
            fiscal_year_end: identity.fiscal_year_end,
            currency,
            current_year,
            prior_year,
        }
    }

    fn period_block(&self, period: &NormalizedPeriod) -> PeriodBlock {
        let metrics: BTreeMap<String, Metric> = self
            .taxonomy
            .output_keys()
            .map(|key| (key.key.clone(), resolve(key, period)))
            .collect();

        let balance_sheet_date = period
            .statement(StatementType::BalanceSheet)
            .map(|s| s.instant_date)
            .unwrap_or(period.anchor.date);

        PeriodBlock {
            bucket: period.anchor.bucket,
            period_start: period.anchor.start,
            period_end: period.anchor.date,
            balance_sheet_date,
            metrics,
        }
    }

    /// ISO code of the first monetary unit among the current values, in
    /// catalog order.
    fn currency(&self, block: &PeriodBlock, units: &UnitTable) -> String {
        self.taxonomy
            .output_keys()
            .filter_map(|key| block.metrics.get(&key.key))
            .filter(|m| m.value.is_some())
            .filter_map(|m| m.unit_ref.as_ref())
            .filter_map(|unit_ref| units.get(unit_ref))
            .find_map(|unit| unit.currency())
            .unwrap_or(self.taxonomy.default_currency())
            .to_string()
    }
}

/// First source with a value wins; a disclosed nil in an earlier source
/// stops the search. Otherwise the most informative null reason among the
/// sources is kept.
fn resolve(key: &FactKey, period: &NormalizedPeriod) -> Metric {
    let mut reason: Option<NullReason> = None;

    for source in &key.sources {
        let Some(fact) = period.fact(source) else {
            continue;
        };
        match fact.outcome {
            FactOutcome::Value(amount) => {
                return Metric {
                    value: Some(amount),
                    null_reason: None,
                    source_key: Some(source.clone()),
                    source_tag: fact.source_tag.clone(),
                    unit_ref: fact.unit_ref.clone(),
                }
            }
            FactOutcome::Null(NullReason::DisclosedNil) => {
                return Metric {
                    source_key: Some(source.clone()),
                    source_tag: fact.source_tag.clone(),
                    ..Metric::null(NullReason::DisclosedNil)
                }
            }
            FactOutcome::Null(other) => {
                reason = Some(match reason {
                    Some(current) if rank(current) >= rank(other) => current,
                    _ => other,
                });
            }
        }
    }

    Metric::null(reason.unwrap_or(NullReason::NotApplicableStandard))
}

fn rank(reason: NullReason) -> u8 {
    match reason {
        NullReason::NotApplicableStandard => 0,
        NullReason::NotApplicableEconomic => 1,
        NullReason::ExtractionGap => 2,
        NullReason::DisclosedNil => 3,
    }
}
