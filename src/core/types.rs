use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use strum::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
pub enum AccountingStandard {
    #[serde(rename = "JGAAP")]
    Jgaap,
    #[serde(rename = "IFRS")]
    Ifrs,
    #[serde(rename = "US-GAAP")]
    UsGaap,
}

impl fmt::Display for AccountingStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountingStandard::Jgaap => write!(f, "JGAAP"),
            AccountingStandard::Ifrs => write!(f, "IFRS"),
            AccountingStandard::UsGaap => write!(f, "US-GAAP"),
        }
    }
}

impl FromStr for AccountingStandard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "JGAAP" => Ok(AccountingStandard::Jgaap),
            "IFRS" => Ok(AccountingStandard::Ifrs),
            "US-GAAP" => Ok(AccountingStandard::UsGaap),
            other => Err(format!("unknown accounting standard: {}", other)),
        }
    }
}

/// Statement a canonical key belongs to. Drives the default period kind and
/// whether the balance-sheet anchor pass applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
pub enum StatementType {
    #[serde(rename = "BS")]
    BalanceSheet,
    #[serde(rename = "PL")]
    IncomeStatement,
    #[serde(rename = "CF")]
    CashFlow,
    #[serde(rename = "DEI")]
    Dei,
}

impl StatementType {
    pub fn default_period_kind(&self) -> PeriodKind {
        match self {
            StatementType::BalanceSheet | StatementType::Dei => PeriodKind::Instant,
            StatementType::IncomeStatement | StatementType::CashFlow => PeriodKind::Duration,
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementType::BalanceSheet => write!(f, "BS"),
            StatementType::IncomeStatement => write!(f, "PL"),
            StatementType::CashFlow => write!(f, "CF"),
            StatementType::Dei => write!(f, "DEI"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Instant,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationScope {
    Consolidated,
    NonConsolidated,
}

impl fmt::Display for ConsolidationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsolidationScope::Consolidated => write!(f, "consolidated"),
            ConsolidationScope::NonConsolidated => write!(f, "non_consolidated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum PeriodBucket {
    CurrentYear,
    PriorYear,
    PriorPriorYear,
}

impl PeriodBucket {
    pub fn years_back(&self) -> u32 {
        match self {
            PeriodBucket::CurrentYear => 0,
            PeriodBucket::PriorYear => 1,
            PeriodBucket::PriorPriorYear => 2,
        }
    }
}

impl fmt::Display for PeriodBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodBucket::CurrentYear => write!(f, "current_year"),
            PeriodBucket::PriorYear => write!(f, "prior_year"),
            PeriodBucket::PriorPriorYear => write!(f, "prior_prior_year"),
        }
    }
}

/// Why a canonical value is null. A present value carries no reason at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullReason {
    NotApplicableEconomic,
    NotApplicableStandard,
    DisclosedNil,
    ExtractionGap,
}

impl fmt::Display for NullReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullReason::NotApplicableEconomic => write!(f, "not_applicable_economic"),
            NullReason::NotApplicableStandard => write!(f, "not_applicable_standard"),
            NullReason::DisclosedNil => write!(f, "disclosed_nil"),
            NullReason::ExtractionGap => write!(f, "extraction_gap"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Integer,
    Decimal,
}

/// Which consolidation boundary a rule reads from. `Filing` follows the
/// filing's own consolidation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    #[default]
    Filing,
    Consolidated,
    NonConsolidated,
}

impl RuleScope {
    pub fn resolve(&self, filing: ConsolidationScope) -> ConsolidationScope {
        match self {
            RuleScope::Filing => filing,
            RuleScope::Consolidated => ConsolidationScope::Consolidated,
            RuleScope::NonConsolidated => ConsolidationScope::NonConsolidated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Annual,
    SemiAnnual,
    Quarterly,
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Annual => write!(f, "annual"),
            ReportType::SemiAnnual => write!(f, "semi_annual"),
            ReportType::Quarterly => write!(f, "quarterly"),
        }
    }
}

/// `TypeOfCurrentPeriodDEI` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentPeriodType {
    FullYear,
    HalfYear,
    Quarter(u8),
}

impl CurrentPeriodType {
    pub fn report_type(&self) -> ReportType {
        match self {
            CurrentPeriodType::FullYear => ReportType::Annual,
            CurrentPeriodType::HalfYear => ReportType::SemiAnnual,
            CurrentPeriodType::Quarter(_) => ReportType::Quarterly,
        }
    }
}

impl FromStr for CurrentPeriodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FY" => Ok(CurrentPeriodType::FullYear),
            "HY" => Ok(CurrentPeriodType::HalfYear),
            "Q1" => Ok(CurrentPeriodType::Quarter(1)),
            "Q2" => Ok(CurrentPeriodType::Quarter(2)),
            "Q3" => Ok(CurrentPeriodType::Quarter(3)),
            "Q4" => Ok(CurrentPeriodType::Quarter(4)),
            other => Err(format!("unknown period type: {}", other)),
        }
    }
}

/// A disclosed numeric value, kept in the unit the filer used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Integer(i64),
    Decimal(f64),
}

impl Amount {
    /// Parses a fact's text as `value_type`. Integers written with a zero
    /// fraction (`"1200.0"`) are accepted.
    pub fn parse(raw: &str, value_type: ValueType) -> Option<Amount> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match value_type {
            ValueType::Integer => raw.parse::<i64>().ok().map(Amount::Integer).or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15)
                    .map(|v| Amount::Integer(v as i64))
            }),
            ValueType::Decimal => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Amount::Decimal),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Amount::Integer(v) => *v as f64,
            Amount::Decimal(v) => *v,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Integer(v) => write!(f, "{}", v),
            Amount::Decimal(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_parse() {
        assert_eq!(Amount::parse("100000", ValueType::Integer), Some(Amount::Integer(100000)));
        assert_eq!(Amount::parse(" -250 ", ValueType::Integer), Some(Amount::Integer(-250)));
        assert_eq!(Amount::parse("1200.0", ValueType::Integer), Some(Amount::Integer(1200)));
        assert_eq!(Amount::parse("12.5", ValueType::Integer), None);
        assert_eq!(Amount::parse("12.5", ValueType::Decimal), Some(Amount::Decimal(12.5)));
        assert_eq!(Amount::parse("", ValueType::Decimal), None);
        assert_eq!(Amount::parse("n/a", ValueType::Integer), None);
    }

    #[test]
    fn test_standard_from_str() {
        assert_eq!("jgaap".parse::<AccountingStandard>(), Ok(AccountingStandard::Jgaap));
        assert_eq!("US-GAAP".parse::<AccountingStandard>(), Ok(AccountingStandard::UsGaap));
        assert!("Japan GAAP".parse::<AccountingStandard>().is_err());
    }

    #[test]
    fn test_period_type() {
        assert_eq!("Q2".parse::<CurrentPeriodType>(), Ok(CurrentPeriodType::Quarter(2)));
        assert_eq!(
            "FY".parse::<CurrentPeriodType>().map(|p| p.report_type()),
            Ok(ReportType::Annual)
        );
    }
}
