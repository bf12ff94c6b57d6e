//! Maps raw facts onto canonical keys, one statement and period bucket at a
//! time.

mod anchor;
pub mod dei;
pub mod nulls;
pub mod period;
pub mod picker;

pub use dei::FilingHeader;
pub use period::{PeriodAnchor, PeriodAnchors};

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

use crate::core::{
    AccountingStandard, Amount, ConsolidationScope, NullReason, PeriodBucket, PeriodKind,
    StatementType,
};
use crate::error::UnresolvedContext;
use crate::taxonomy::{CanonicalKeyRule, Taxonomy};
use crate::xbrl::{ContextDescriptor, ContextPeriod, Instance, RawFact};
use picker::Pick;

/// A raw fact joined with its context. `index` is the fact's position in
/// the document.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedFact<'a> {
    pub index: usize,
    pub fact: &'a RawFact,
    pub context: &'a ContextDescriptor,
}

/// All facts of one document whose context resolved, plus the ones that did
/// not.
#[derive(Debug, Clone)]
pub struct FilingFacts<'a> {
    facts: Vec<ResolvedFact<'a>>,
    unresolved: Vec<UnresolvedContext>,
}

impl<'a> FilingFacts<'a> {
    pub fn join(instance: &'a Instance) -> Self {
        let mut facts = Vec::with_capacity(instance.facts.len());
        let mut unresolved = Vec::new();

        for (index, fact) in instance.facts.iter().enumerate() {
            match instance.contexts.get(&fact.context_ref) {
                Some(context) => facts.push(ResolvedFact {
                    index,
                    fact,
                    context,
                }),
                None => {
                    let warning = UnresolvedContext {
                        tag_name: fact.tag_name.clone(),
                        context_ref: fact.context_ref.clone(),
                    };
                    log::warn!("{}", warning);
                    unresolved.push(warning);
                }
            }
        }

        Self { facts, unresolved }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedFact<'a>> {
        self.facts.iter()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn unresolved(&self) -> &[UnresolvedContext] {
        &self.unresolved
    }

    pub fn contexts(&self) -> impl Iterator<Item = &'a ContextDescriptor> + '_ {
        let mut seen = HashSet::new();
        self.facts
            .iter()
            .filter(move |f| seen.insert(f.context.context_ref.as_str()))
            .map(|f| f.context)
    }

    pub fn local_names(&self) -> HashSet<&'a str> {
        self.facts
            .iter()
            .map(|f| f.fact.local_name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FactOutcome {
    Value(Amount),
    Null(NullReason),
}

/// One canonical key's value for one period bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFact {
    pub canonical_key: String,
    pub period_bucket: PeriodBucket,
    pub outcome: FactOutcome,
    /// Tag that decided the outcome, if one did.
    pub source_tag: Option<String>,
    pub context_ref: Option<String>,
    pub unit_ref: Option<String>,
}

impl NormalizedFact {
    fn null(rule: &CanonicalKeyRule, bucket: PeriodBucket, reason: NullReason) -> Self {
        Self {
            canonical_key: rule.key.clone(),
            period_bucket: bucket,
            outcome: FactOutcome::Null(reason),
            source_tag: None,
            context_ref: None,
            unit_ref: None,
        }
    }

    pub fn value(&self) -> Option<Amount> {
        match self.outcome {
            FactOutcome::Value(amount) => Some(amount),
            FactOutcome::Null(_) => None,
        }
    }

    pub fn null_reason(&self) -> Option<NullReason> {
        match self.outcome {
            FactOutcome::Value(_) => None,
            FactOutcome::Null(reason) => Some(reason),
        }
    }
}

/// Canonical facts of one statement type for one bucket.
#[derive(Debug, Clone)]
pub struct StatementFacts {
    pub statement: StatementType,
    pub bucket: PeriodBucket,
    /// Instant date values were read at. Differs from the period anchor when
    /// the balance-sheet anchor was re-resolved.
    pub instant_date: NaiveDate,
    pub facts: BTreeMap<String, NormalizedFact>,
}

impl StatementFacts {
    pub fn get(&self, key: &str) -> Option<&NormalizedFact> {
        self.facts.get(key)
    }

    pub fn non_null_count(&self) -> usize {
        self.facts.values().filter(|f| f.value().is_some()).count()
    }
}

/// Every statement for one bucket.
#[derive(Debug, Clone)]
pub struct NormalizedPeriod {
    pub anchor: PeriodAnchor,
    pub statements: Vec<StatementFacts>,
}

impl NormalizedPeriod {
    pub fn fact(&self, key: &str) -> Option<&NormalizedFact> {
        self.statements.iter().find_map(|s| s.get(key))
    }

    pub fn statement(&self, statement: StatementType) -> Option<&StatementFacts> {
        self.statements.iter().find(|s| s.statement == statement)
    }
}

const STATEMENTS: [StatementType; 4] = [
    StatementType::BalanceSheet,
    StatementType::IncomeStatement,
    StatementType::CashFlow,
    StatementType::Dei,
];

pub struct FactNormalizer<'a> {
    taxonomy: &'a Taxonomy,
    facts: &'a FilingFacts<'a>,
    standard: AccountingStandard,
    filing_scope: ConsolidationScope,
    anchors: PeriodAnchors,
    profiles: Vec<String>,
}

impl<'a> FactNormalizer<'a> {
    /// `period_target` is the date the current period is declared to end on.
    pub fn new(
        taxonomy: &'a Taxonomy,
        facts: &'a FilingFacts<'a>,
        standard: AccountingStandard,
        filing_scope: ConsolidationScope,
        period_target: NaiveDate,
    ) -> Self {
        let anchors = PeriodAnchors::resolve(
            period_target,
            facts.contexts(),
            taxonomy.period_matching(),
        );

        let local_names = facts.local_names();
        let profiles: Vec<String> = taxonomy
            .profiles()
            .iter()
            .filter(|p| p.matches(&local_names))
            .map(|p| p.name.clone())
            .collect();
        if !profiles.is_empty() {
            log::info!("filer profiles matched: {:?}", profiles);
        }

        Self {
            taxonomy,
            facts,
            standard,
            filing_scope,
            anchors,
            profiles,
        }
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Normalizes every statement type for `bucket`.
    pub fn normalize_period(&self, bucket: PeriodBucket) -> Option<NormalizedPeriod> {
        let anchor = *self.anchors.get(bucket)?;
        let statements = STATEMENTS
            .iter()
            .filter_map(|statement| self.normalize_statement(*statement, bucket))
            .collect();
        Some(NormalizedPeriod { anchor, statements })
    }

    /// Normalizes one statement type for `bucket`. Balance sheets go through
    /// anchor re-resolution.
    pub fn normalize_statement(
        &self,
        statement: StatementType,
        bucket: PeriodBucket,
    ) -> Option<StatementFacts> {
        let anchor = self.anchors.get(bucket)?;
        let result = match statement {
            StatementType::BalanceSheet => self.balance_sheet(anchor),
            _ => self.extract_at(statement, anchor, anchor.date),
        };
        Some(result)
    }

    /// Runs every rule of `statement`, reading instant values at
    /// `instant_date` and duration values at the anchor's period.
    fn extract_at(
        &self,
        statement: StatementType,
        anchor: &PeriodAnchor,
        instant_date: NaiveDate,
    ) -> StatementFacts {
        let facts = self
            .taxonomy
            .rules_for(statement)
            .map(|rule| {
                (
                    rule.key.clone(),
                    self.normalize_rule(rule, anchor, instant_date),
                )
            })
            .collect();

        StatementFacts {
            statement,
            bucket: anchor.bucket,
            instant_date,
            facts,
        }
    }

    fn normalize_rule(
        &self,
        rule: &CanonicalKeyRule,
        anchor: &PeriodAnchor,
        instant_date: NaiveDate,
    ) -> NormalizedFact {
        let bucket = anchor.bucket;
        if !rule.has_candidates(self.standard) {
            return NormalizedFact::null(rule, bucket, NullReason::NotApplicableStandard);
        }

        let scope = rule.scope.resolve(self.filing_scope);
        let date = match rule.period_kind {
            PeriodKind::Instant => instant_date,
            PeriodKind::Duration => anchor.date,
        };

        // Both the pick and the null evidence see only facts of the rule's
        // own period kind.
        let matching: Vec<ResolvedFact> = self
            .in_scope_at(scope, date)
            .filter(|f| match (rule.period_kind, f.context.period) {
                (PeriodKind::Instant, ContextPeriod::Instant(_)) => true,
                (PeriodKind::Duration, ContextPeriod::Duration { start, .. }) => {
                    anchor.start.map_or(true, |s| s == start)
                }
                _ => false,
            })
            .collect();

        match picker::pick(rule.candidates(self.standard), rule.value_type, &matching) {
            Pick::Value { amount, fact } => NormalizedFact {
                canonical_key: rule.key.clone(),
                period_bucket: bucket,
                outcome: FactOutcome::Value(amount),
                source_tag: Some(fact.fact.tag_name.clone()),
                context_ref: Some(fact.context.context_ref.clone()),
                unit_ref: fact.fact.unit_ref.clone(),
            },
            Pick::Nil(fact) => NormalizedFact {
                canonical_key: rule.key.clone(),
                period_bucket: bucket,
                outcome: FactOutcome::Null(NullReason::DisclosedNil),
                source_tag: Some(fact.fact.tag_name.clone()),
                context_ref: Some(fact.context.context_ref.clone()),
                unit_ref: None,
            },
            Pick::Missing => {
                let reason = nulls::classify(
                    self.taxonomy,
                    rule,
                    self.standard,
                    &self.profiles,
                    &matching,
                );
                NormalizedFact::null(rule, bucket, reason)
            }
        }
    }

    /// Non-dimensional facts reporting `scope` whose context date is `date`,
    /// in document order.
    fn in_scope_at(
        &self,
        scope: ConsolidationScope,
        date: NaiveDate,
    ) -> impl Iterator<Item = ResolvedFact<'a>> + '_ {
        let filing_scope = self.filing_scope;
        self.facts.iter().copied().filter(move |f| {
            !f.context.is_dimensional()
                && f.context.effective_scope(filing_scope) == scope
                && f.context.date() == Some(date)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(xml: &str, standard: AccountingStandard) -> NormalizedPeriod {
        let taxonomy = Taxonomy::builtin().unwrap();
        let instance = Instance::parse(xml).unwrap();
        let facts = FilingFacts::join(&instance);
        let target = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let normalizer = FactNormalizer::new(
            &taxonomy,
            &facts,
            standard,
            ConsolidationScope::Consolidated,
            target,
        );
        normalizer.normalize_period(PeriodBucket::CurrentYear).unwrap()
    }

    fn document(body: &str) -> String {
        format!(
            r#"<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
                 xmlns:xbrldi="http://xbrl.org/2006/xbrldi"
                 xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                 xmlns:jppfs_cor="http://disclosure.edinet-fsa.go.jp/taxonomy/jppfs/2024-11-01/jppfs_cor"
                 xmlns:jpcrp_cor="http://disclosure.edinet-fsa.go.jp/taxonomy/jpcrp/2024-11-01/jpcrp_cor"
                 xmlns:jpigp_cor="http://disclosure.edinet-fsa.go.jp/taxonomy/jpigp/2024-11-01/jpigp_cor">
  <xbrli:context id="CurrentYearDuration">
    <xbrli:entity><xbrli:identifier scheme="x">E00001-000</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:startDate>2024-04-01</xbrli:startDate><xbrli:endDate>2025-03-31</xbrli:endDate></xbrli:period>
  </xbrli:context>
  <xbrli:context id="CurrentYearDuration_NonConsolidatedMember">
    <xbrli:entity><xbrli:identifier scheme="x">E00001-000</xbrli:identifier>
      <xbrli:segment><xbrldi:explicitMember dimension="jppfs_cor:ConsolidatedOrNonConsolidatedAxis">jppfs_cor:NonConsolidatedMember</xbrldi:explicitMember></xbrli:segment>
    </xbrli:entity>
    <xbrli:period><xbrli:startDate>2024-04-01</xbrli:startDate><xbrli:endDate>2025-03-31</xbrli:endDate></xbrli:period>
  </xbrli:context>
  <xbrli:context id="CurrentYearDuration_SegmentMember">
    <xbrli:entity><xbrli:identifier scheme="x">E00001-000</xbrli:identifier>
      <xbrli:segment><xbrldi:explicitMember dimension="jpcrp_cor:OperatingSegmentsAxis">jpcrp_cor:ReportableSegmentsMember</xbrldi:explicitMember></xbrli:segment>
    </xbrli:entity>
    <xbrli:period><xbrli:startDate>2024-04-01</xbrli:startDate><xbrli:endDate>2025-03-31</xbrli:endDate></xbrli:period>
  </xbrli:context>
  <xbrli:context id="CurrentYearInstant">
    <xbrli:entity><xbrli:identifier scheme="x">E00001-000</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:instant>2025-03-31</xbrli:instant></xbrli:period>
  </xbrli:context>
  <xbrli:context id="Prior1YearDuration">
    <xbrli:entity><xbrli:identifier scheme="x">E00001-000</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:startDate>2023-04-01</xbrli:startDate><xbrli:endDate>2024-03-31</xbrli:endDate></xbrli:period>
  </xbrli:context>
  {}
</xbrli:xbrl>"#,
            body
        )
    }

    #[test]
    fn test_jgaap_net_sales() {
        let xml = document(
            r#"<jppfs_cor:NetSales contextRef="CurrentYearDuration" unitRef="JPY" decimals="-6">100000</jppfs_cor:NetSales>"#,
        );
        let period = normalize(&xml, AccountingStandard::Jgaap);
        let net_sales = period.fact("net_sales").unwrap();
        assert_eq!(net_sales.value(), Some(Amount::Integer(100000)));
        assert_eq!(net_sales.source_tag.as_deref(), Some("jppfs_cor:NetSales"));
    }

    #[test]
    fn test_ifrs_nil_revenue_is_disclosed_nil() {
        let xml = document(
            r#"<jpigp_cor:Revenue contextRef="CurrentYearDuration" unitRef="JPY" xsi:nil="true"/>
               <jpigp_cor:RevenueIFRSSummaryOfBusinessResults contextRef="CurrentYearDuration" unitRef="JPY" decimals="-6">100000</jpigp_cor:RevenueIFRSSummaryOfBusinessResults>"#,
        );
        let period = normalize(&xml, AccountingStandard::Ifrs);
        let net_sales = period.fact("net_sales").unwrap();
        assert_eq!(net_sales.value(), None);
        assert_eq!(net_sales.null_reason(), Some(NullReason::DisclosedNil));
    }

    #[test]
    fn test_scope_and_segments_are_not_mixed() {
        let xml = document(
            r#"<jppfs_cor:NetSales contextRef="CurrentYearDuration_NonConsolidatedMember" unitRef="JPY" decimals="-6">700</jppfs_cor:NetSales>
               <jppfs_cor:NetSales contextRef="CurrentYearDuration_SegmentMember" unitRef="JPY" decimals="-6">300</jppfs_cor:NetSales>"#,
        );
        let period = normalize(&xml, AccountingStandard::Jgaap);
        let net_sales = period.fact("net_sales").unwrap();
        assert_eq!(net_sales.value(), None);
        assert_eq!(net_sales.null_reason(), Some(NullReason::NotApplicableEconomic));
    }

    #[test]
    fn test_non_consolidated_rule_scope() {
        let xml = document(
            r#"<jpcrp_cor:DividendPaidPerShareSummaryOfBusinessResults contextRef="CurrentYearDuration_NonConsolidatedMember" unitRef="JPYPerShares" decimals="2">45.00</jpcrp_cor:DividendPaidPerShareSummaryOfBusinessResults>"#,
        );
        let period = normalize(&xml, AccountingStandard::Jgaap);
        assert_eq!(
            period.fact("dividends_per_share").unwrap().value(),
            Some(Amount::Decimal(45.0))
        );
    }

    #[test]
    fn test_missing_standard_candidates() {
        let xml = document("");
        let period = normalize(&xml, AccountingStandard::Ifrs);
        assert_eq!(
            period.fact("ordinary_income").unwrap().null_reason(),
            Some(NullReason::NotApplicableStandard)
        );
    }

    #[test]
    fn test_unresolved_context_is_reported() {
        let xml = document(
            r#"<jppfs_cor:NetSales contextRef="NoSuchContext" unitRef="JPY" decimals="-6">1</jppfs_cor:NetSales>"#,
        );
        let instance = Instance::parse(&xml).unwrap();
        let facts = FilingFacts::join(&instance);
        assert!(facts.is_empty());
        assert_eq!(
            facts.unresolved(),
            &[UnresolvedContext {
                tag_name: "jppfs_cor:NetSales".to_string(),
                context_ref: "NoSuchContext".to_string(),
            }]
        );
    }

    #[test]
    fn test_instant_facts_are_not_evidence_for_flows() {
        let xml = document(
            r#"<jppfs_cor:AccumulatedDepreciationBuildings contextRef="CurrentYearInstant" unitRef="JPY" decimals="-6">-9000</jppfs_cor:AccumulatedDepreciationBuildings>
               <jppfs_cor:NetSales contextRef="CurrentYearInstant" unitRef="JPY" decimals="-6">100000</jppfs_cor:NetSales>"#,
        );
        let period = normalize(&xml, AccountingStandard::Jgaap);
        assert_eq!(
            period.fact("depreciation").unwrap().null_reason(),
            Some(NullReason::NotApplicableEconomic)
        );
        assert_eq!(
            period.fact("net_sales").unwrap().null_reason(),
            Some(NullReason::NotApplicableEconomic)
        );
    }

    #[test]
    fn test_other_key_total_is_not_a_gap() {
        let xml = document(
            r#"<jppfs_cor:LiabilitiesAndNetAssets contextRef="CurrentYearInstant" unitRef="JPY" decimals="-6">5000</jppfs_cor:LiabilitiesAndNetAssets>"#,
        );
        let period = normalize(&xml, AccountingStandard::Jgaap);
        assert_eq!(
            period.fact("liabilities_and_net_assets").unwrap().value(),
            Some(Amount::Integer(5000))
        );
        assert_eq!(
            period.fact("net_assets").unwrap().null_reason(),
            Some(NullReason::NotApplicableEconomic)
        );
    }

    #[test]
    fn test_prior_period_presence_is_not_a_current_gap() {
        let xml = document(
            r#"<jppfs_cor:DepreciationAndAmortizationOpeCF contextRef="Prior1YearDuration" unitRef="JPY" decimals="-6">4000</jppfs_cor:DepreciationAndAmortizationOpeCF>"#,
        );
        let taxonomy = Taxonomy::builtin().unwrap();
        let instance = Instance::parse(&xml).unwrap();
        let facts = FilingFacts::join(&instance);
        let normalizer = FactNormalizer::new(
            &taxonomy,
            &facts,
            AccountingStandard::Jgaap,
            ConsolidationScope::Consolidated,
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        );

        let current = normalizer.normalize_period(PeriodBucket::CurrentYear).unwrap();
        assert_eq!(
            current.fact("depreciation").unwrap().null_reason(),
            Some(NullReason::NotApplicableEconomic)
        );
        let prior = normalizer.normalize_period(PeriodBucket::PriorYear).unwrap();
        assert_eq!(
            prior.fact("depreciation").unwrap().value(),
            Some(Amount::Integer(4000))
        );
    }
}
