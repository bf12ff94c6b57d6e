//! Null classification for canonical keys that produced no value.
//!
//! Evidence is only ever taken from facts dated at the bucket being
//! classified, so a tag seen in an earlier period never turns a current
//! null into an extraction gap.

use crate::core::{AccountingStandard, NullReason};
use crate::taxonomy::{CanonicalKeyRule, Taxonomy};

use super::ResolvedFact;

/// `facts` are the in-scope, non-dimensional facts of the rule's period kind
/// at the bucket's date. `profiles` are the filer profiles that matched this
/// document.
///
/// A fact counts as evidence when it is one of the rule's candidates, or when
/// its local name starts with a gap hint and no other rule lists it as a
/// candidate.
pub fn classify(
    taxonomy: &Taxonomy,
    rule: &CanonicalKeyRule,
    standard: AccountingStandard,
    profiles: &[String],
    facts: &[ResolvedFact],
) -> NullReason {
    if !rule.has_candidates(standard) {
        return NullReason::NotApplicableStandard;
    }

    if let Some(profile) = rule
        .not_applicable_profiles
        .iter()
        .find(|p| profiles.contains(p))
    {
        log::debug!("{} not applicable to {} filers", rule.key, profile);
        return NullReason::NotApplicableStandard;
    }

    let candidates = rule.candidates(standard);
    let evidence: Vec<&ResolvedFact> = facts
        .iter()
        .filter(|f| {
            let name = f.fact.local_name.as_str();
            if candidates.iter().any(|c| c.local() == name) {
                return true;
            }
            rule.gap_hints.iter().any(|hint| name.starts_with(hint.as_str()))
                && !taxonomy.is_claimed_elsewhere(&rule.key, name)
        })
        .collect();

    if let Some(found) = evidence.iter().find(|f| f.fact.has_value()) {
        log::debug!(
            "{}: {} present but not mapped",
            rule.key,
            found.fact.tag_name
        );
        NullReason::ExtractionGap
    } else if evidence.iter().any(|f| f.fact.is_nil) {
        NullReason::DisclosedNil
    } else {
        NullReason::NotApplicableEconomic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Taxonomy;
    use crate::xbrl::{ContextDescriptor, ContextPeriod, RawFact};
    use chrono::NaiveDate;

    fn context() -> ContextDescriptor {
        ContextDescriptor {
            context_ref: "CurrentYearInstant".to_string(),
            entity_identifier: None,
            period: ContextPeriod::Instant(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()),
            consolidation_scope: None,
            qualifiers: Vec::new(),
        }
    }

    fn fact(local: &str, value: Option<&str>) -> RawFact {
        RawFact {
            tag_name: format!("jppfs_cor:{}", local),
            prefix: "jppfs_cor".to_string(),
            local_name: local.to_string(),
            context_ref: "CurrentYearInstant".to_string(),
            value: value.map(str::to_string),
            is_nil: value.is_none(),
            decimals: None,
            unit_ref: None,
        }
    }

    fn resolved<'a>(raw: &'a [RawFact], context: &'a ContextDescriptor) -> Vec<ResolvedFact<'a>> {
        raw.iter()
            .enumerate()
            .map(|(index, fact)| ResolvedFact {
                index,
                fact,
                context,
            })
            .collect()
    }

    #[test]
    fn test_no_candidates_for_standard() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let rule = taxonomy.rule("ordinary_income").unwrap();
        let ctx = context();
        let raw = vec![fact("OrdinaryIncome", Some("100"))];
        let reason = classify(
            &taxonomy,
            rule,
            AccountingStandard::Ifrs,
            &[],
            &resolved(&raw, &ctx),
        );
        assert_eq!(reason, NullReason::NotApplicableStandard);
    }

    #[test]
    fn test_profile_makes_key_not_applicable() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let rule = taxonomy.rule("net_sales").unwrap();
        let reason = classify(
            &taxonomy,
            rule,
            AccountingStandard::Jgaap,
            &["bank".to_string()],
            &[],
        );
        assert_eq!(reason, NullReason::NotApplicableStandard);
    }

    #[test]
    fn test_hinted_tag_with_value_is_gap() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let rule = taxonomy.rule("short_term_borrowings").unwrap();
        let ctx = context();
        let raw = vec![fact("ShortTermBorrowingsFromBanks", Some("3000"))];
        let reason = classify(
            &taxonomy,
            rule,
            AccountingStandard::Jgaap,
            &[],
            &resolved(&raw, &ctx),
        );
        assert_eq!(reason, NullReason::ExtractionGap);
    }

    #[test]
    fn test_nil_evidence_is_disclosed_nil() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let rule = taxonomy.rule("commercial_papers").unwrap();
        let ctx = context();
        let raw = vec![fact("CommercialPaperIssued", None)];
        let reason = classify(
            &taxonomy,
            rule,
            AccountingStandard::Jgaap,
            &[],
            &resolved(&raw, &ctx),
        );
        assert_eq!(reason, NullReason::DisclosedNil);
    }

    #[test]
    fn test_absent_is_not_applicable_economic() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let rule = taxonomy.rule("bonds_payable").unwrap();
        let ctx = context();
        let raw = vec![fact("Assets", Some("1000"))];
        let reason = classify(
            &taxonomy,
            rule,
            AccountingStandard::Jgaap,
            &[],
            &resolved(&raw, &ctx),
        );
        assert_eq!(reason, NullReason::NotApplicableEconomic);
    }

    #[test]
    fn test_other_rules_candidate_is_not_evidence() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let rule = taxonomy.rule("net_assets").unwrap();
        let ctx = context();
        let raw = vec![fact("LiabilitiesAndNetAssets", Some("5000"))];
        let reason = classify(
            &taxonomy,
            rule,
            AccountingStandard::Jgaap,
            &[],
            &resolved(&raw, &ctx),
        );
        assert_eq!(reason, NullReason::NotApplicableEconomic);
    }

    #[test]
    fn test_hint_must_prefix_the_name() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let rule = taxonomy.rule("operating_income").unwrap();
        let ctx = context();
        let raw = vec![fact("NonOperatingIncome", Some("800"))];
        let reason = classify(
            &taxonomy,
            rule,
            AccountingStandard::Jgaap,
            &[],
            &resolved(&raw, &ctx),
        );
        assert_eq!(reason, NullReason::NotApplicableEconomic);

        let raw = vec![fact("OperatingIncomeLoss", Some("800"))];
        let reason = classify(
            &taxonomy,
            rule,
            AccountingStandard::Jgaap,
            &[],
            &resolved(&raw, &ctx),
        );
        assert_eq!(reason, NullReason::ExtractionGap);
    }
}
