use crate::core::{Amount, ValueType};
use crate::taxonomy::TagName;

use super::ResolvedFact;

/// Outcome of walking a rule's candidate list.
#[derive(Debug, Clone, Copy)]
pub enum Pick<'a> {
    Value { amount: Amount, fact: ResolvedFact<'a> },
    /// The highest-priority present candidate was explicitly nil.
    Nil(ResolvedFact<'a>),
    Missing,
}

/// Walks `candidates` in priority order over `facts` (already narrowed to one
/// period, scope and period kind). The first candidate present decides,
/// except that a value which does not parse as `value_type` passes on to the
/// next candidate. A nil winner stops the walk.
pub fn pick<'a>(
    candidates: &[TagName],
    value_type: ValueType,
    facts: &[ResolvedFact<'a>],
) -> Pick<'a> {
    for candidate in candidates {
        let Some(found) = facts
            .iter()
            .find(|f| candidate.matches(&f.fact.prefix, &f.fact.local_name))
        else {
            continue;
        };

        if found.fact.is_nil {
            log::debug!("{} is nil in {}", found.fact.tag_name, found.context.context_ref);
            return Pick::Nil(*found);
        }

        match found
            .fact
            .value
            .as_deref()
            .and_then(|raw| Amount::parse(raw, value_type))
        {
            Some(amount) => {
                return Pick::Value {
                    amount,
                    fact: *found,
                }
            }
            None => log::debug!(
                "{} in {} is not a {:?} value: {:?}",
                found.fact.tag_name,
                found.context.context_ref,
                value_type,
                found.fact.value
            ),
        }
    }
    Pick::Missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xbrl::{ContextDescriptor, ContextPeriod, RawFact};
    use chrono::NaiveDate;

    fn context() -> ContextDescriptor {
        ContextDescriptor {
            context_ref: "CurrentYearDuration".to_string(),
            entity_identifier: None,
            period: ContextPeriod::Duration {
                start: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            },
            consolidation_scope: None,
            qualifiers: Vec::new(),
        }
    }

    fn fact(prefix: &str, local: &str, value: Option<&str>) -> RawFact {
        RawFact {
            tag_name: format!("{}:{}", prefix, local),
            prefix: prefix.to_string(),
            local_name: local.to_string(),
            context_ref: "CurrentYearDuration".to_string(),
            value: value.map(str::to_string),
            is_nil: value.is_none(),
            decimals: None,
            unit_ref: Some("JPY".to_string()),
        }
    }

    fn resolved<'a>(facts: &'a [RawFact], context: &'a ContextDescriptor) -> Vec<ResolvedFact<'a>> {
        facts
            .iter()
            .enumerate()
            .map(|(index, fact)| ResolvedFact {
                index,
                fact,
                context,
            })
            .collect()
    }

    fn tags(names: &[&str]) -> Vec<TagName> {
        names.iter().map(|n| TagName::parse(n)).collect()
    }

    #[test]
    fn test_first_candidate_wins() {
        let ctx = context();
        let raw = vec![
            fact("jppfs_cor", "OperatingRevenue1", Some("500")),
            fact("jppfs_cor", "NetSales", Some("100000")),
        ];
        let facts = resolved(&raw, &ctx);
        match pick(&tags(&["NetSales", "OperatingRevenue1"]), ValueType::Integer, &facts) {
            Pick::Value { amount, fact } => {
                assert_eq!(amount, Amount::Integer(100000));
                assert_eq!(fact.fact.local_name, "NetSales");
            }
            other => panic!("unexpected pick {:?}", other),
        }
    }

    #[test]
    fn test_nil_suppresses_fallback() {
        let ctx = context();
        let raw = vec![
            fact("jpigp_cor", "RevenueIFRS", None),
            fact("jpigp_cor", "Revenue", Some("100000")),
        ];
        let facts = resolved(&raw, &ctx);
        assert!(matches!(
            pick(&tags(&["RevenueIFRS", "Revenue"]), ValueType::Integer, &facts),
            Pick::Nil(f) if f.fact.local_name == "RevenueIFRS"
        ));
    }

    #[test]
    fn test_unparseable_falls_through() {
        let ctx = context();
        let raw = vec![
            fact("jpcrp_cor", "DividendPaidPerShareSummaryOfBusinessResults", Some("－")),
            fact("jpcrp_cor", "DividendPerShare", Some("25.00")),
        ];
        let facts = resolved(&raw, &ctx);
        let candidates = tags(&["DividendPaidPerShareSummaryOfBusinessResults", "DividendPerShare"]);
        assert!(matches!(
            pick(&candidates, ValueType::Decimal, &facts),
            Pick::Value { amount: Amount::Decimal(v), .. } if v == 25.0
        ));
    }

    #[test]
    fn test_qualified_candidate_checks_prefix() {
        let ctx = context();
        let raw = vec![fact("jpigp_cor", "Revenue", Some("1"))];
        let facts = resolved(&raw, &ctx);
        assert!(matches!(
            pick(&tags(&["ifrs-full:Revenue"]), ValueType::Integer, &facts),
            Pick::Missing
        ));
    }
}
