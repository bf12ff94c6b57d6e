//! Balance-sheet anchor re-resolution.
//!
//! Balance-sheet values are first read at the end date of the bucket's
//! duration period. When none of the anchor totals resolve there, the
//! instant contexts actually carrying an anchor total are tried instead and
//! the whole statement is re-read at the first date that works. The result
//! always comes from a single date.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::core::StatementType;
use crate::xbrl::ContextPeriod;

use super::{FactNormalizer, PeriodAnchor, StatementFacts};

impl<'a> FactNormalizer<'a> {
    pub(super) fn balance_sheet(&self, anchor: &PeriodAnchor) -> StatementFacts {
        let first_pass = self.extract_at(StatementType::BalanceSheet, anchor, anchor.date);
        if self.anchor_resolved(&first_pass) {
            return first_pass;
        }

        for date in self.anchor_dates(anchor) {
            let corrected = self.extract_at(StatementType::BalanceSheet, anchor, date);
            if self.anchor_resolved(&corrected) {
                log::info!(
                    "{} balance sheet re-anchored from {} to {}",
                    anchor.bucket,
                    anchor.date,
                    date
                );
                return corrected;
            }
        }

        log::debug!("{} balance sheet has no anchor total", anchor.bucket);
        first_pass
    }

    fn anchor_resolved(&self, statement: &StatementFacts) -> bool {
        self.taxonomy
            .anchor_rules()
            .any(|rule| statement.get(&rule.key).and_then(|f| f.value()).is_some())
    }

    /// Instant dates, other than the anchor's own, where an anchor total is
    /// disclosed with a value in the balance sheet's scope. Closest to the
    /// anchor date first, later dates winning ties, then document order.
    /// Dates anchoring other buckets are never borrowed.
    fn anchor_dates(&self, anchor: &PeriodAnchor) -> Vec<NaiveDate> {
        let max_drift = self.taxonomy.period_matching().max_anchor_drift_days;
        let taken = self.anchors.other_dates(anchor.bucket);

        // date -> first document position of an anchor fact at that date
        let mut first_seen: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for rule in self.taxonomy.anchor_rules() {
            let scope = rule.scope.resolve(self.filing_scope);
            let candidates = rule.candidates(self.standard);
            for f in self.facts.iter() {
                let ContextPeriod::Instant(date) = f.context.period else {
                    continue;
                };
                let usable = date != anchor.date
                    && !taken.contains(&date)
                    && (date - anchor.date).num_days().abs() <= max_drift
                    && !f.context.is_dimensional()
                    && f.context.effective_scope(self.filing_scope) == scope
                    && f.fact.has_value()
                    && candidates
                        .iter()
                        .any(|c| c.matches(&f.fact.prefix, &f.fact.local_name));
                if usable {
                    first_seen
                        .entry(date)
                        .and_modify(|i| *i = (*i).min(f.index))
                        .or_insert(f.index);
                }
            }
        }

        let mut dates: Vec<(NaiveDate, usize)> = first_seen.into_iter().collect();
        dates.sort_by(|(a, ia), (b, ib)| {
            let da = (*a - anchor.date).num_days().abs();
            let db = (*b - anchor.date).num_days().abs();
            da.cmp(&db).then(b.cmp(a)).then(ia.cmp(ib))
        });
        dates.into_iter().map(|(date, _)| date).collect()
    }
}
