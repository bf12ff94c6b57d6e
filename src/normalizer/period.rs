//! Period anchoring: which context dates stand for the current, prior and
//! prior-prior reporting periods of one filing.

use chrono::{Months, NaiveDate};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

use crate::core::PeriodBucket;
use crate::taxonomy::PeriodMatching;
use crate::xbrl::{ContextDescriptor, ContextPeriod};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodAnchor {
    pub bucket: PeriodBucket,
    /// End date of the bucket's duration contexts; also the instant date
    /// balance-sheet values are first looked up at.
    pub date: NaiveDate,
    /// Start of the longest duration ending on `date`, if any.
    pub start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct PeriodAnchors {
    anchors: BTreeMap<PeriodBucket, PeriodAnchor>,
}

impl PeriodAnchors {
    /// Anchors buckets on duration end dates. The current period is the end
    /// date closest to `target` (ties go to the later date); each earlier
    /// bucket is the end date closest to one year before the next one.
    /// Without a usable duration, a bucket falls back to the expected date
    /// itself with no start.
    pub fn resolve<'a>(
        target: NaiveDate,
        contexts: impl IntoIterator<Item = &'a ContextDescriptor>,
        matching: PeriodMatching,
    ) -> Self {
        // end date -> earliest start among durations ending there
        let mut durations: BTreeMap<NaiveDate, NaiveDate> = BTreeMap::new();
        for context in contexts {
            if context.is_dimensional() {
                continue;
            }
            if let ContextPeriod::Duration { start, end } = context.period {
                durations
                    .entry(end)
                    .and_modify(|s| *s = (*s).min(start))
                    .or_insert(start);
            }
        }

        let mut anchors = BTreeMap::new();
        let mut expected = target;
        let mut upper_bound: Option<NaiveDate> = None;

        for bucket in PeriodBucket::iter() {
            let chosen = closest_date(
                durations.keys().copied(),
                expected,
                matching.max_year_end_drift_days,
                upper_bound,
            );
            let anchor = match chosen {
                Some(date) => PeriodAnchor {
                    bucket,
                    date,
                    start: durations.get(&date).copied(),
                },
                None => {
                    log::debug!("no duration context near {} for {}", expected, bucket);
                    PeriodAnchor {
                        bucket,
                        date: expected,
                        start: None,
                    }
                }
            };
            anchors.insert(bucket, anchor);

            upper_bound = Some(anchor.date);
            match anchor.date.checked_sub_months(Months::new(12)) {
                Some(previous) => expected = previous,
                None => break,
            }
        }

        Self { anchors }
    }

    pub fn get(&self, bucket: PeriodBucket) -> Option<&PeriodAnchor> {
        self.anchors.get(&bucket)
    }

    /// Anchor dates of every bucket except `bucket`.
    pub fn other_dates(&self, bucket: PeriodBucket) -> Vec<NaiveDate> {
        self.anchors
            .values()
            .filter(|a| a.bucket != bucket)
            .map(|a| a.date)
            .collect()
    }
}

/// Closest date to `expected` within `max_drift` days, strictly before
/// `before` when given. Ties go to the later date.
pub fn closest_date(
    dates: impl IntoIterator<Item = NaiveDate>,
    expected: NaiveDate,
    max_drift: i64,
    before: Option<NaiveDate>,
) -> Option<NaiveDate> {
    dates
        .into_iter()
        .filter(|d| before.map_or(true, |b| *d < b))
        .filter(|d| (*d - expected).num_days().abs() <= max_drift)
        .min_by(|a, b| {
            let da = (*a - expected).num_days().abs();
            let db = (*b - expected).num_days().abs();
            da.cmp(&db).then(b.cmp(a))
        })
}
