use std::collections::BTreeMap;

use crate::domain::ResultRecord;

use super::percentile::percentiles;
use super::snapshot::{MetricsSnapshot, Totals};

/// Computes the snapshot of a complete record set in one pass plus one sort.
#[must_use]
pub fn snapshot<'rec, I>(records: I) -> MetricsSnapshot
where
    I: IntoIterator<Item = &'rec ResultRecord>,
{
    let mut totals = Totals::default();
    let mut elapsed = Vec::new();
    for record in records {
        totals.add(record);
        elapsed.push(record.elapsed_ms());
    }
    elapsed.sort_unstable();
    MetricsSnapshot::from_totals(&totals, percentiles(&elapsed))
}

/// One snapshot per request label, ordered by label.
#[must_use]
pub fn by_label(records: &[ResultRecord]) -> Vec<(String, MetricsSnapshot)> {
    group_by(records, ResultRecord::request_name)
}

/// One snapshot per scenario, ordered by scenario name.
#[must_use]
pub fn by_scenario(records: &[ResultRecord]) -> Vec<(String, MetricsSnapshot)> {
    group_by(records, ResultRecord::scenario_name)
}

fn group_by<F>(records: &[ResultRecord], key: F) -> Vec<(String, MetricsSnapshot)>
where
    F: Fn(&ResultRecord) -> &str,
{
    let mut groups: BTreeMap<&str, Vec<&ResultRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    groups
        .into_iter()
        .map(|(name, group)| (name.to_owned(), snapshot(group)))
        .collect()
}
