use crate::domain::ResultRecord;

use super::percentile::percentiles;
use super::snapshot::{MetricsSnapshot, Totals};

/// Running aggregate that can be inspected at any point mid-run.
///
/// Elapsed times are kept in a sorted buffer so percentiles are exact, not
/// estimated, and agree with [`super::snapshot`] on the same records.
#[derive(Debug, Clone, Default)]
pub struct StreamingAggregator {
    totals: Totals,
    sorted_elapsed: Vec<u64>,
}

impl StreamingAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: &ResultRecord) {
        self.totals.add(record);
        let elapsed = record.elapsed_ms();
        let position = self.sorted_elapsed.partition_point(|value| *value <= elapsed);
        self.sorted_elapsed.insert(position, elapsed);
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.totals.total
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::from_totals(&self.totals, percentiles(&self.sorted_elapsed))
    }
}
