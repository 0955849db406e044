use serde::Serialize;

use crate::domain::ResultRecord;

const PERCENT: f64 = 100.0;
const MILLIS_PER_SECOND: f64 = 1000.0;

/// Aggregate statistics derived from a set of result records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate_percent: f64,
    pub avg_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub p90_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub requests_per_second: f64,
    pub received_bytes: u64,
    pub sent_bytes: u64,
}

/// Integer accumulators shared by the batch and streaming paths so both
/// finish through the same arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Totals {
    pub(super) total: u64,
    pub(super) successful: u64,
    pub(super) elapsed_sum_ms: u128,
    pub(super) min_ms: u64,
    pub(super) max_ms: u64,
    pub(super) first_start_ms: i64,
    pub(super) last_end_ms: i64,
    pub(super) received_bytes: u64,
    pub(super) sent_bytes: u64,
}

impl Totals {
    pub(super) fn add(&mut self, record: &ResultRecord) {
        let elapsed = record.elapsed_ms();
        if self.total == 0 {
            self.min_ms = elapsed;
            self.max_ms = elapsed;
            self.first_start_ms = record.timestamp_ms();
            self.last_end_ms = record.end_ms();
        } else {
            self.min_ms = self.min_ms.min(elapsed);
            self.max_ms = self.max_ms.max(elapsed);
            self.first_start_ms = self.first_start_ms.min(record.timestamp_ms());
            self.last_end_ms = self.last_end_ms.max(record.end_ms());
        }
        self.total = self.total.saturating_add(1);
        if record.success() {
            self.successful = self.successful.saturating_add(1);
        }
        self.elapsed_sum_ms = self.elapsed_sum_ms.saturating_add(u128::from(elapsed));
        self.received_bytes = self.received_bytes.saturating_add(record.bytes());
        self.sent_bytes = self.sent_bytes.saturating_add(record.sent_bytes());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Percentiles {
    pub(super) p90: u64,
    pub(super) p95: u64,
    pub(super) p99: u64,
}

impl MetricsSnapshot {
    pub(super) fn from_totals(totals: &Totals, percentiles: Percentiles) -> Self {
        if totals.total == 0 {
            return Self::default();
        }
        let span_ms = totals
            .last_end_ms
            .saturating_sub(totals.first_start_ms)
            .max(1);
        Self {
            total_requests: totals.total,
            successful_requests: totals.successful,
            failed_requests: totals.total.saturating_sub(totals.successful),
            success_rate_percent: success_rate_percent(totals.successful, totals.total),
            avg_ms: ratio(totals.elapsed_sum_ms, u128::from(totals.total)),
            min_ms: totals.min_ms,
            max_ms: totals.max_ms,
            p90_ms: percentiles.p90,
            p95_ms: percentiles.p95,
            p99_ms: percentiles.p99,
            requests_per_second: per_second(totals.total, span_ms),
            received_bytes: totals.received_bytes,
            sent_bytes: totals.sent_bytes,
        }
    }

    /// True when `success_rate_percent` meets or exceeds `threshold_percent`.
    #[must_use]
    pub fn meets(&self, threshold_percent: f64) -> bool {
        self.success_rate_percent >= threshold_percent
    }
}

/// `100 * successful / total`, or 0 when `total` is 0.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "Success rate is reported as a fractional percentage"
)]
pub fn success_rate_percent(successful: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (successful as f64 * PERCENT) / total as f64
}

#[expect(
    clippy::float_arithmetic,
    reason = "Averages are reported with fractional milliseconds"
)]
fn ratio(numerator: u128, denominator: u128) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

#[expect(
    clippy::float_arithmetic,
    reason = "Throughput is reported with fractional requests per second"
)]
fn per_second(count: u64, span_ms: i64) -> f64 {
    (count as f64 * MILLIS_PER_SECOND) / span_ms as f64
}
