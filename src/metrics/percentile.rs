const PERCENT_DIVISOR: u64 = 100;
const CEIL_OFFSET: u64 = 99;

pub(super) const P90: u64 = 90;
pub(super) const P95: u64 = 95;
pub(super) const P99: u64 = 99;

/// Nearest-rank index `ceil(p * n) - 1`, clamped to `[0, n - 1]`, for `p`
/// given in whole percent.
#[must_use]
pub fn percentile_index(len: usize, percentile: u64) -> usize {
    let n = u64::try_from(len).unwrap_or(u64::MAX);
    let rank = percentile
        .saturating_mul(n)
        .saturating_add(CEIL_OFFSET)
        .checked_div(PERCENT_DIVISOR)
        .unwrap_or(0);
    let index = usize::try_from(rank.saturating_sub(1)).unwrap_or(usize::MAX);
    index.min(len.saturating_sub(1))
}

/// Value at `percentile` of an ascending slice; 0 when empty.
#[must_use]
pub fn percentile(sorted: &[u64], percentile: u64) -> u64 {
    sorted
        .get(percentile_index(sorted.len(), percentile))
        .copied()
        .unwrap_or(0)
}

pub(super) fn percentiles(sorted: &[u64]) -> super::snapshot::Percentiles {
    super::snapshot::Percentiles {
        p90: percentile(sorted, P90),
        p95: percentile(sorted, P95),
        p99: percentile(sorted, P99),
    }
}
