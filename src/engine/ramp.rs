use std::time::Duration;

/// Start delay of worker `index` (0-based) out of `threads`:
/// `ramp_up * index / threads`, computed in whole milliseconds so the last
/// worker starts strictly before `ramp_up` has elapsed.
#[must_use]
pub fn start_delay(ramp_up: Duration, index: u64, threads: u64) -> Duration {
    let ramp_ms = ramp_up.as_millis();
    let delay_ms = ramp_ms
        .checked_mul(u128::from(index))
        .and_then(|scaled| scaled.checked_div(u128::from(threads)))
        .unwrap_or(0);
    Duration::from_millis(u64::try_from(delay_ms).unwrap_or(u64::MAX))
}
