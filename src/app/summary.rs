use crate::metrics::{MetricsSnapshot, success_rate_percent};
use crate::sinks::{LabelSummary, RunSummary};

const LABEL_WIDTH: usize = 24;

/// Console rendering of a summary: overall figures, then one row per label
/// in the JMeter aggregate-report layout.
#[must_use]
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let overall = &summary.overall;
    let mut lines = Vec::new();
    if let Some(elapsed_ms) = summary.elapsed_ms {
        lines.push(format!("Duration: {}ms", elapsed_ms));
    }
    lines.push(format!("Total Requests: {}", overall.total_requests));
    lines.push(format!(
        "Successful: {} ({:.2}%)",
        overall.successful_requests, overall.success_rate_percent
    ));
    lines.push(format!("Failed: {}", overall.failed_requests));
    lines.push(format!(
        "Latency avg/min/max: {:.2}ms / {}ms / {}ms",
        overall.avg_ms, overall.min_ms, overall.max_ms
    ));
    lines.push(format!(
        "Latency p90/p95/p99: {}ms / {}ms / {}ms",
        overall.p90_ms, overall.p95_ms, overall.p99_ms
    ));
    lines.push(format!("Throughput: {:.2} req/s", overall.requests_per_second));
    lines.push(format!(
        "Bytes received/sent: {} / {}",
        overall.received_bytes, overall.sent_bytes
    ));

    if !summary.by_label.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{:<width$} {:>8} {:>9} {:>7} {:>7} {:>7} {:>7} {:>7} {:>8} {:>10}",
            "Label",
            "Samples",
            "Average",
            "Min",
            "Max",
            "90%",
            "95%",
            "99%",
            "Error %",
            "Req/s",
            width = LABEL_WIDTH
        ));
        lines.extend(summary.by_label.iter().map(label_row));
    }

    for verdict in &summary.verdicts {
        lines.push(format!(
            "Threshold ({}): {:.2}% required, {:.2}% achieved: {}",
            verdict.scope,
            verdict.threshold_percent,
            verdict.achieved_percent,
            if verdict.passed { "PASS" } else { "FAIL" }
        ));
    }
    for worker in &summary.incomplete_workers {
        lines.push(format!(
            "Incomplete worker: {} #{} after {} iteration(s)",
            worker.scenario, worker.thread_num, worker.completed_iterations
        ));
    }
    lines.extend(summary.warnings.iter().map(|warning| format!("Warning: {}", warning)));
    lines
}

fn label_row(label: &LabelSummary) -> String {
    let metrics: &MetricsSnapshot = &label.metrics;
    format!(
        "{:<width$} {:>8} {:>9.2} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7.2}% {:>10.2}",
        truncate(&label.name),
        metrics.total_requests,
        metrics.avg_ms,
        metrics.min_ms,
        metrics.max_ms,
        metrics.p90_ms,
        metrics.p95_ms,
        metrics.p99_ms,
        success_rate_percent(metrics.failed_requests, metrics.total_requests),
        metrics.requests_per_second,
        width = LABEL_WIDTH
    )
}

fn truncate(name: &str) -> String {
    if name.chars().count() <= LABEL_WIDTH {
        return name.to_owned();
    }
    let mut short: String = name.chars().take(LABEL_WIDTH.saturating_sub(1)).collect();
    short.push('~');
    short
}

pub fn print_summary(summary: &RunSummary) {
    for line in summary_lines(summary) {
        println!("{}", line);
    }
}
