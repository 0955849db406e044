use std::time::Duration;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::info;

use crate::domain::ResultRecord;

use super::{MetricsSnapshot, StreamingAggregator};

/// Everything the collector saw, handed back when the record channel closes.
#[derive(Debug, Default)]
pub struct CollectedResults {
    pub records: Vec<ResultRecord>,
    pub streaming: MetricsSnapshot,
}

/// Spawns the task that owns the run's record list.
///
/// Workers send records through `records_rx`; the task keeps them in arrival
/// order, publishes a streaming snapshot on every progress tick, and returns
/// once every sender is dropped.
#[must_use]
pub fn setup_result_collector(
    mut records_rx: mpsc::Receiver<ResultRecord>,
    progress_interval: Duration,
    snapshot_tx: watch::Sender<MetricsSnapshot>,
) -> JoinHandle<CollectedResults> {
    tokio::spawn(async move {
        let mut aggregator = StreamingAggregator::new();
        let mut records = Vec::new();
        let mut progress = tokio::time::interval(progress_interval);
        progress.set_missed_tick_behavior(MissedTickBehavior::Skip);
        progress.reset();
        let mut last_logged_total = 0u64;

        loop {
            tokio::select! {
                maybe_record = records_rx.recv() => {
                    let Some(record) = maybe_record else {
                        break;
                    };
                    aggregator.record(&record);
                    records.push(record);
                },
                _ = progress.tick() => {
                    let snapshot = aggregator.snapshot();
                    if snapshot.total_requests != last_logged_total {
                        log_progress(&snapshot);
                        last_logged_total = snapshot.total_requests;
                    }
                    snapshot_tx.send_replace(snapshot);
                },
            }
        }

        let streaming = aggregator.snapshot();
        snapshot_tx.send_replace(streaming.clone());
        CollectedResults { records, streaming }
    })
}

fn log_progress(snapshot: &MetricsSnapshot) {
    info!(
        "Progress: {} requests, {:.2}% ok, avg {:.1}ms, p95 {}ms, {:.1} req/s",
        snapshot.total_requests,
        snapshot.success_rate_percent,
        snapshot.avg_ms,
        snapshot.p95_ms,
        snapshot.requests_per_second
    );
}
