//! Aggregation of result records into throughput and latency statistics.
mod batch;
mod collector;
mod percentile;
mod snapshot;
mod streaming;


pub use batch::{by_label, by_scenario, snapshot};
pub use collector::{CollectedResults, setup_result_collector};
pub use percentile::{percentile, percentile_index};
pub use snapshot::{MetricsSnapshot, success_rate_percent};
pub use streaming::StreamingAggregator;
