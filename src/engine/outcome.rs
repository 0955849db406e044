use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;

use crate::domain::ResultRecord;
use crate::error::{EngineError, ValidationError};
use crate::metrics::{self, MetricsSnapshot};

use super::prepare::ScenarioGroup;

/// Pass/fail decision for one threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub scope: String,
    pub threshold_percent: f64,
    pub achieved_percent: f64,
    pub passed: bool,
}

impl Verdict {
    #[must_use]
    pub fn evaluate(scope: &str, snapshot: &MetricsSnapshot, threshold_percent: f64) -> Self {
        Self {
            scope: scope.to_owned(),
            threshold_percent,
            achieved_percent: snapshot.success_rate_percent,
            passed: snapshot.meets(threshold_percent),
        }
    }

    #[must_use]
    pub fn to_error(&self) -> ValidationError {
        ValidationError::ThresholdNotMet {
            scope: self.scope.clone(),
            achieved: self.achieved_percent,
            threshold: self.threshold_percent,
        }
    }
}

/// How a worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerOutcome {
    /// Ran its iterations (or its duration) to the end.
    Completed,
    /// Stopped early by a shutdown and exited within the drain window.
    Stopped,
    /// Still running when the drain window closed; aborted.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub scenario: String,
    pub thread_num: u64,
    /// Milliseconds from run start to the first iteration; `None` if the
    /// worker never got past its ramp-up delay.
    pub start_offset_ms: Option<u64>,
    pub completed_iterations: u64,
    pub outcome: WorkerOutcome,
}

impl WorkerReport {
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        matches!(self.outcome, WorkerOutcome::Cancelled)
    }
}

/// Final product of a run.
#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<ResultRecord>,
    pub snapshot: MetricsSnapshot,
    pub by_label: Vec<(String, MetricsSnapshot)>,
    pub by_scenario: Vec<(String, MetricsSnapshot)>,
    pub verdicts: Vec<Verdict>,
    pub workers: Vec<WorkerReport>,
    pub warnings: Vec<EngineError>,
    pub elapsed: Duration,
}

impl RunReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|verdict| verdict.passed)
    }

    /// The first unmet threshold, if any.
    #[must_use]
    pub fn failure(&self) -> Option<ValidationError> {
        self.verdicts
            .iter()
            .find(|verdict| !verdict.passed)
            .map(Verdict::to_error)
    }

    pub fn incomplete_workers(&self) -> impl Iterator<Item = &WorkerReport> {
        self.workers.iter().filter(|worker| worker.is_incomplete())
    }
}

/// Aggregates the records and evaluates the thresholds. A scenario that sets
/// its own threshold is judged only by it, over its own records; the plan
/// threshold covers the records of every other scenario and is skipped when
/// no scenario is left for it.
pub(super) fn finalize(
    run_threshold: f64,
    groups: &[std::sync::Arc<ScenarioGroup>],
    records: Vec<ResultRecord>,
    workers: Vec<WorkerReport>,
    warnings: Vec<EngineError>,
    elapsed: Duration,
) -> RunReport {
    let snapshot = metrics::snapshot(&records);
    let by_label = metrics::by_label(&records);
    let by_scenario = metrics::by_scenario(&records);

    let overridden: BTreeSet<&str> = groups
        .iter()
        .filter(|group| group.threshold_overridden)
        .map(|group| group.name.as_str())
        .collect();
    let mut verdicts = Vec::new();
    if overridden.len() < groups.len() {
        let plan_records = records
            .iter()
            .filter(|record| !overridden.contains(record.scenario_name()));
        verdicts.push(Verdict::evaluate(
            "run",
            &metrics::snapshot(plan_records),
            run_threshold,
        ));
    }
    for group in groups.iter().filter(|group| group.threshold_overridden) {
        let scenario_records = records
            .iter()
            .filter(|record| record.scenario_name() == group.name);
        let scenario_snapshot = metrics::snapshot(scenario_records);
        verdicts.push(Verdict::evaluate(
            &format!("scenario '{}'", group.name),
            &scenario_snapshot,
            group.plan.success_threshold_percent(),
        ));
    }

    RunReport {
        records,
        snapshot,
        by_label,
        by_scenario,
        verdicts,
        workers,
        warnings,
        elapsed,
    }
}
