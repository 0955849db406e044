//! Virtual-user scheduler: spawns one worker per thread, staggers them over
//! the ramp-up, drains them at the end, and aggregates what they recorded.
mod drain;
mod outcome;
mod prepare;
mod ramp;
mod worker;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::domain::{ExecutionPlan, Scenario, StopCondition};
use crate::error::{AppResult, EngineError};
use crate::metrics::{MetricsSnapshot, setup_result_collector};
use crate::protocol::ProtocolRegistry;
use crate::shutdown::{ShutdownSender, StopSignal};
use crate::shutdown_handlers::shutdown_channel;

use prepare::{ScenarioGroup, prepare_groups};
use worker::{SettleOnce, WorkerContext, WorkerProgress, run_worker};

pub use outcome::{RunReport, Verdict, WorkerOutcome, WorkerReport};
pub use ramp::start_delay;

/// Records buffered between workers and the collector before workers wait.
const RECORD_CHANNEL_CAPACITY: usize = 4096;

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Initializing,
    Running,
    Draining,
    Finalized,
}

impl RunState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Initializing => "initializing",
            RunState::Running => "running",
            RunState::Draining => "draining",
            RunState::Finalized => "finalized",
        }
    }
}

/// One run's scheduler. All per-run state lives here, so independent engines
/// can run side by side in one process.
pub struct Engine {
    plan: ExecutionPlan,
    scenarios: Vec<Scenario>,
    registry: ProtocolRegistry,
    shutdown_tx: ShutdownSender,
    state_tx: watch::Sender<RunState>,
    state_rx: watch::Receiver<RunState>,
    metrics_tx: watch::Sender<MetricsSnapshot>,
    metrics_rx: watch::Receiver<MetricsSnapshot>,
}

impl Engine {
    #[must_use]
    pub fn new(plan: ExecutionPlan, scenarios: Vec<Scenario>, registry: ProtocolRegistry) -> Self {
        let (shutdown_tx, _) = shutdown_channel();
        let (state_tx, state_rx) = watch::channel(RunState::Idle);
        let (metrics_tx, metrics_rx) = watch::channel(MetricsSnapshot::default());
        Self {
            plan,
            scenarios,
            registry,
            shutdown_tx,
            state_tx,
            state_rx,
            metrics_tx,
            metrics_rx,
        }
    }

    /// Sender that stops the run when anything is broadcast on it.
    #[must_use]
    pub fn shutdown_sender(&self) -> ShutdownSender {
        self.shutdown_tx.clone()
    }

    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state_rx.clone()
    }

    /// Streaming snapshot, refreshed every progress interval.
    #[must_use]
    pub fn subscribe_metrics(&self) -> watch::Receiver<MetricsSnapshot> {
        self.metrics_rx.clone()
    }

    /// Executes the run to completion.
    ///
    /// # Errors
    ///
    /// Returns an error when validation, data loading, or worker-pool
    /// allocation fails (before any worker starts), or when the collector
    /// task dies. Unmet thresholds are not errors; see [`RunReport::passed`].
    pub async fn run(self) -> AppResult<RunReport> {
        self.transition(RunState::Initializing);
        let groups = prepare_groups(&self.plan, &self.scenarios, &self.registry)?;
        let mut permits = groups
            .iter()
            .map(|group| acquire_permits(group))
            .collect::<Result<Vec<_>, _>>()?;

        let (records_tx, records_rx) = mpsc::channel(RECORD_CHANNEL_CAPACITY);
        let collector =
            setup_result_collector(records_rx, self.plan.progress_interval(), self.metrics_tx);
        let shutdown_rx = self.shutdown_tx.subscribe();

        let state_tx = self.state_tx;
        state_tx.send_replace(RunState::Running);
        info!("Run state: {}", RunState::Running.as_str());
        let run_start = Instant::now();
        let all_active = Arc::new(AtomicU64::new(0));
        let (settled_tx, settled_rx) = watch::channel(0u64);
        let settled_tx = Arc::new(settled_tx);
        let mut workers = JoinSet::new();
        let mut tracked = Vec::new();
        for (group, group_permits) in groups.iter().zip(permits.iter_mut()) {
            for (index, permit) in (0u64..).zip(group_permits.drain(..)) {
                let progress = Arc::new(WorkerProgress::new());
                tracked.push((group.name.clone(), index.saturating_add(1), Arc::clone(&progress)));
                workers.spawn(run_worker(WorkerContext {
                    group: Arc::clone(group),
                    index,
                    run_start,
                    records_tx: records_tx.clone(),
                    all_active: Arc::clone(&all_active),
                    progress,
                    stop: StopSignal::new(self.shutdown_tx.subscribe()),
                    settle: SettleOnce::new(
                        is_count_based(group).then(|| Arc::clone(&settled_tx)),
                    ),
                    permit,
                }));
            }
        }
        drop(records_tx);
        info!(
            "Spawned {} worker(s) across {} scenario(s).",
            tracked.len(),
            groups.len()
        );

        let deadline = run_deadline(&self.plan, &groups).and_then(|limit| run_start.checked_add(limit));
        let bounds = groups_bounds(&groups, run_start);
        let exhausted = async move {
            if deadline.is_some() {
                std::future::pending::<()>().await;
            }
            work_exhausted(&bounds, settled_rx).await;
        };
        let drained = drain::wait_for_workers(
            &mut workers,
            &self.shutdown_tx,
            shutdown_rx,
            deadline,
            exhausted,
            self.plan.drain_timeout(),
            &state_tx,
        )
        .await;
        drop(settled_tx);
        info!("Run state: {}", RunState::Draining.as_str());

        let worker_reports: Vec<WorkerReport> = tracked
            .into_iter()
            .map(|(scenario, thread_num, progress)| WorkerReport {
                scenario,
                thread_num,
                start_offset_ms: progress.start_offset_ms(),
                completed_iterations: progress.completed_iterations(),
                outcome: classify(&progress),
            })
            .collect();
        let incomplete = worker_reports
            .iter()
            .filter(|report| report.is_incomplete())
            .count();
        let mut warnings = Vec::new();
        if drained.timed_out || incomplete > 0 {
            warnings.push(EngineError::SchedulingTimeout {
                timeout_ms: u64::try_from(self.plan.drain_timeout().as_millis())
                    .unwrap_or(u64::MAX),
                incomplete,
            });
        }
        if drained.stop_requested {
            info!("Run stopped before every worker reached its stop condition.");
        }

        let collected = collector
            .await
            .map_err(|err| EngineError::CollectorFailed { source: err })?;
        let report = outcome::finalize(
            self.plan.success_threshold_percent(),
            &groups,
            collected.records,
            worker_reports,
            warnings,
            run_start.elapsed(),
        );
        state_tx.send_replace(RunState::Finalized);
        info!(
            "Run state: {} ({} records in {}ms).",
            RunState::Finalized.as_str(),
            report.records.len(),
            report.elapsed.as_millis()
        );
        Ok(report)
    }

    fn transition(&self, state: RunState) {
        self.state_tx.send_replace(state);
        info!("Run state: {}", state.as_str());
    }
}

fn acquire_permits(group: &ScenarioGroup) -> Result<Vec<OwnedSemaphorePermit>, EngineError> {
    let threads = group.plan.threads();
    let mut permits = Vec::new();
    for _ in 0..threads {
        let permit = Arc::clone(&group.pool)
            .try_acquire_owned()
            .map_err(|_err| EngineError::PoolAllocation {
                requested: threads,
                limit: u64::try_from(group.pool.available_permits()).unwrap_or(u64::MAX),
            })?;
        permits.push(permit);
    }
    Ok(permits)
}

/// Hard stop for the whole run: `max_duration` if set, otherwise the latest
/// implied deadline when every scenario is duration-based.
fn run_deadline(plan: &ExecutionPlan, groups: &[Arc<ScenarioGroup>]) -> Option<Duration> {
    if let Some(max_duration) = plan.max_duration() {
        return Some(max_duration);
    }
    groups
        .iter()
        .map(|group| group.plan.implied_deadline())
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .max()
}

fn is_count_based(group: &ScenarioGroup) -> bool {
    matches!(group.plan.stop_condition(), StopCondition::Iterations(_))
}

/// When the workers run out of requests to start.
struct WorkBounds {
    /// Workers that settle through the channel.
    count_based: u64,
    /// Latest end of a duration-based loop.
    loops_end: Option<Instant>,
    longest_hold: Duration,
}

fn groups_bounds(groups: &[Arc<ScenarioGroup>], run_start: Instant) -> WorkBounds {
    let count_based = groups
        .iter()
        .filter(|group| is_count_based(group))
        .map(|group| group.plan.threads())
        .fold(0u64, u64::saturating_add);
    let loops_end = groups
        .iter()
        .filter_map(|group| match group.plan.stop_condition() {
            StopCondition::Elapsed(duration) => Some(group.plan.ramp_up().saturating_add(duration)),
            StopCondition::Iterations(_) => None,
        })
        .max()
        .and_then(|end| run_start.checked_add(end));
    let longest_hold = groups
        .iter()
        .map(|group| group.plan.hold())
        .max()
        .unwrap_or_default();
    WorkBounds {
        count_based,
        loops_end,
        longest_hold,
    }
}

/// Resolves once every count-based worker has started its last request,
/// every duration-based loop has ended, and the longest hold has passed
/// since. Whatever is still running after that only has a single request
/// left, so the drain timeout applies from here.
async fn work_exhausted(bounds: &WorkBounds, mut settled: watch::Receiver<u64>) {
    let all_settled = settled
        .wait_for(|count| *count >= bounds.count_based)
        .await
        .is_ok();
    if !all_settled {
        debug!("Settle channel closed before every worker settled.");
    }
    if let Some(loops_end) = bounds.loops_end {
        tokio::time::sleep_until(loops_end).await;
    }
    tokio::time::sleep(bounds.longest_hold).await;
}

fn classify(progress: &WorkerProgress) -> WorkerOutcome {
    match (progress.terminated(), progress.loop_finished()) {
        (true, true) => WorkerOutcome::Completed,
        (true, false) => WorkerOutcome::Stopped,
        (false, _) => WorkerOutcome::Cancelled,
    }
}
