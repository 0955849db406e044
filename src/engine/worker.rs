use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{LogicalRequest, ResultRecord, StopCondition};
use crate::error::ProtocolError;
use crate::protocol::{ProtocolRequest, ProtocolResponse};
use crate::shutdown::StopSignal;
use crate::vars::{RuntimeContext, VariableScope, resolve};

use super::prepare::{PreparedRequest, ScenarioGroup};
use super::ramp::start_delay;

const NOT_STARTED: u64 = u64::MAX;

/// Progress a worker publishes so the engine can report on it even after
/// force-cancelling it.
#[derive(Debug)]
pub(super) struct WorkerProgress {
    start_offset_ms: AtomicU64,
    completed_iterations: AtomicU64,
    loop_finished: AtomicBool,
    terminated: AtomicBool,
}

impl WorkerProgress {
    pub(super) const fn new() -> Self {
        Self {
            start_offset_ms: AtomicU64::new(NOT_STARTED),
            completed_iterations: AtomicU64::new(0),
            loop_finished: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
        }
    }

    pub(super) fn start_offset_ms(&self) -> Option<u64> {
        let offset = self.start_offset_ms.load(Ordering::Acquire);
        (offset != NOT_STARTED).then_some(offset)
    }

    pub(super) fn completed_iterations(&self) -> u64 {
        self.completed_iterations.load(Ordering::Acquire)
    }

    /// Iteration loop ran to its stop condition.
    pub(super) fn loop_finished(&self) -> bool {
        self.loop_finished.load(Ordering::Acquire)
    }

    pub(super) fn terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

/// Counts a worker as active in its group and in the run for as long as the
/// guard lives.
struct ActiveGuard<'counter> {
    group: &'counter AtomicU64,
    all: &'counter AtomicU64,
}

impl<'counter> ActiveGuard<'counter> {
    fn acquire(group: &'counter AtomicU64, all: &'counter AtomicU64) -> Self {
        group.fetch_add(1, Ordering::Relaxed);
        all.fetch_add(1, Ordering::Relaxed);
        Self { group, all }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        for counter in [self.group, self.all] {
            let released = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_sub(1)
            });
            if released.is_err() {
                debug!("Active worker counter was already zero.");
            }
        }
    }
}

/// Counts a count-based worker as settled once it has no request left to
/// start: when its last request begins, or when it exits for any reason.
pub(super) struct SettleOnce {
    settled: Option<Arc<watch::Sender<u64>>>,
}

impl SettleOnce {
    pub(super) const fn new(settled: Option<Arc<watch::Sender<u64>>>) -> Self {
        Self { settled }
    }

    fn settle(&mut self) {
        if let Some(settled) = self.settled.take() {
            settled.send_modify(|count| *count = count.saturating_add(1));
        }
    }
}

impl Drop for SettleOnce {
    fn drop(&mut self) {
        self.settle();
    }
}

pub(super) struct WorkerContext {
    pub(super) group: Arc<ScenarioGroup>,
    /// 0-based position within the group.
    pub(super) index: u64,
    pub(super) run_start: Instant,
    pub(super) records_tx: mpsc::Sender<ResultRecord>,
    pub(super) all_active: Arc<AtomicU64>,
    pub(super) progress: Arc<WorkerProgress>,
    pub(super) stop: StopSignal,
    pub(super) settle: SettleOnce,
    pub(super) permit: OwnedSemaphorePermit,
}

impl WorkerContext {
    const fn thread_num(&self) -> u64 {
        self.index.saturating_add(1)
    }

    fn thread_name(&self) -> String {
        format!("{} {}-{}", self.group.name, self.group.number, self.thread_num())
    }
}

/// One virtual user: ramp delay, iteration loop, hold.
pub(super) async fn run_worker(mut ctx: WorkerContext) {
    let plan = &ctx.group.plan;
    let delay = start_delay(plan.ramp_up(), ctx.index, plan.threads());
    if !ctx.stop.sleep(delay).await {
        ctx.progress.terminated.store(true, Ordering::Release);
        return;
    }
    let offset_ms = u64::try_from(ctx.run_start.elapsed().as_millis()).unwrap_or(u64::MAX);
    ctx.progress.start_offset_ms.store(offset_ms, Ordering::Release);

    let group = Arc::clone(&ctx.group);
    let all_active = Arc::clone(&ctx.all_active);
    let active = ActiveGuard::acquire(&group.active, &all_active);
    let thread_name = ctx.thread_name();
    debug!("{} started after {}ms.", thread_name, offset_ms);

    let loop_finished = iterate(&mut ctx, &thread_name).await;
    ctx.progress
        .loop_finished
        .store(loop_finished, Ordering::Release);
    if loop_finished && !ctx.stop.sleep(group.plan.hold()).await {
        debug!("{} hold cut short by shutdown.", thread_name);
    }

    drop(active);
    debug!(
        "{} finished after {} iterations.",
        thread_name,
        ctx.progress.completed_iterations()
    );
    ctx.progress.terminated.store(true, Ordering::Release);
    drop(ctx.permit);
}

/// Returns `true` when the stop condition ended the loop, `false` when a
/// shutdown or a closed record sink cut it short.
async fn iterate(ctx: &mut WorkerContext, thread_name: &str) -> bool {
    let group = Arc::clone(&ctx.group);
    let stop_condition = group.plan.stop_condition();
    let pacing = group.plan.pacing();
    let loop_start = Instant::now();
    let mut iteration = 0u64;

    loop {
        if !should_continue(stop_condition, iteration, loop_start.elapsed()) {
            return true;
        }
        if ctx.stop.is_stopped() {
            return false;
        }
        if iteration > 0 && !pacing.is_zero() {
            if !ctx.stop.sleep(pacing).await {
                return false;
            }
            if !should_continue(stop_condition, iteration, loop_start.elapsed()) {
                return true;
            }
        }
        let final_iteration = matches!(
            stop_condition,
            StopCondition::Iterations(limit) if iteration.saturating_add(1) >= limit
        );
        if !run_iteration(ctx, iteration, final_iteration, thread_name).await {
            return false;
        }
        iteration = iteration.saturating_add(1);
        ctx.progress
            .completed_iterations
            .store(iteration, Ordering::Release);
    }
}

const fn should_continue(condition: StopCondition, iteration: u64, elapsed: Duration) -> bool {
    match condition {
        StopCondition::Iterations(limit) => iteration < limit,
        StopCondition::Elapsed(limit) => elapsed.as_nanos() < limit.as_nanos(),
    }
}

/// Runs every request of the scenario once. Returns `false` once the record
/// sink is gone.
async fn run_iteration(
    ctx: &mut WorkerContext,
    iteration: u64,
    final_iteration: bool,
    thread_name: &str,
) -> bool {
    let group = Arc::clone(&ctx.group);
    let runtime = RuntimeContext::now(iteration, ctx.thread_num());
    let row = group.data.as_ref().and_then(|table| match table.row(iteration) {
        Ok(row) => Some(row),
        Err(err) => {
            warn!("{}: no data row for iteration {}: {}", thread_name, iteration, err);
            None
        }
    });

    let last_position = u64::try_from(group.requests.len())
        .unwrap_or(u64::MAX)
        .saturating_sub(1);
    for (position, prepared) in (0u64..).zip(group.requests.iter()) {
        if final_iteration && position == last_position {
            ctx.settle.settle();
        }
        let mut scope = group.scope.with_layer(Arc::clone(&prepared.variables));
        if let Some(row) = row.as_ref() {
            scope = scope.with_layer(Arc::clone(row));
        }
        let resolved = resolve_request(&prepared.request, &scope, &runtime.for_request(position));
        let record = execute(ctx, prepared, &resolved, thread_name).await;
        if ctx.records_tx.send(record).await.is_err() {
            warn!("{}: result sink closed; stopping.", thread_name);
            return false;
        }
    }
    true
}

/// Substitutes variables into every templated field of `request`.
pub(super) fn resolve_request(
    request: &LogicalRequest,
    scope: &VariableScope,
    runtime: &RuntimeContext,
) -> ProtocolRequest {
    let render = |template: &str| resolve(template, scope, runtime);
    ProtocolRequest {
        endpoint: render(request.endpoint()),
        method: render(request.method()),
        body: request.body().map(render),
        headers: request
            .headers()
            .iter()
            .map(|(key, value)| (key.clone(), render(value)))
            .collect(),
        params: request
            .params()
            .iter()
            .map(|(key, value)| (key.clone(), render(value)))
            .collect(),
        variables: request
            .variables()
            .iter()
            .map(|(key, value)| (key.clone(), render(value)))
            .collect(),
    }
}

async fn execute(
    ctx: &WorkerContext,
    prepared: &PreparedRequest,
    resolved: &ProtocolRequest,
    thread_name: &str,
) -> ResultRecord {
    let timestamp_ms = chrono::Utc::now().timestamp_millis();
    let started = Instant::now();
    let outcome = AssertUnwindSafe(prepared.port.execute(resolved))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            Err(ProtocolError::Panicked {
                message: panic_message(payload.as_ref()),
            })
        });
    let wall = started.elapsed();

    let builder = ResultRecord::builder(&ctx.group.name, prepared.request.name())
        .timestamp_ms(timestamp_ms)
        .thread_name(thread_name)
        .url(&resolved.url())
        .sent_bytes(resolved.sent_bytes())
        .threads(
            ctx.group.active.load(Ordering::Relaxed),
            ctx.all_active.load(Ordering::Relaxed),
        );
    match outcome {
        Ok(response) => apply_response(builder, &response).build(),
        Err(err) => {
            debug!("{}: {} failed: {}", thread_name, prepared.request.name(), err);
            builder
                .elapsed_ms(millis(wall))
                .latency_ms(millis(wall))
                .response_message(&err.to_string())
                .error_message(Some(err.to_string()))
                .build()
        }
    }
}

fn apply_response(
    builder: crate::domain::ResultRecordBuilder,
    response: &ProtocolResponse,
) -> crate::domain::ResultRecordBuilder {
    builder
        .elapsed_ms(millis(response.elapsed))
        .latency_ms(millis(response.latency))
        .status_code(response.status_code)
        .response_message(&response.message)
        .success(response.success)
        .bytes(response.bytes())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
