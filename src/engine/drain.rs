use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::shutdown::{ShutdownReceiver, ShutdownSender};

use super::RunState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct DrainOutcome {
    pub(super) stop_requested: bool,
    pub(super) timed_out: bool,
}

/// Waits for every worker. A deadline or an external shutdown broadcasts a
/// stop; `exhausted` resolving means no worker has work left to start. From
/// either point on, workers get `drain_timeout` to exit before the rest are
/// aborted.
pub(super) async fn wait_for_workers<F>(
    workers: &mut JoinSet<()>,
    shutdown_tx: &ShutdownSender,
    mut shutdown_rx: ShutdownReceiver,
    deadline: Option<Instant>,
    exhausted: F,
    drain_timeout: Duration,
    state_tx: &watch::Sender<RunState>,
) -> DrainOutcome
where
    F: Future<Output = ()>,
{
    let deadline_reached = async move {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline_reached);
    tokio::pin!(exhausted);

    let stop_requested = loop {
        tokio::select! {
            joined = workers.join_next() => match joined {
                Some(result) => log_join_result(result),
                None => break false,
            },
            () = &mut deadline_reached => {
                info!("Run deadline reached; stopping workers.");
                drop(shutdown_tx.send(()));
                break true;
            },
            () = &mut exhausted => {
                info!("Every worker has started its last request.");
                break false;
            },
            _ = shutdown_rx.recv() => {
                info!("Shutdown requested; stopping workers.");
                break true;
            },
        }
    };

    state_tx.send_replace(RunState::Draining);
    if workers.is_empty() {
        return DrainOutcome {
            stop_requested,
            timed_out: false,
        };
    }

    info!(
        "Draining {} worker(s) for up to {}ms.",
        workers.len(),
        drain_timeout.as_millis()
    );
    let timed_out = tokio::time::timeout(drain_timeout, join_all(workers))
        .await
        .is_err();
    if timed_out {
        warn!(
            "Drain timed out; force-cancelling {} worker(s).",
            workers.len()
        );
        workers.abort_all();
        join_all(workers).await;
    }
    DrainOutcome {
        stop_requested,
        timed_out,
    }
}

async fn join_all(workers: &mut JoinSet<()>) {
    while let Some(result) = workers.join_next().await {
        log_join_result(result);
    }
}

fn log_join_result(result: Result<(), JoinError>) {
    if let Err(err) = result
        && err.is_panic()
    {
        error!("Worker panicked: {}", err);
    }
}
