use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Cannot allocate a worker pool of {requested} workers (limit {limit}).")]
    PoolAllocation { requested: u64, limit: u64 },
    #[error("Drain timed out after {timeout_ms}ms; {incomplete} worker(s) force-cancelled.")]
    SchedulingTimeout { timeout_ms: u64, incomplete: usize },
    #[error("Metrics collector stopped unexpectedly: {source}")]
    CollectorFailed {
        #[source]
        source: tokio::task::JoinError,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
