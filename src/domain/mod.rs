//! Immutable run model: execution plan, scenarios, logical requests, and
//! per-request result records.
mod plan;
mod record;
mod scenario;

#[cfg(test)]
mod tests;

pub use plan::{
    DEFAULT_DRAIN_TIMEOUT, DEFAULT_PROGRESS_INTERVAL, DEFAULT_SUCCESS_THRESHOLD, ExecutionPlan,
    ExecutionPlanBuilder, PlanOverrides, StopCondition,
};
pub use record::{ResultRecord, ResultRecordBuilder};
pub use scenario::{DataSourceRef, LogicalRequest, ProtocolKind, Scenario};
