use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::data::{self, DataTable};
use crate::domain::{ExecutionPlan, LogicalRequest, Scenario};
use crate::error::{AppError, ConfigError, EngineError};
use crate::protocol::{ProtocolPort, ProtocolRegistry};
use crate::vars::{VariableScope, has_unterminated_reference};

/// A request bound to the port that executes it.
pub(super) struct PreparedRequest {
    pub(super) request: LogicalRequest,
    pub(super) variables: Arc<BTreeMap<String, String>>,
    pub(super) port: Arc<dyn ProtocolPort>,
}

/// Everything the workers of one scenario share, read-only.
pub(super) struct ScenarioGroup {
    pub(super) name: String,
    /// 1-based position in the configuration, used in thread names.
    pub(super) number: usize,
    pub(super) plan: ExecutionPlan,
    pub(super) threshold_overridden: bool,
    pub(super) requests: Vec<PreparedRequest>,
    pub(super) scope: VariableScope,
    pub(super) data: Option<Arc<DataTable>>,
    pub(super) pool: Arc<Semaphore>,
    pub(super) active: Arc<AtomicU64>,
}

/// Validates the run and builds one group per scenario. Nothing is spawned
/// here; any error aborts the run before a worker exists.
pub(super) fn prepare_groups(
    plan: &ExecutionPlan,
    scenarios: &[Scenario],
    registry: &ProtocolRegistry,
) -> Result<Vec<Arc<ScenarioGroup>>, AppError> {
    if scenarios.is_empty() {
        return Err(AppError::config(ConfigError::NoScenarios));
    }
    check_global_references(plan)?;
    let mut names = BTreeSet::new();
    for scenario in scenarios {
        if !names.insert(scenario.name()) {
            return Err(AppError::config(ConfigError::DuplicateScenario {
                name: scenario.name().to_owned(),
            }));
        }
        if scenario.requests().is_empty() {
            return Err(AppError::config(ConfigError::ScenarioWithoutRequests {
                scenario: scenario.name().to_owned(),
            }));
        }
        check_references(scenario)?;
    }
    registry.ensure_supported(scenarios)?;

    let global = VariableScope::from_map(plan.global_variables().clone());
    let mut groups = Vec::with_capacity(scenarios.len());
    for (idx, scenario) in scenarios.iter().enumerate() {
        let scenario_plan = plan.with_overrides(scenario.overrides())?;
        let pool = allocate_pool(scenario_plan.threads())?;
        let data = data::bind(scenario.name(), scenario.data_source())?;
        let requests = scenario
            .requests()
            .iter()
            .map(|request| {
                registry
                    .port(request.protocol())
                    .map(|port| PreparedRequest {
                        request: request.clone(),
                        variables: Arc::new(request.variables().clone()),
                        port,
                    })
                    .ok_or_else(|| ConfigError::UnsupportedProtocol {
                        protocol: request.protocol().as_str().to_owned(),
                        request: request.name().to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Scenario '{}': {} threads, {} requests per iteration.",
            scenario.name(),
            scenario_plan.threads(),
            requests.len()
        );

        groups.push(Arc::new(ScenarioGroup {
            name: scenario.name().to_owned(),
            number: idx.saturating_add(1),
            threshold_overridden: scenario.overrides().overrides_threshold(),
            plan: scenario_plan,
            requests,
            scope: global.with_layer(Arc::new(scenario.variables().clone())),
            data,
            pool,
            active: Arc::new(AtomicU64::new(0)),
        }));
    }
    Ok(groups)
}

fn check_references(scenario: &Scenario) -> Result<(), ConfigError> {
    for request in scenario.requests() {
        for (field, value) in request.template_fields() {
            if has_unterminated_reference(value) {
                return Err(ConfigError::MalformedVariableReference {
                    owner: format!("{}/{}", scenario.name(), request.name()),
                    field,
                    value: value.to_owned(),
                });
            }
        }
    }
    for (key, value) in scenario.variables() {
        if has_unterminated_reference(value) {
            return Err(ConfigError::MalformedVariableReference {
                owner: scenario.name().to_owned(),
                field: format!("variable '{}'", key),
                value: value.clone(),
            });
        }
    }
    Ok(())
}

fn check_global_references(plan: &ExecutionPlan) -> Result<(), ConfigError> {
    for (key, value) in plan.global_variables() {
        if has_unterminated_reference(value) {
            return Err(ConfigError::MalformedVariableReference {
                owner: "global".to_owned(),
                field: format!("variable '{}'", key),
                value: value.clone(),
            });
        }
    }
    Ok(())
}

/// Semaphore sized exactly to `threads`; each worker holds one permit for its
/// whole lifetime.
pub(super) fn allocate_pool(threads: u64) -> Result<Arc<Semaphore>, EngineError> {
    let permits = usize::try_from(threads)
        .ok()
        .filter(|permits| *permits <= Semaphore::MAX_PERMITS)
        .ok_or(EngineError::PoolAllocation {
            requested: threads,
            limit: u64::try_from(Semaphore::MAX_PERMITS).unwrap_or(u64::MAX),
        })?;
    Ok(Arc::new(Semaphore::new(permits)))
}
