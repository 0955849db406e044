use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::args::RunArgs;
use crate::config::{apply_config, load_config};
use crate::engine::Engine;
use crate::error::{AppError, AppResult};
use crate::protocol::{ProtocolRegistry, SimulatedSettings, build_client};
use crate::shutdown_handlers::setup_signal_shutdown_handler;
use crate::sinks::{RunSummary, write_result_log, write_summary};

use super::summary::print_summary;

/// Executes `loadsmith run`: loads the configuration, drives the engine,
/// writes the artifacts, and fails when a threshold is not met.
///
/// # Errors
///
/// Returns configuration, data-source, and setup errors unchanged, any
/// artifact write failure, and a validation error for an unmet threshold.
pub async fn run_load(args: &RunArgs) -> AppResult<()> {
    let loaded = load_config(args.config.as_deref())?;
    info!("Loaded configuration from {}", loaded.path.display());
    let overrides: BTreeMap<String, String> = args.vars.iter().cloned().collect();
    let settings = apply_config(&loaded, &overrides)?;

    let client = build_client(&settings.http)?;
    let registry = ProtocolRegistry::with_http_family(&client).with_simulated(
        settings
            .simulated
            .unwrap_or_else(|| SimulatedSettings::constant(Duration::ZERO)),
    );
    let engine = Engine::new(settings.plan, settings.scenarios, registry);
    let signal_handle = setup_signal_shutdown_handler(&engine.shutdown_sender());
    let outcome = engine.run().await;
    signal_handle.abort();
    let report = outcome?;

    let summary = RunSummary::from_report(&report);
    let result_log = args.result_log.as_ref().or(settings.result_log.as_ref());
    if let Some(path) = result_log {
        ensure_parent_dir(path).await?;
        write_result_log(path, &report.records).await?;
        info!("Wrote {} record(s) to {}", report.records.len(), path.display());
    }
    let summary_json = args.summary_json.as_ref().or(settings.summary_json.as_ref());
    if let Some(path) = summary_json {
        ensure_parent_dir(path).await?;
        write_summary(path, &summary).await?;
        info!("Wrote summary to {}", path.display());
    }

    for warning in &report.warnings {
        warn!("{}", warning);
    }
    print_summary(&summary);

    match report.failure() {
        Some(failure) => Err(AppError::validation(failure)),
        None => Ok(()),
    }
}

pub(super) async fn ensure_parent_dir(path: &Path) -> AppResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            tokio::fs::create_dir_all(parent).await?;
            Ok(())
        }
        _ => Ok(()),
    }
}
