use tracing::info;

use crate::args::ReportArgs;
use crate::error::{AppError, AppResult};
use crate::sinks::{RunSummary, read_result_log, write_summary};

use super::run::ensure_parent_dir;
use super::summary::print_summary;

/// Executes `loadsmith report`: re-aggregates an existing result log.
///
/// # Errors
///
/// Returns an error when the log cannot be read, the summary cannot be
/// written, or the optional threshold is not met.
pub async fn run_report(args: &ReportArgs) -> AppResult<()> {
    let records = read_result_log(&args.input).await?;
    info!("Read {} record(s) from {}", records.len(), args.input.display());
    let summary = RunSummary::from_records(&records, args.threshold);
    if let Some(path) = args.output.as_ref() {
        ensure_parent_dir(path).await?;
        write_summary(path, &summary).await?;
        info!("Wrote summary to {}", path.display());
    }
    print_summary(&summary);

    match summary.verdicts.iter().find(|verdict| !verdict.passed) {
        Some(verdict) => Err(AppError::validation(verdict.to_error())),
        None => Ok(()),
    }
}
