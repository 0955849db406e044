use clap::Parser;
use tracing::error;

use crate::app::{run_load, run_report};
use crate::args::{Command, LoadsmithArgs};
use crate::error::{AppError, AppResult};
use crate::system::logger::init_logging;

/// Parses the command line, initialises logging, and dispatches to the
/// selected command on a multi-threaded runtime.
///
/// # Errors
///
/// Returns whatever the command returns, or an error when the runtime
/// cannot be built.
pub fn run() -> AppResult<()> {
    let args = LoadsmithArgs::parse();
    init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async {
        match &args.command {
            Command::Run(run_args) => run_load(run_args).await,
            Command::Report(report_args) => run_report(report_args).await,
        }
    });
    if let Err(err) = result.as_ref() {
        log_failure(err);
    }
    result
}

fn log_failure(err: &AppError) {
    if err.is_fatal_setup() {
        error!("Run aborted before start: {}", err);
    } else {
        error!("{}", err);
    }
}
