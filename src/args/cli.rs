use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::parsers::{parse_threshold, parse_variable_override};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent load-test executor: virtual users, ramp-up, pacing, and JMeter-compatible result logs."
)]
pub struct LoadsmithArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (overridden by LOADSMITH_LOG / RUST_LOG)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Disable ANSI colors in log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Execute a load test described by a configuration file
    Run(RunArgs),
    /// Aggregate an existing result log
    Report(ReportArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Path to config file (TOML or JSON). Defaults to ./loadsmith.toml or ./loadsmith.json
    #[arg(long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Write the per-request result log here (overrides the config)
    #[arg(long = "result-log")]
    pub result_log: Option<PathBuf>,

    /// Write the JSON summary here (overrides the config)
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,

    /// Override a global variable (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_variable_override)]
    pub vars: Vec<(String, String)>,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Result log to aggregate
    #[arg(long = "input", short = 'i')]
    pub input: PathBuf,

    /// Fail when the success rate is below this percentage
    #[arg(long = "threshold", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Write the JSON summary here
    #[arg(long = "output", short = 'o')]
    pub output: Option<PathBuf>,
}
