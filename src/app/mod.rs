mod report;
mod run;
mod summary;


pub use report::run_report;
pub use run::run_load;
pub use summary::{print_summary, summary_lines};
