//! Run artifacts: the tabular result log and the JSON summary.
mod jtl;
mod summary;


pub use jtl::{
    RESULT_LOG_COLUMNS, decode_result_log, encode_result_log, read_result_log, write_result_log,
};
pub use summary::{LabelSummary, RunSummary, write_summary};
