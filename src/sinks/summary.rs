use std::path::Path;

use serde::Serialize;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::domain::ResultRecord;
use crate::engine::{RunReport, Verdict, WorkerReport};
use crate::error::SinkError;
use crate::metrics::{self, MetricsSnapshot};

/// Aggregates for one label or scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSummary {
    pub name: String,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

/// Machine-readable end-of-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    /// Wall time of the run; absent when summarising an existing log.
    pub elapsed_ms: Option<u64>,
    pub passed: bool,
    pub overall: MetricsSnapshot,
    pub by_label: Vec<LabelSummary>,
    pub by_scenario: Vec<LabelSummary>,
    pub verdicts: Vec<Verdict>,
    pub incomplete_workers: Vec<WorkerReport>,
    pub warnings: Vec<String>,
}

impl RunSummary {
    #[must_use]
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            elapsed_ms: Some(u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX)),
            passed: report.passed(),
            overall: report.snapshot.clone(),
            by_label: labelled(&report.by_label),
            by_scenario: labelled(&report.by_scenario),
            verdicts: report.verdicts.clone(),
            incomplete_workers: report.incomplete_workers().cloned().collect(),
            warnings: report.warnings.iter().map(ToString::to_string).collect(),
        }
    }

    /// Summarises records read back from a result log, optionally judging
    /// them against `threshold_percent`.
    #[must_use]
    pub fn from_records(records: &[ResultRecord], threshold_percent: Option<f64>) -> Self {
        let overall = metrics::snapshot(records);
        let verdicts: Vec<Verdict> = threshold_percent
            .map(|threshold| Verdict::evaluate("run", &overall, threshold))
            .into_iter()
            .collect();
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            elapsed_ms: None,
            passed: verdicts.iter().all(|verdict| verdict.passed),
            by_label: labelled(&metrics::by_label(records)),
            by_scenario: labelled(&metrics::by_scenario(records)),
            overall,
            verdicts,
            incomplete_workers: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

fn labelled(groups: &[(String, MetricsSnapshot)]) -> Vec<LabelSummary> {
    groups
        .iter()
        .map(|(name, metrics)| LabelSummary {
            name: name.clone(),
            metrics: metrics.clone(),
        })
        .collect()
}

/// Writes `summary` as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error when serialisation or writing fails.
pub async fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), SinkError> {
    let json = serde_json::to_vec_pretty(summary)
        .map_err(|err| SinkError::SerializeSummary { source: err })?;
    let file = tokio::fs::File::create(path)
        .await
        .map_err(|err| SinkError::Create {
            path: path.to_path_buf(),
            source: err,
        })?;
    let mut writer = BufWriter::new(file);
    let write_err = |err: std::io::Error| SinkError::WriteSummary {
        path: path.to_path_buf(),
        source: err,
    };
    writer.write_all(&json).await.map_err(write_err)?;
    writer.flush().await.map_err(write_err)?;
    Ok(())
}
