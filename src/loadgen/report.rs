//! JSON run report
//!
//! Written once per run, after the aggregate is computed. Durations are
//! serialized as fractional seconds.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::observability::MetricsSnapshot;

use super::aggregate::{AggregateLatency, WorkerOutcome};
use super::config::LoadGenConfig;
use super::errors::{LoadGenError, LoadGenResult};
use super::RunOutcome;

/// Serialized form of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub endpoint: String,
    pub config: LoadGenConfig,
    pub load_commands: usize,
    pub run_commands: usize,
    pub aggregate: AggregateRecord,
    pub workers: Vec<WorkerRecord>,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateRecord {
    pub mean_latency_secs: Option<f64>,
    pub elapsed_secs: f64,
    pub workers_reporting: usize,
    pub workers_failed: usize,
    pub total_requests: u64,
}

impl From<&AggregateLatency> for AggregateRecord {
    fn from(agg: &AggregateLatency) -> Self {
        Self {
            mean_latency_secs: agg.mean_latency.map(|d| d.as_secs_f64()),
            elapsed_secs: agg.elapsed.as_secs_f64(),
            workers_reporting: agg.workers_reporting,
            workers_failed: agg.workers_failed,
            total_requests: agg.total_requests,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerRecord {
    pub worker_id: usize,
    pub status: &'static str,
    pub requests: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_latency_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&WorkerOutcome> for WorkerRecord {
    fn from(outcome: &WorkerOutcome) -> Self {
        match outcome {
            WorkerOutcome::Completed(report) => Self {
                worker_id: report.worker_id,
                status: "completed",
                requests: report.count,
                mean_latency_secs: report.mean().map(|d| d.as_secs_f64()),
                error_code: None,
                error: None,
            },
            WorkerOutcome::Failed {
                worker_id,
                code,
                reason,
            } => Self {
                worker_id: *worker_id,
                status: "failed",
                requests: 0,
                mean_latency_secs: None,
                error_code: Some(*code),
                error: Some(reason.clone()),
            },
        }
    }
}

impl RunReport {
    pub fn new(config: &LoadGenConfig, outcome: &RunOutcome) -> Self {
        Self {
            run_id: outcome.run_id,
            started_at: outcome.started_at,
            endpoint: outcome.endpoint.clone(),
            config: config.clone(),
            load_commands: outcome.load_commands,
            run_commands: outcome.run_commands,
            aggregate: AggregateRecord::from(&outcome.aggregate),
            workers: outcome.workers.iter().map(WorkerRecord::from).collect(),
            metrics: outcome.metrics.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report to `path`, replacing any existing file
    pub fn write(&self, path: &Path) -> LoadGenResult<()> {
        let report_err = |source: io::Error| LoadGenError::Report {
            path: path.to_path_buf(),
            source,
        };

        let json = self.to_json().map_err(|e| report_err(e.into()))?;
        fs::write(path, json).map_err(report_err)
    }
}
