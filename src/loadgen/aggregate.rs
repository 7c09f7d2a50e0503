//! Latency accumulation and reduction
//!
//! Each worker accumulates `(sum, count)` privately and hands it back through
//! its join handle. The coordinator reduces only after every worker joined:
//! the reported mean is the mean of per-worker means, over workers that
//! completed at least one request.

use std::time::Duration;

/// Running latency total for one connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyAccumulator {
    sum: Duration,
    count: u64,
}

impl LatencyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one request's round-trip time
    pub fn record(&mut self, latency: Duration) {
        self.sum += latency;
        self.count += 1;
    }

    pub fn sum(&self) -> Duration {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `None` before the first sample
    pub fn mean(&self) -> Option<Duration> {
        if self.count == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(
            self.sum.as_secs_f64() / self.count as f64,
        ))
    }
}

/// What a worker returns when its slice completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub sum_latency: Duration,
    pub count: u64,
}

impl WorkerReport {
    pub fn new(worker_id: usize, latency: LatencyAccumulator) -> Self {
        Self {
            worker_id,
            sum_latency: latency.sum(),
            count: latency.count(),
        }
    }

    /// Mean latency of this worker; `None` if its slice was empty
    pub fn mean(&self) -> Option<Duration> {
        LatencyAccumulator {
            sum: self.sum_latency,
            count: self.count,
        }
        .mean()
    }
}

/// Final state of one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    Completed(WorkerReport),
    Failed {
        worker_id: usize,
        code: &'static str,
        reason: String,
    },
}

impl WorkerOutcome {
    pub fn report(&self) -> Option<&WorkerReport> {
        match self {
            WorkerOutcome::Completed(report) => Some(report),
            WorkerOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, WorkerOutcome::Failed { .. })
    }
}

/// Run-phase result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateLatency {
    /// Mean of per-worker means; `None` if no worker gathered a sample
    pub mean_latency: Option<Duration>,
    /// Wall clock from spawning the first worker to joining the last
    pub elapsed: Duration,
    /// Workers that completed at least one request
    pub workers_reporting: usize,
    pub workers_failed: usize,
    pub total_requests: u64,
}

impl AggregateLatency {
    /// Reduce worker outcomes
    pub fn from_outcomes(outcomes: &[WorkerOutcome], elapsed: Duration) -> Self {
        let means: Vec<f64> = outcomes
            .iter()
            .filter_map(WorkerOutcome::report)
            .filter_map(WorkerReport::mean)
            .map(|mean| mean.as_secs_f64())
            .collect();

        let mean_latency = if means.is_empty() {
            None
        } else {
            Some(Duration::from_secs_f64(
                means.iter().sum::<f64>() / means.len() as f64,
            ))
        };

        Self {
            mean_latency,
            elapsed,
            workers_reporting: means.len(),
            workers_failed: outcomes.iter().filter(|o| o.is_failed()).count(),
            total_requests: outcomes
                .iter()
                .filter_map(WorkerOutcome::report)
                .map(|r| r.count)
                .sum(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.mean_latency.is_some()
    }
}
