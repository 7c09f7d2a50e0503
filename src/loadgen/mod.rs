//! Concurrent load generator
//!
//! A run has three stages:
//!
//! 1. Preparation: both trace files are read and every line compiled, and the
//!    optional default policy is compiled into the handshake. Any error here
//!    aborts the run before a connection is opened.
//! 2. Load phase: the load trace is replayed once on a dedicated connection,
//!    unmeasured. It completes before any worker starts.
//! 3. Run phase: the run trace is split round-robin across `clients` workers,
//!    one tokio task each, each owning its own connection. Workers return
//!    their latency totals through their join handles; the coordinator
//!    reduces after all have joined.
//!
//! A failed worker is recorded and skipped in the aggregate. It never affects
//! other workers. There is no per-request timeout: a controller that never
//! answers blocks its worker indefinitely.

mod aggregate;
mod config;
mod errors;
mod report;
mod worker;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::compiler::{
    compile_setup, load_policy_config, missing_mandatory_keys, CompiledCommand,
};
use crate::observability::{
    log_event_with_fields, Event, MetricsRegistry, MetricsSnapshot, ObservationScope, Timer,
};
use crate::wire::Connector;
use crate::workload::{partition_round_robin, Workload};

pub use aggregate::{AggregateLatency, LatencyAccumulator, WorkerOutcome, WorkerReport};
pub use config::{LoadGenConfig, DEFAULT_CLIENTS, DEFAULT_TRACE_DIR, DEFAULT_VALUE_SIZE};
pub use errors::{LoadGenError, LoadGenResult};
pub use report::{AggregateRecord, RunReport, WorkerRecord};
pub use worker::{run_load_phase, run_worker};

/// Failure code recorded for a worker task that panicked
const WORKER_PANICKED: &str = "LOADGEN_WORKER_PANICKED";

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub endpoint: String,
    pub load_commands: usize,
    pub run_commands: usize,
    pub aggregate: AggregateLatency,
    /// One entry per worker, ordered by worker id
    pub workers: Vec<WorkerOutcome>,
    pub metrics: MetricsSnapshot,
}

/// Execute a run and return its aggregate latency
///
/// `mean_latency` is `None` when no worker completed a request; turning that
/// into a failure is up to the caller.
pub async fn run<C: Connector>(
    config: &LoadGenConfig,
    connector: C,
) -> LoadGenResult<AggregateLatency> {
    Ok(execute(config, connector).await?.aggregate)
}

/// Execute a run and return every per-worker detail
pub async fn execute<C: Connector>(
    config: &LoadGenConfig,
    connector: C,
) -> LoadGenResult<RunOutcome> {
    config.validate()?;

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let connector = Arc::new(connector);
    let endpoint = connector.describe();

    log_event_with_fields(
        Event::RunStart,
        &[
            ("run_id", &run_id.to_string()),
            ("workload", &config.workload),
            ("clients", &config.clients.to_string()),
            ("endpoint", &endpoint),
        ],
    );

    let workload = prepare_workload(config)?;
    let setup = prepare_policy(config)?;
    let metrics = Arc::new(MetricsRegistry::new());

    run_load_phase(&*connector, setup.as_ref(), &workload.load, &metrics).await?;

    let setup = setup.map(Arc::new);
    let slices = partition_round_robin(&workload.run, config.clients);

    let scope = ObservationScope::with_fields(
        "RUN_PHASE",
        &[
            ("clients", &config.clients.to_string()),
            ("commands", &workload.run.len().to_string()),
        ],
    );
    let timer = Timer::new();

    let handles: Vec<_> = slices
        .into_iter()
        .enumerate()
        .map(|(worker_id, slice)| {
            tokio::spawn(run_worker(
                worker_id,
                Arc::clone(&connector),
                setup.clone(),
                slice,
                Arc::clone(&metrics),
            ))
        })
        .collect();

    let mut workers = Vec::with_capacity(handles.len());
    for (worker_id, handle) in handles.into_iter().enumerate() {
        let outcome = match handle.await {
            Ok(Ok(report)) => WorkerOutcome::Completed(report),
            Ok(Err(err)) => WorkerOutcome::Failed {
                worker_id,
                code: err.code(),
                reason: err.to_string(),
            },
            Err(join_err) => {
                metrics.increment_worker_failures();
                let reason = join_err.to_string();
                log_event_with_fields(
                    Event::WorkerFailed,
                    &[
                        ("worker", &worker_id.to_string()),
                        ("code", WORKER_PANICKED),
                        ("reason", &reason),
                    ],
                );
                WorkerOutcome::Failed {
                    worker_id,
                    code: WORKER_PANICKED,
                    reason,
                }
            }
        };
        workers.push(outcome);
    }

    let aggregate = AggregateLatency::from_outcomes(&workers, timer.elapsed());
    scope.complete_with_fields(&[
        ("requests", &aggregate.total_requests.to_string()),
        ("workers_failed", &aggregate.workers_failed.to_string()),
    ]);

    let mean_us = aggregate
        .mean_latency
        .map(|d| d.as_micros().to_string())
        .unwrap_or_else(|| "none".to_string());
    log_event_with_fields(
        Event::RunComplete,
        &[
            ("run_id", &run_id.to_string()),
            ("mean_latency_us", &mean_us),
            ("elapsed_ms", &aggregate.elapsed.as_millis().to_string()),
        ],
    );

    Ok(RunOutcome {
        run_id,
        started_at,
        endpoint,
        load_commands: workload.load.len(),
        run_commands: workload.run.len(),
        aggregate,
        workers,
        metrics: metrics.snapshot(),
    })
}

fn prepare_workload(config: &LoadGenConfig) -> LoadGenResult<Workload> {
    match Workload::open(&config.trace_dir, &config.workload, config.value_size) {
        Ok(workload) => {
            log_event_with_fields(
                Event::WorkloadCompiled,
                &[
                    ("workload", &workload.name),
                    ("load_commands", &workload.load.len().to_string()),
                    ("run_commands", &workload.run.len().to_string()),
                ],
            );
            Ok(workload)
        }
        Err(err) => {
            log_event_with_fields(
                Event::WorkloadRejected,
                &[
                    ("workload", &config.workload),
                    ("code", err.code()),
                    ("reason", &err.to_string()),
                ],
            );
            Err(err.into())
        }
    }
}

/// Compile the configured default policy, if any
///
/// A policy file that is present but unusable is a configuration error: the
/// run would otherwise silently skip the handshake.
fn prepare_policy(config: &LoadGenConfig) -> LoadGenResult<Option<CompiledCommand>> {
    let Some(path) = &config.policy else {
        return Ok(None);
    };

    let policy = load_policy_config(path)?;
    if let Some(setup) = compile_setup(&policy) {
        return Ok(Some(setup));
    }

    let missing = missing_mandatory_keys(&policy);
    let reason = if missing.is_empty() {
        format!("{}: default_policy must be an object", path.display())
    } else {
        format!(
            "{}: missing mandatory keys {}",
            path.display(),
            missing.join(", ")
        )
    };
    Err(LoadGenError::invalid_config(reason))
}
