//! Per-connection replay
//!
//! A session is: connect, optional `user_policy` handshake, then each command
//! sent and its response awaited in order, then the exit sentinel. Both the
//! load phase and every run-phase worker execute exactly one session on a
//! connection they own.

use std::sync::Arc;

use crate::compiler::CompiledCommand;
use crate::observability::{
    log_event_with_fields, Event, Logger, MetricsRegistry, ObservationScope, Timer,
};
use crate::wire::{Connector, Transport, WireError, ACK, EXIT_SENTINEL};

use super::aggregate::{LatencyAccumulator, WorkerReport};
use super::errors::{LoadGenError, LoadGenResult};

/// Run one worker's slice of the run phase
///
/// Errors are returned to the coordinator, which turns them into a failed
/// outcome for this worker only.
pub async fn run_worker<C: Connector>(
    worker_id: usize,
    connector: Arc<C>,
    setup: Option<Arc<CompiledCommand>>,
    commands: Vec<CompiledCommand>,
    metrics: Arc<MetricsRegistry>,
) -> LoadGenResult<WorkerReport> {
    let id = worker_id.to_string();

    match run_session(&*connector, &id, setup.as_deref(), &commands, &metrics).await {
        Ok(latency) => {
            let report = WorkerReport::new(worker_id, latency);
            metrics.record_requests(report.count);
            log_event_with_fields(
                Event::WorkerComplete,
                &[
                    ("worker", &id),
                    ("requests", &report.count.to_string()),
                    ("sum_latency_us", &report.sum_latency.as_micros().to_string()),
                ],
            );
            Ok(report)
        }
        Err(err) => {
            metrics.increment_worker_failures();
            log_event_with_fields(
                Event::WorkerFailed,
                &[("worker", &id), ("code", err.code()), ("reason", &err.to_string())],
            );
            Err(err)
        }
    }
}

/// Replay the load trace on one dedicated connection
///
/// Unmeasured. Any failure is wrapped in `LoadPhase` and aborts the run.
pub async fn run_load_phase<C: Connector>(
    connector: &C,
    setup: Option<&CompiledCommand>,
    commands: &[CompiledCommand],
    metrics: &MetricsRegistry,
) -> LoadGenResult<()> {
    let count = commands.len().to_string();
    let scope = ObservationScope::with_fields(
        "LOAD_PHASE",
        &[("commands", &count), ("endpoint", &connector.describe())],
    );

    match run_session(connector, "load", setup, commands, metrics).await {
        Ok(_) => {
            scope.complete();
            Ok(())
        }
        Err(err) => {
            scope.fail(&err.to_string());
            Err(LoadGenError::LoadPhase(Box::new(err)))
        }
    }
}

/// Connect, replay and close; the connection is closed on every path
async fn run_session<C: Connector>(
    connector: &C,
    id: &str,
    setup: Option<&CompiledCommand>,
    commands: &[CompiledCommand],
    metrics: &MetricsRegistry,
) -> LoadGenResult<LatencyAccumulator> {
    let mut transport = connector.connect().await?;
    log_event_with_fields(
        Event::WorkerConnected,
        &[("worker", id), ("endpoint", &connector.describe())],
    );

    match replay(&mut transport, id, setup, commands, metrics).await {
        Ok(latency) => {
            transport.send_frame(EXIT_SENTINEL).await?;
            metrics.record_frame_sent(EXIT_SENTINEL.len());
            transport.close().await?;
            Ok(latency)
        }
        Err(err) => {
            if let Err(close_err) = transport.close().await {
                Logger::trace(
                    "SESSION_CLOSE_FAILED",
                    &[("worker", id), ("reason", &close_err.to_string())],
                );
            }
            Err(err)
        }
    }
}

async fn replay<T: Transport>(
    transport: &mut T,
    id: &str,
    setup: Option<&CompiledCommand>,
    commands: &[CompiledCommand],
    metrics: &MetricsRegistry,
) -> LoadGenResult<LatencyAccumulator> {
    if let Some(setup) = setup {
        handshake(transport, id, setup, metrics).await?;
    }

    let mut latency = LatencyAccumulator::new();
    for command in commands {
        let timer = Timer::new();
        round_trip(transport, command.as_bytes(), metrics).await?;
        latency.record(timer.elapsed());
    }
    Ok(latency)
}

/// Send the setup command; anything but `ACK` rejects the session
async fn handshake<T: Transport>(
    transport: &mut T,
    id: &str,
    setup: &CompiledCommand,
    metrics: &MetricsRegistry,
) -> LoadGenResult<()> {
    let response = round_trip(transport, setup.as_bytes(), metrics).await?;
    if response != ACK {
        metrics.increment_handshake_rejections();
        let response = String::from_utf8_lossy(&response).into_owned();
        log_event_with_fields(
            Event::HandshakeRejected,
            &[("worker", id), ("response", &response)],
        );
        return Err(LoadGenError::HandshakeRejected { response });
    }

    log_event_with_fields(Event::HandshakeAccepted, &[("worker", id)]);
    Ok(())
}

async fn round_trip<T: Transport>(
    transport: &mut T,
    payload: &[u8],
    metrics: &MetricsRegistry,
) -> LoadGenResult<Vec<u8>> {
    transport.send_frame(payload).await?;
    metrics.record_frame_sent(payload.len());

    let response = transport
        .recv_frame()
        .await?
        .ok_or(WireError::ConnectionClosed)?;
    metrics.record_frame_received();
    Ok(response)
}
