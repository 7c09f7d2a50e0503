//! Load Generator Tests
//!
//! Runs complete workloads against an in-process mock controller and checks:
//! - one latency sample per run-phase request
//! - mean latency is the mean of per-worker means
//! - round-robin distribution of the run trace
//! - load phase completes before any run-phase connection
//! - handshake rejection fails only the rejected worker
//! - compile errors abort before any connection is opened

use policy_bench::loadgen::{self, LoadGenConfig, LoadGenError, WorkerOutcome};
use policy_bench::wire::{FramedTransport, TcpConnector, Transport, ACK, EXIT_SENTINEL};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

// =============================================================================
// Test Utilities
// =============================================================================

/// Frames in arrival order, tagged with the accept index of their connection
type FrameLog = Arc<Mutex<Vec<(usize, Vec<u8>)>>>;

struct MockController {
    addr: SocketAddr,
    frames: FrameLog,
    accepted: Arc<AtomicUsize>,
}

impl MockController {
    /// Accepts every connection. Answers `user_policy` with `ACK` unless
    /// `reject(conn)` holds, and every other command with `OK`.
    async fn spawn(reject: fn(usize) -> bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let frames: FrameLog = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let log = frames.clone();
        let counter = accepted.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let conn = counter.fetch_add(1, Ordering::SeqCst);
                let log = log.clone();
                tokio::spawn(async move {
                    let (reader, writer) = stream.into_split();
                    let mut transport = FramedTransport::new(reader, writer);
                    while let Ok(Some(frame)) = transport.recv_frame().await {
                        log.lock().unwrap().push((conn, frame.clone()));
                        if frame == EXIT_SENTINEL {
                            break;
                        }
                        let reply: &[u8] = if !frame.starts_with(b"user_policy") {
                            b"OK"
                        } else if reject(conn) {
                            b"DENIED"
                        } else {
                            ACK
                        };
                        if transport.send_frame(reply).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        Self {
            addr,
            frames,
            accepted,
        }
    }

    fn connector(&self) -> TcpConnector {
        TcpConnector::new(self.addr.to_string())
    }

    fn frames(&self) -> Vec<(usize, Vec<u8>)> {
        self.frames.lock().unwrap().clone()
    }

    fn frames_of(&self, conn: usize) -> Vec<String> {
        self.frames()
            .into_iter()
            .filter(|(c, _)| *c == conn)
            .map(|(_, f)| String::from_utf8(f).unwrap())
            .collect()
    }

    fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

fn never(_: usize) -> bool {
    false
}

fn write_workload(dir: &Path, name: &str, load: &[String], run: &[String]) {
    fs::write(dir.join(format!("{}_load", name)), load.join("\n")).unwrap();
    fs::write(dir.join(format!("{}_run", name)), run.join("\n")).unwrap();
}

fn gets(prefix: &str, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("query(get(\"{}{}\"))", prefix, i))
        .collect()
}

fn write_policy(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("policy.json");
    fs::write(
        &path,
        r#"{"sessionKey": "u1", "default_policy": {"objPur": ["ads", "research"], "objExp": "0"}}"#,
    )
    .unwrap();
    path
}

/// Wait for spawned connection handlers to finish logging
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// =============================================================================
// Sampling and aggregation
// =============================================================================

#[tokio::test]
async fn test_n_clients_yield_one_sample_per_request() {
    let controller = MockController::spawn(never).await;
    let dir = TempDir::new().unwrap();
    write_workload(dir.path(), "w", &gets("load", 2), &gets("run", 12));

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_clients(4);
    let aggregate = loadgen::run(&config, controller.connector()).await.unwrap();

    assert_eq!(aggregate.total_requests, 12);
    assert_eq!(aggregate.workers_reporting, 4);
    assert_eq!(aggregate.workers_failed, 0);
    assert!(aggregate.mean_latency.is_some());
    assert!(aggregate.elapsed > Duration::ZERO);

    // One load connection plus one per client
    assert_eq!(controller.accepted(), 5);
}

#[tokio::test]
async fn test_mean_is_mean_of_worker_means() {
    let controller = MockController::spawn(never).await;
    let dir = TempDir::new().unwrap();
    write_workload(dir.path(), "w", &[], &gets("k", 7));

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_clients(3);
    let outcome = loadgen::execute(&config, controller.connector())
        .await
        .unwrap();

    let means: Vec<f64> = outcome
        .workers
        .iter()
        .filter_map(WorkerOutcome::report)
        .map(|r| r.mean().unwrap().as_secs_f64())
        .collect();
    assert_eq!(means.len(), 3);
    let expected = means.iter().sum::<f64>() / 3.0;

    let actual = outcome.aggregate.mean_latency.unwrap().as_secs_f64();
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");

    let counts: Vec<u64> = outcome
        .workers
        .iter()
        .filter_map(WorkerOutcome::report)
        .map(|r| r.count)
        .collect();
    assert_eq!(counts, vec![3, 2, 2]);
}

#[tokio::test]
async fn test_request_counter_excludes_load_phase() {
    let controller = MockController::spawn(never).await;
    let dir = TempDir::new().unwrap();
    write_workload(dir.path(), "w", &gets("load", 3), &gets("run", 5));

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_clients(2);
    let outcome = loadgen::execute(&config, controller.connector())
        .await
        .unwrap();

    assert_eq!(outcome.load_commands, 3);
    assert_eq!(outcome.aggregate.total_requests, 5);
    assert_eq!(
        outcome.metrics.requests_completed,
        outcome.aggregate.total_requests
    );

    // Load and run frames still both reach the controller
    assert_eq!(outcome.metrics.frames_received, 8);
}

// =============================================================================
// Partitioning and phase ordering
// =============================================================================

#[tokio::test]
async fn test_run_trace_partitioned_round_robin() {
    let controller = MockController::spawn(never).await;
    let dir = TempDir::new().unwrap();
    write_workload(dir.path(), "w", &[], &gets("k", 7));

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_clients(3);
    loadgen::run(&config, controller.connector()).await.unwrap();
    settle().await;

    // Accept order of run connections is not worker order; compare as a set
    let mut slices: Vec<Vec<String>> = (1..=3)
        .map(|conn| {
            controller
                .frames_of(conn)
                .into_iter()
                .filter(|f| f.as_bytes() != EXIT_SENTINEL)
                .collect()
        })
        .collect();
    slices.sort();

    let expected = vec![
        vec!["get k0".to_string(), "get k3".into(), "get k6".into()],
        vec!["get k1".to_string(), "get k4".into()],
        vec!["get k2".to_string(), "get k5".into()],
    ];
    assert_eq!(slices, expected);
}

#[tokio::test]
async fn test_load_phase_precedes_run_phase() {
    let controller = MockController::spawn(never).await;
    let dir = TempDir::new().unwrap();
    write_workload(dir.path(), "w", &gets("load", 5), &gets("run", 6));

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_clients(3);
    loadgen::run(&config, controller.connector()).await.unwrap();
    settle().await;

    // Every load command was answered before the first run frame arrived.
    // The load connection's exit sentinel is not awaited, so it may trail.
    let frames = controller.frames();
    let last_load = frames
        .iter()
        .rposition(|(c, f)| *c == 0 && f.as_slice() != EXIT_SENTINEL)
        .unwrap();
    let first_run = frames.iter().position(|(c, _)| *c != 0).unwrap();
    assert!(last_load < first_run);

    let load = controller.frames_of(0);
    assert_eq!(load.len(), 6);
    assert_eq!(load[0], "get load0");
    assert_eq!(load[5].as_bytes(), EXIT_SENTINEL);
}

#[tokio::test]
async fn test_placeholder_expanded_in_both_phases() {
    let controller = MockController::spawn(never).await;
    let dir = TempDir::new().unwrap();
    write_workload(
        dir.path(),
        "w",
        &["query(put(\"a\",\"VAL\"))".to_string()],
        &["query(put(\"b\",\"VAL\"))&objPur(\"ads\")".to_string()],
    );

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_value_size(8);
    loadgen::run(&config, controller.connector()).await.unwrap();
    settle().await;

    assert_eq!(controller.frames_of(0)[0], "put a xxxxxxxx");
    assert_eq!(controller.frames_of(1)[0], "put b xxxxxxxx -objPur ads");
}

// =============================================================================
// Handshake
// =============================================================================

#[tokio::test]
async fn test_handshake_sent_first_on_every_connection() {
    let controller = MockController::spawn(never).await;
    let dir = TempDir::new().unwrap();
    write_workload(dir.path(), "w", &gets("load", 1), &gets("run", 4));
    let policy = write_policy(dir.path());

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_clients(2)
        .with_policy(policy);
    let aggregate = loadgen::run(&config, controller.connector()).await.unwrap();
    assert_eq!(aggregate.total_requests, 4);
    settle().await;

    for conn in 0..3 {
        assert_eq!(
            controller.frames_of(conn)[0],
            "user_policy -sessionKey u1 -objPur ads,research -objExp 0"
        );
    }
}

#[tokio::test]
async fn test_handshake_rejection_fails_one_worker_only() {
    // Connection 0 is the load phase; reject the second run connection
    let controller = MockController::spawn(|conn| conn == 2).await;
    let dir = TempDir::new().unwrap();
    write_workload(dir.path(), "w", &[], &gets("k", 6));
    let policy = write_policy(dir.path());

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_clients(3)
        .with_policy(policy);
    let outcome = loadgen::execute(&config, controller.connector())
        .await
        .unwrap();

    let failed: Vec<_> = outcome.workers.iter().filter(|w| w.is_failed()).collect();
    assert_eq!(failed.len(), 1);
    match failed[0] {
        WorkerOutcome::Failed { code, .. } => assert_eq!(*code, "LOADGEN_HANDSHAKE_REJECTED"),
        WorkerOutcome::Completed(_) => unreachable!(),
    }

    assert_eq!(outcome.aggregate.workers_reporting, 2);
    assert_eq!(outcome.aggregate.total_requests, 4);
    assert!(outcome.aggregate.mean_latency.is_some());
    assert_eq!(outcome.metrics.handshake_rejections, 1);

    settle().await;
    // The rejected connection carried nothing after the handshake
    assert_eq!(controller.frames_of(2).len(), 1);
}

#[tokio::test]
async fn test_all_workers_rejected_gathers_no_data() {
    let controller = MockController::spawn(|conn| conn > 0).await;
    let dir = TempDir::new().unwrap();
    write_workload(dir.path(), "w", &gets("load", 1), &gets("run", 4));
    let policy = write_policy(dir.path());

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_clients(2)
        .with_policy(policy);
    let aggregate = loadgen::run(&config, controller.connector()).await.unwrap();

    assert!(aggregate.mean_latency.is_none());
    assert!(!aggregate.has_data());
    assert_eq!(aggregate.workers_failed, 2);
    assert_eq!(aggregate.total_requests, 0);
}

// =============================================================================
// Fatal errors
// =============================================================================

#[tokio::test]
async fn test_bad_trace_line_aborts_before_connecting() {
    let controller = MockController::spawn(never).await;
    let dir = TempDir::new().unwrap();
    write_workload(
        dir.path(),
        "w",
        &gets("load", 1),
        &["query(get(\"k\"))&fooBar(\"x\")".to_string()],
    );

    let config = LoadGenConfig::new("w").with_trace_dir(dir.path());
    let err = loadgen::run(&config, controller.connector())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "POLICY_QUERY_UNSUPPORTED_PREDICATE");
    assert!(err.is_fatal());
    settle().await;
    assert_eq!(controller.accepted(), 0);
}

#[tokio::test]
async fn test_missing_workload_is_fatal() {
    let controller = MockController::spawn(never).await;
    let dir = TempDir::new().unwrap();

    let config = LoadGenConfig::new("absent").with_trace_dir(dir.path());
    let err = loadgen::run(&config, controller.connector())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadGenError::Workload(_)));
    assert_eq!(controller.accepted(), 0);
}

#[tokio::test]
async fn test_load_phase_rejection_aborts_run() {
    // Reject only the load connection
    let controller = MockController::spawn(|conn| conn == 0).await;
    let dir = TempDir::new().unwrap();
    write_workload(dir.path(), "w", &gets("load", 1), &gets("run", 4));
    let policy = write_policy(dir.path());

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_clients(2)
        .with_policy(policy);
    let err = loadgen::run(&config, controller.connector())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "LOADGEN_LOAD_PHASE_FAILED");
    settle().await;
    assert_eq!(controller.accepted(), 1);
}

#[tokio::test]
async fn test_zero_clients_rejected() {
    let controller = MockController::spawn(never).await;
    let config = LoadGenConfig::new("w").with_clients(0);
    let err = loadgen::run(&config, controller.connector())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "LOADGEN_INVALID_CONFIG");
}

// =============================================================================
// Process transport
// =============================================================================

/// `cat` echoes every frame, which is enough of a controller without a policy
#[cfg(unix)]
#[tokio::test]
async fn test_run_against_spawned_process() {
    use policy_bench::wire::ProcessConnector;

    let dir = TempDir::new().unwrap();
    write_workload(dir.path(), "w", &gets("load", 2), &gets("run", 5));

    let config = LoadGenConfig::new("w")
        .with_trace_dir(dir.path())
        .with_clients(2);
    let aggregate = loadgen::run(&config, ProcessConnector::new("cat", vec![]))
        .await
        .unwrap();

    assert_eq!(aggregate.total_requests, 5);
    assert_eq!(aggregate.workers_reporting, 2);
}
