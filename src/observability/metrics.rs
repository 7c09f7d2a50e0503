//! Run counters
//!
//! - Counters only (latency is aggregated from worker reports, not here)
//! - Monotonic increase
//! - Shared between worker tasks, written with relaxed atomics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters describing one load generator run
///
/// Observational only. Worker results never flow through this registry.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Frames sent (commands, handshakes and exit sentinels)
    frames_sent: AtomicU64,
    /// Frames received
    frames_received: AtomicU64,
    /// Payload bytes sent, excluding headers
    bytes_sent: AtomicU64,
    /// Measured round trips of run-phase workers that completed their slice
    requests_completed: AtomicU64,
    /// Workers that aborted their slice
    worker_failures: AtomicU64,
    /// Handshakes answered with something other than ACK
    handshake_rejections: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame sent with the given payload size
    pub fn record_frame_sent(&self, payload_len: usize) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent
            .fetch_add(payload_len as u64, Ordering::Relaxed);
    }

    /// Record one frame received
    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the measured round trips of a completed worker
    pub fn record_requests(&self, count: u64) {
        self.requests_completed.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a worker abort
    pub fn increment_worker_failures(&self) {
        self.worker_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected handshake
    pub fn increment_handshake_rejections(&self) {
        self.handshake_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            requests_completed: self.requests_completed.load(Ordering::Relaxed),
            worker_failures: self.worker_failures.load(Ordering::Relaxed),
            handshake_rejections: self.handshake_rejections.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub bytes_sent: u64,
    pub requests_completed: u64,
    pub worker_failures: u64,
    pub handshake_rejections: u64,
}
