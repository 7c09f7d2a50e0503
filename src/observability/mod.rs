//! Observability subsystem
//!
//! Provides:
//! - Structured logging (JSON lines on stderr)
//! - Run counters
//! - Phase scopes and timers
//!
//! # Principles
//!
//! 1. Observability is read-only: it never influences what is sent
//! 2. No background threads
//! 3. Deterministic field ordering
//!
//! # Usage
//!
//! ```ignore
//! use policy_bench::observability::{Logger, Event, MetricsRegistry, ObservationScope};
//!
//! Logger::info("WORKER_CONNECTED", &[("worker", "0")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.record_requests(1);
//!
//! let scope = ObservationScope::new("LOAD_PHASE");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
