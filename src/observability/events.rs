//! Observable events
//!
//! Every lifecycle event the load generator emits is named here so that log
//! consumers can rely on a fixed vocabulary. Phases are logged through
//! `ObservationScope` as `LOAD_PHASE_*` and `RUN_PHASE_*`.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Settings file loaded and validated
    ConfigLoaded,
    /// Default policy compiled into a setup command
    PolicyCompiled,
    /// Default policy config lacks mandatory keys
    PolicySkipped,

    // Workload
    /// Trace files read and compiled
    WorkloadCompiled,
    /// A trace line could not be compiled (FATAL)
    WorkloadRejected,

    // Run lifecycle
    /// Run begins
    RunStart,
    /// Run complete, aggregate computed
    RunComplete,

    // Worker lifecycle
    /// Worker connected to the controller
    WorkerConnected,
    /// Controller acknowledged the default policy
    HandshakeAccepted,
    /// Controller answered the default policy with something other than ACK
    HandshakeRejected,
    /// Worker replayed its full slice
    WorkerComplete,
    /// Worker aborted its slice
    WorkerFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::PolicyCompiled => "POLICY_COMPILED",
            Event::PolicySkipped => "POLICY_SKIPPED",

            Event::WorkloadCompiled => "WORKLOAD_COMPILED",
            Event::WorkloadRejected => "WORKLOAD_REJECTED",

            Event::RunStart => "RUN_START",
            Event::RunComplete => "RUN_COMPLETE",

            Event::WorkerConnected => "WORKER_CONNECTED",
            Event::HandshakeAccepted => "HANDSHAKE_ACCEPTED",
            Event::HandshakeRejected => "HANDSHAKE_REJECTED",
            Event::WorkerComplete => "WORKER_COMPLETE",
            Event::WorkerFailed => "WORKER_FAILED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::WorkloadRejected)
    }

    /// Returns true if this event indicates a recoverable problem
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::PolicySkipped | Event::HandshakeRejected | Event::WorkerFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Event; 12] = [
        Event::ConfigLoaded,
        Event::PolicyCompiled,
        Event::PolicySkipped,
        Event::WorkloadCompiled,
        Event::WorkloadRejected,
        Event::RunStart,
        Event::RunComplete,
        Event::WorkerConnected,
        Event::HandshakeAccepted,
        Event::HandshakeRejected,
        Event::WorkerComplete,
        Event::WorkerFailed,
    ];

    #[test]
    fn test_all_events_have_string_representation() {
        for event in ALL {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_names_unique() {
        let mut names: Vec<_> = ALL.iter().map(|e| e.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::WorkloadRejected.is_fatal());
        assert!(!Event::WorkerFailed.is_fatal());
        assert!(Event::WorkerFailed.is_warning());
    }
}
