//! Run configuration

use std::path::PathBuf;

use serde::Serialize;

use super::errors::{LoadGenError, LoadGenResult};

/// Default directory holding `<name>_load` / `<name>_run` traces
pub const DEFAULT_TRACE_DIR: &str = "workload_traces";

/// Default size in bytes of the `VAL` filler
pub const DEFAULT_VALUE_SIZE: usize = 1024;

/// Default number of concurrent clients
pub const DEFAULT_CLIENTS: usize = 1;

/// What to replay, and how wide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadGenConfig {
    pub workload: String,
    pub trace_dir: PathBuf,
    pub clients: usize,
    pub value_size: usize,
    /// Default-policy config; when set, every connection opens with the
    /// `user_policy` handshake
    pub policy: Option<PathBuf>,
}

impl LoadGenConfig {
    /// Config for `workload` with every other field at its default
    pub fn new(workload: impl Into<String>) -> Self {
        Self {
            workload: workload.into(),
            trace_dir: PathBuf::from(DEFAULT_TRACE_DIR),
            clients: DEFAULT_CLIENTS,
            value_size: DEFAULT_VALUE_SIZE,
            policy: None,
        }
    }

    pub fn with_trace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.trace_dir = dir.into();
        self
    }

    pub fn with_clients(mut self, clients: usize) -> Self {
        self.clients = clients;
        self
    }

    pub fn with_value_size(mut self, value_size: usize) -> Self {
        self.value_size = value_size;
        self
    }

    pub fn with_policy(mut self, policy: impl Into<PathBuf>) -> Self {
        self.policy = Some(policy.into());
        self
    }

    /// Reject configurations that cannot produce a run
    pub fn validate(&self) -> LoadGenResult<()> {
        if self.workload.trim().is_empty() {
            return Err(LoadGenError::invalid_config("workload name is empty"));
        }
        if self.clients == 0 {
            return Err(LoadGenError::invalid_config(
                "number of clients must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoadGenConfig::new("ycsb_a");
        assert_eq!(config.trace_dir, PathBuf::from("workload_traces"));
        assert_eq!(config.clients, 1);
        assert_eq!(config.value_size, 1024);
        assert!(config.policy.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_clients_rejected() {
        let err = LoadGenConfig::new("ycsb_a")
            .with_clients(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), "LOADGEN_INVALID_CONFIG");
    }

    #[test]
    fn test_empty_workload_rejected() {
        let err = LoadGenConfig::new("  ").validate().unwrap_err();
        assert_eq!(err.code(), "LOADGEN_INVALID_CONFIG");
    }
}
