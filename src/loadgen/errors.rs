//! Load generator errors
//!
//! Error codes:
//! - LOADGEN_HANDSHAKE_REJECTED
//! - LOADGEN_INVALID_CONFIG
//! - LOADGEN_LOAD_PHASE_FAILED
//! - LOADGEN_NO_DATA
//! - LOADGEN_REPORT_FAILED
//!
//! Workload, policy and wire errors keep the code of the wrapped error. A
//! rejected trace line arrives as a workload error carrying the query code.
//!
//! Handshake and wire errors are worker-scoped: they fail one worker and the
//! run continues. Everything else aborts the run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::compiler::PolicyError;
use crate::wire::WireError;
use crate::workload::WorkloadError;

/// Result type for load generator operations
pub type LoadGenResult<T> = Result<T, LoadGenError>;

/// Errors raised while preparing or executing a run
#[derive(Debug, Error)]
pub enum LoadGenError {
    #[error(transparent)]
    Workload(#[from] WorkloadError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Wire(#[from] WireError),

    /// Controller answered the policy handshake with something other than `ACK`
    #[error("controller rejected the policy handshake: {response:?}")]
    HandshakeRejected { response: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The unmeasured load phase did not complete
    #[error("load phase failed: {0}")]
    LoadPhase(#[source] Box<LoadGenError>),

    /// No worker completed a single request
    #[error("no latency samples were gathered")]
    NoData,

    #[error("failed to write report {}: {source}", .path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadGenError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            LoadGenError::Workload(e) => e.code(),
            LoadGenError::Policy(e) => e.code(),
            LoadGenError::Wire(e) => e.code(),
            LoadGenError::HandshakeRejected { .. } => "LOADGEN_HANDSHAKE_REJECTED",
            LoadGenError::InvalidConfig(_) => "LOADGEN_INVALID_CONFIG",
            LoadGenError::LoadPhase(_) => "LOADGEN_LOAD_PHASE_FAILED",
            LoadGenError::NoData => "LOADGEN_NO_DATA",
            LoadGenError::Report { .. } => "LOADGEN_REPORT_FAILED",
        }
    }

    /// False for errors confined to a single worker
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            LoadGenError::Wire(_) | LoadGenError::HandshakeRejected { .. }
        )
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        LoadGenError::InvalidConfig(reason.into())
    }
}
