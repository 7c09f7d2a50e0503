//! CLI-specific error types
//!
//! Every CLI error is fatal: `main` prints it to stderr and exits with
//! status 1. Errors from the library keep their own code in the message.

use std::fmt;
use std::io;

use crate::compiler::PolicyError;
use crate::loadgen::LoadGenError;
use crate::workload::WorkloadError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Settings file or option error
    ConfigError,
    /// I/O error (stdin/stdout/files)
    IoError,
    /// A query line failed to compile
    QueryRejected,
    /// Policy config unusable
    PolicyRejected,
    /// Trace directory or files unusable
    WorkloadError,
    /// Run aborted before or during the load phase
    RunFailed,
    /// Run finished without a single latency sample
    NoData,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "BENCH_CLI_CONFIG_ERROR",
            Self::IoError => "BENCH_CLI_IO_ERROR",
            Self::QueryRejected => "BENCH_CLI_QUERY_REJECTED",
            Self::PolicyRejected => "BENCH_CLI_POLICY_REJECTED",
            Self::WorkloadError => "BENCH_CLI_WORKLOAD_ERROR",
            Self::RunFailed => "BENCH_CLI_RUN_FAILED",
            Self::NoData => "BENCH_CLI_NO_DATA",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Policy rejected
    pub fn policy_rejected(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::PolicyRejected, msg)
    }

    /// Get the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<PolicyError> for CliError {
    fn from(e: PolicyError) -> Self {
        Self::policy_rejected(format!("{}: {}", e.code(), e))
    }
}

impl From<WorkloadError> for CliError {
    fn from(e: WorkloadError) -> Self {
        Self::new(CliErrorCode::WorkloadError, format!("{}: {}", e.code(), e))
    }
}

impl From<LoadGenError> for CliError {
    fn from(e: LoadGenError) -> Self {
        let code = match &e {
            LoadGenError::Workload(WorkloadError::Compile { .. }) => CliErrorCode::QueryRejected,
            LoadGenError::Workload(_) => CliErrorCode::WorkloadError,
            LoadGenError::Policy(_) => CliErrorCode::PolicyRejected,
            LoadGenError::InvalidConfig(_) => CliErrorCode::ConfigError,
            LoadGenError::NoData => CliErrorCode::NoData,
            LoadGenError::Report { .. } => CliErrorCode::IoError,
            LoadGenError::Wire(_)
            | LoadGenError::HandshakeRejected { .. }
            | LoadGenError::LoadPhase(_) => CliErrorCode::RunFailed,
        };
        Self::new(code, format!("{}: {}", e.code(), e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
