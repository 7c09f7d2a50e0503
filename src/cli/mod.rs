//! CLI module for policy-bench
//!
//! Provides command-line interface for:
//! - compile: Compile query lines into controller commands
//! - policy: Compile a default-policy config into its setup command
//! - workloads: List workloads in a trace directory
//! - run: Replay a workload against the controller

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, RunArgs};
pub use commands::{
    compile, compile_text, policy, run, run_bench, run_command, workloads, Settings,
    DEFAULT_ADDRESS, DEFAULT_PORT,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_input, write_lines, write_summary};
