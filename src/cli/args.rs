//! CLI argument definitions using clap
//!
//! Commands:
//! - policy-bench compile [--file <path>]
//! - policy-bench policy --config <path>
//! - policy-bench workloads [--trace-dir <dir>]
//! - policy-bench run --workload <name> [options]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Policy query compiler and controller load generator
#[derive(Parser, Debug)]
#[command(name = "policy-bench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Minimum log severity written to stderr (trace, info, warn, error, fatal)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile query lines into controller commands
    Compile {
        /// File of query lines; stdin if omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Compile a default-policy config into its setup command
    Policy {
        /// Path to the policy JSON file
        #[arg(long)]
        config: PathBuf,
    },

    /// List the workloads available in a trace directory
    Workloads {
        /// Directory holding `<name>_load` / `<name>_run` files
        #[arg(long)]
        trace_dir: Option<PathBuf>,
    },

    /// Replay a workload against the controller and report latency
    Run(RunArgs),
}

/// Options of the `run` command
///
/// Every option left unset falls back to the settings file, then to the
/// built-in default.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Workload name
    #[arg(long)]
    pub workload: Option<String>,

    /// Directory holding the trace files
    #[arg(long)]
    pub trace_dir: Option<PathBuf>,

    /// Controller host
    #[arg(long)]
    pub address: Option<String>,

    /// Controller port
    #[arg(long)]
    pub port: Option<u16>,

    /// Number of concurrent clients
    #[arg(long)]
    pub clients: Option<usize>,

    /// Size in bytes of the value substituted for `VAL`
    #[arg(long)]
    pub value_size: Option<usize>,

    /// Default-policy JSON sent as a handshake on every connection
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Spawn this controller command per client instead of connecting over
    /// TCP, e.g. "controller --db redis"
    #[arg(long)]
    pub spawn: Option<String>,

    /// JSON settings file
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "policy-bench",
            "run",
            "--workload",
            "ycsb_a",
            "--clients",
            "8",
            "--port",
            "1400",
            "--spawn",
            "controller --db redis",
            "--log-level",
            "warn",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("warn"));
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.workload.as_deref(), Some("ycsb_a"));
                assert_eq!(args.clients, Some(8));
                assert_eq!(args.port, Some(1400));
                assert_eq!(args.spawn.as_deref(), Some("controller --db redis"));
                assert!(args.address.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_compile_without_file() {
        let cli = Cli::try_parse_from(["policy-bench", "compile"]).unwrap();
        assert!(matches!(cli.command, Command::Compile { file: None }));
    }

    #[test]
    fn test_policy_requires_config() {
        assert!(Cli::try_parse_from(["policy-bench", "policy"]).is_err());
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["policy-bench", "run", "--port", "70000"]).is_err());
    }
}
