//! CLI command implementations
//!
//! `run` resolves its settings in three layers: built-in defaults, then the
//! JSON settings file, then command-line flags. The merged settings are
//! validated once, before anything is read or connected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compiler::{compile_line, compile_setup, load_policy_config, missing_mandatory_keys};
use crate::loadgen::{self, LoadGenConfig, LoadGenError, RunOutcome, RunReport};
use crate::loadgen::{DEFAULT_CLIENTS, DEFAULT_TRACE_DIR, DEFAULT_VALUE_SIZE};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::wire::{ProcessConnector, TcpConnector};
use crate::workload::{list_workloads, query_lines};

use super::args::{Cli, Command, RunArgs};
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{read_input, write_lines, write_summary};

/// Controller host used when none is configured
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Controller port used when none is configured
pub const DEFAULT_PORT: u16 = 1312;

/// Run settings, as read from the JSON settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Workload name (required, from the file or `--workload`)
    #[serde(default)]
    pub workload: Option<String>,

    /// Trace directory (optional, default "workload_traces")
    #[serde(default = "default_trace_dir")]
    pub trace_dir: PathBuf,

    /// Controller host (optional, default 127.0.0.1)
    #[serde(default = "default_address")]
    pub address: String,

    /// Controller port (optional, default 1312)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Concurrent clients (optional, default 1)
    #[serde(default = "default_clients")]
    pub clients: usize,

    /// `VAL` filler size in bytes (optional, default 1024)
    #[serde(default = "default_value_size")]
    pub value_size: usize,

    /// Default-policy config (optional)
    #[serde(default)]
    pub policy: Option<PathBuf>,

    /// Controller command spawned per client; replaces TCP when set
    #[serde(default)]
    pub spawn: Option<String>,

    /// Run report destination (optional)
    #[serde(default)]
    pub report: Option<PathBuf>,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_trace_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TRACE_DIR)
}
fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_clients() -> usize {
    DEFAULT_CLIENTS
}
fn default_value_size() -> usize {
    DEFAULT_VALUE_SIZE
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workload: None,
            trace_dir: default_trace_dir(),
            address: default_address(),
            port: default_port(),
            clients: default_clients(),
            value_size: default_value_size(),
            policy: None,
            spawn: None,
            report: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; absent fields take their defaults
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read settings: {}", e)))?;

        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid settings JSON: {}", e)))?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", &path.display().to_string())],
        );
        Ok(settings)
    }

    /// Defaults, overlaid with the settings file and then the flags
    pub fn resolve(args: &RunArgs) -> CliResult<Self> {
        let mut settings = match &args.settings {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply(args);
        settings.validate()?;
        Ok(settings)
    }

    /// Override every field the flags set
    pub fn apply(&mut self, args: &RunArgs) {
        if let Some(workload) = &args.workload {
            self.workload = Some(workload.clone());
        }
        if let Some(dir) = &args.trace_dir {
            self.trace_dir = dir.clone();
        }
        if let Some(address) = &args.address {
            self.address = address.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(clients) = args.clients {
            self.clients = clients;
        }
        if let Some(value_size) = args.value_size {
            self.value_size = value_size;
        }
        if let Some(policy) = &args.policy {
            self.policy = Some(policy.clone());
        }
        if let Some(spawn) = &args.spawn {
            self.spawn = Some(spawn.clone());
        }
        if let Some(report) = &args.report {
            self.report = Some(report.clone());
        }
    }

    /// Validate merged settings
    pub fn validate(&self) -> CliResult<()> {
        match self.workload.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(CliError::config_error(
                    "No workload given; use --workload or the settings file",
                ))
            }
            Some(_) => {}
        }

        if self.clients == 0 {
            return Err(CliError::config_error("clients must be > 0"));
        }

        if self.port == 0 {
            return Err(CliError::config_error("port must be > 0"));
        }

        if self.address.trim().is_empty() {
            return Err(CliError::config_error("address must not be empty"));
        }

        if let Some(spawn) = &self.spawn {
            if spawn.split_whitespace().next().is_none() {
                return Err(CliError::config_error("spawn command is empty"));
            }
        }

        parse_log_level(&self.log_level)?;
        Ok(())
    }

    /// Load generator view of these settings
    pub fn to_loadgen_config(&self) -> LoadGenConfig {
        LoadGenConfig {
            workload: self.workload.clone().unwrap_or_default(),
            trace_dir: self.trace_dir.clone(),
            clients: self.clients,
            value_size: self.value_size,
            policy: self.policy.clone(),
        }
    }

    /// Spawned-controller connector, if configured
    pub fn process_connector(&self) -> Option<ProcessConnector> {
        let words: Vec<String> = self
            .spawn
            .as_deref()?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        ProcessConnector::from_command_line(&words)
    }

    /// TCP connector for `address:port`
    pub fn tcp_connector(&self) -> TcpConnector {
        TcpConnector::from_parts(&self.address, self.port)
    }
}

fn parse_log_level(level: &str) -> CliResult<Severity> {
    level.parse().map_err(CliError::config_error)
}

fn set_log_level(level: &str) -> CliResult<()> {
    Logger::set_min_severity(parse_log_level(level)?);
    Ok(())
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}

/// Run the appropriate command based on CLI args
pub fn run_command(cli: Cli) -> CliResult<()> {
    let Cli { log_level, command } = cli;
    if let Some(level) = &log_level {
        set_log_level(level)?;
    }

    match command {
        Command::Compile { file } => compile(file.as_deref()),
        Command::Policy { config } => policy(&config),
        Command::Workloads { trace_dir } => workloads(trace_dir.as_deref()),
        Command::Run(args) => run_bench(&args, log_level.is_none()),
    }
}

/// Compile query lines from `file` (or stdin) and print one command per line
pub fn compile(file: Option<&Path>) -> CliResult<()> {
    let text = read_input(file)?;
    write_lines(compile_text(&text)?)
}

/// Compile every non-comment line of `text`
///
/// Stops at the first line that does not compile, naming its line number.
pub fn compile_text(text: &str) -> CliResult<Vec<String>> {
    query_lines(text)
        .iter()
        .map(|line| {
            compile_line(&line.text)
                .map(|command| command.into_string())
                .map_err(|e| {
                    CliError::new(
                        CliErrorCode::QueryRejected,
                        format!("line {}: {}: {}", line.number, e.code(), e),
                    )
                })
        })
        .collect()
}

/// Print the setup command compiled from a policy config
pub fn policy(config: &Path) -> CliResult<()> {
    let value = load_policy_config(config)?;
    match compile_setup(&value) {
        Some(setup) => write_lines([setup.as_str()]),
        None => {
            let missing = missing_mandatory_keys(&value);
            Err(CliError::policy_rejected(if missing.is_empty() {
                "default_policy must be an object".to_string()
            } else {
                format!("missing mandatory keys: {}", missing.join(", "))
            }))
        }
    }
}

/// List workload names found in `trace_dir`
pub fn workloads(trace_dir: Option<&Path>) -> CliResult<()> {
    let dir = trace_dir.unwrap_or_else(|| Path::new(DEFAULT_TRACE_DIR));
    write_lines(list_workloads(dir)?)
}

/// Replay a workload and print the latency summary
///
/// Fails after printing the summary when no worker gathered a sample.
pub fn run_bench(args: &RunArgs, use_settings_log_level: bool) -> CliResult<()> {
    let settings = Settings::resolve(args)?;
    if use_settings_log_level {
        set_log_level(&settings.log_level)?;
    }

    let config = settings.to_loadgen_config();
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;

    let outcome: RunOutcome = rt.block_on(async {
        match settings.process_connector() {
            Some(connector) => loadgen::execute(&config, connector).await,
            None => loadgen::execute(&config, settings.tcp_connector()).await,
        }
    })?;

    write_summary(&mut io::stdout().lock(), &outcome.aggregate)?;

    if let Some(path) = &settings.report {
        RunReport::new(&config, &outcome).write(path)?;
    }

    if !outcome.aggregate.has_data() {
        return Err(LoadGenError::NoData.into());
    }
    Ok(())
}
