//! Workload trace files
//!
//! A workload `W` is stored as two plain-text files in a trace directory:
//! - `W_load`: replayed once, unmeasured, before the run
//! - `W_run`: the measured phase, partitioned across clients
//!
//! One query per line. Lines starting with `#` are comments, blank lines are
//! skipped, and the token `VAL` is replaced with a filler value of the
//! configured size before the line is compiled.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::compiler::{compile_line, CompiledCommand};
use crate::query::QueryError;

/// Placeholder replaced by the filler value
pub const PLACEHOLDER: &str = "VAL";

/// Suffix of the load-phase trace file
pub const LOAD_SUFFIX: &str = "_load";

/// Suffix of the run-phase trace file
pub const RUN_SUFFIX: &str = "_run";

/// Result type for workload operations
pub type WorkloadResult<T> = Result<T, WorkloadError>;

/// Errors reading or compiling a workload
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// Trace file could not be read
    #[error("failed to read trace file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Trace directory could not be listed
    #[error("failed to list trace directory {}: {source}", .path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A trace line failed to parse or compile
    #[error("{}:{line}: {source}", .path.display())]
    Compile {
        path: PathBuf,
        line: usize,
        #[source]
        source: QueryError,
    },
}

impl WorkloadError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            WorkloadError::Read { .. } => "WORKLOAD_UNREADABLE",
            WorkloadError::ListDir { .. } => "WORKLOAD_DIR_UNREADABLE",
            WorkloadError::Compile { source, .. } => source.code(),
        }
    }
}

/// One query line with its 1-based position in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
    pub number: usize,
    pub text: String,
}

/// A workload with both phases compiled
#[derive(Debug, Clone)]
pub struct Workload {
    pub name: String,
    pub load: Vec<CompiledCommand>,
    pub run: Vec<CompiledCommand>,
}

impl Workload {
    /// Read and compile `<dir>/<name>_load` and `<dir>/<name>_run`
    ///
    /// Compilation stops at the first bad line; no partial workload is
    /// returned.
    pub fn open(dir: &Path, name: &str, value_size: usize) -> WorkloadResult<Self> {
        let (load_path, run_path) = trace_paths(dir, name);
        let filler = filler_value(value_size);

        Ok(Self {
            name: name.to_string(),
            load: compile_trace(&load_path, &filler)?,
            run: compile_trace(&run_path, &filler)?,
        })
    }
}

/// Paths of the load and run trace files of a workload
pub fn trace_paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{}{}", name, LOAD_SUFFIX)),
        dir.join(format!("{}{}", name, RUN_SUFFIX)),
    )
}

/// Filler value of exactly `size` bytes
pub fn filler_value(size: usize) -> String {
    "x".repeat(size)
}

/// Replace every `VAL` token in `line` with `filler`
pub fn expand_placeholder(line: &str, filler: &str) -> String {
    line.replace(PLACEHOLDER, filler)
}

/// Query lines of `text`, without comments and blank lines
pub fn query_lines(text: &str) -> Vec<TraceLine> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.starts_with('#') && !line.trim().is_empty())
        .map(|(idx, line)| TraceLine {
            number: idx + 1,
            text: line.to_string(),
        })
        .collect()
}

/// Read a trace file
pub fn read_trace(path: &Path) -> WorkloadResult<Vec<TraceLine>> {
    let text = fs::read_to_string(path).map_err(|source| WorkloadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(query_lines(&text))
}

/// Read a trace file, expand placeholders and compile every line
pub fn compile_trace(path: &Path, filler: &str) -> WorkloadResult<Vec<CompiledCommand>> {
    read_trace(path)?
        .iter()
        .map(|line| {
            compile_line(&expand_placeholder(&line.text, filler)).map_err(|source| {
                WorkloadError::Compile {
                    path: path.to_path_buf(),
                    line: line.number,
                    source,
                }
            })
        })
        .collect()
}

/// Names of the workloads in `dir`, i.e. files ending in `_run`, sorted
pub fn list_workloads(dir: &Path) -> WorkloadResult<Vec<String>> {
    let list_err = |source: io::Error| WorkloadError::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        if !entry.file_type().map_err(list_err)?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        if let Some(name) = file_name
            .to_str()
            .and_then(|n| n.strip_suffix(RUN_SUFFIX))
            .filter(|n| !n.is_empty())
        {
            names.push(name.to_string());
        }
    }

    names.sort();
    Ok(names)
}
