//! Terminal I/O for the CLI
//!
//! - Input: query text from a file or stdin, UTF-8 only
//! - Output: plain lines on stdout; logs go to stderr

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::loadgen::AggregateLatency;

use super::errors::{CliError, CliResult};

/// Read all input text from `path`, or from stdin when `None`
pub fn read_input(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            CliError::io_error(format!("Failed to read {}: {}", path.display(), e))
        }),
        None => {
            let mut text = String::new();
            io::stdin().lock().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Write each item on its own line to stdout
pub fn write_lines<I, S>(lines: I) -> CliResult<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut stdout = io::stdout().lock();
    for line in lines {
        writeln!(stdout, "{}", line.as_ref())?;
    }
    stdout.flush()?;
    Ok(())
}

/// Write the end-of-run summary
///
/// ```text
/// Average Latency: 0.000412 seconds
/// Elapsed time: 1.532 seconds
/// ```
pub fn write_summary<W: Write>(out: &mut W, aggregate: &AggregateLatency) -> io::Result<()> {
    match aggregate.mean_latency {
        Some(mean) => writeln!(out, "Average Latency: {:.6} seconds", mean.as_secs_f64())?,
        None => writeln!(
            out,
            "Did not gather latency statistics --- experiment failed."
        )?,
    }
    writeln!(
        out,
        "Elapsed time: {:.3} seconds",
        aggregate.elapsed.as_secs_f64()
    )?;
    out.flush()
}
