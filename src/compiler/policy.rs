//! Default policy setup command
//!
//! A per-client default policy is a JSON document such as
//!
//! ```json
//! {
//!   "sessionKey": "user1",
//!   "default_policy": {
//!     "purpose": ["analytics", "ads"],
//!     "objection": ["marketing"],
//!     "expTime": ["86400"]
//!   }
//! }
//! ```
//!
//! and compiles, in document order, to
//! `user_policy -sessionKey user1 -purpose analytics,ads -objection marketing -expTime 86400`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use super::rewriter::CompiledCommand;
use crate::observability::{log_event_with_fields, Event};

/// Verb of the setup command
pub const SETUP_VERB: &str = "user_policy";

/// Key holding the nested default policy fields
pub const DEFAULT_POLICY_KEY: &str = "default_policy";

/// Keys every policy config must carry
pub const MANDATORY_KEYS: [&str; 2] = ["sessionKey", DEFAULT_POLICY_KEY];

/// Result type for policy config loading
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors reading a policy config file
#[derive(Debug, Error)]
pub enum PolicyError {
    /// File could not be read
    #[error("failed to read policy config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File is not valid JSON
    #[error("invalid policy config JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PolicyError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PolicyError::Read { .. } => "POLICY_CONFIG_UNREADABLE",
            PolicyError::Parse { .. } => "POLICY_CONFIG_INVALID",
        }
    }
}

/// Read a policy config file, keeping the document's key order
pub fn load_policy_config(path: &Path) -> PolicyResult<Value> {
    let content = fs::read_to_string(path).map_err(|source| PolicyError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| PolicyError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Mandatory keys absent from `config`
pub fn missing_mandatory_keys(config: &Value) -> Vec<&'static str> {
    match config.as_object() {
        Some(object) => MANDATORY_KEYS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect(),
        None => MANDATORY_KEYS.to_vec(),
    }
}

/// Compile a policy config into the `user_policy` setup command
///
/// Returns `None` when the config lacks a mandatory key or its
/// `default_policy` is not an object. The caller decides whether that aborts
/// the run.
pub fn compile_setup(config: &Value) -> Option<CompiledCommand> {
    let missing = missing_mandatory_keys(config);
    if !missing.is_empty() {
        log_event_with_fields(
            Event::PolicySkipped,
            &[("missing_keys", &missing.join(","))],
        );
        return None;
    }

    let object = config.as_object()?;
    let mut command = String::from(SETUP_VERB);

    for (key, value) in object {
        if key != DEFAULT_POLICY_KEY {
            push_arg(&mut command, key, value);
            continue;
        }

        let Some(fields) = value.as_object() else {
            log_event_with_fields(
                Event::PolicySkipped,
                &[("reason", "default_policy is not an object")],
            );
            return None;
        };
        push_fields(&mut command, fields);
    }

    log_event_with_fields(Event::PolicyCompiled, &[("command", &command)]);
    Some(CompiledCommand::new(command))
}

fn push_fields(command: &mut String, fields: &Map<String, Value>) {
    for (field, value) in fields {
        push_arg(command, field, value);
    }
}

fn push_arg(command: &mut String, name: &str, value: &Value) {
    command.push_str(" -");
    command.push_str(name);
    command.push(' ');
    command.push_str(&render_value(value));
}

/// Strings raw, arrays comma-joined, other scalars as JSON
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
