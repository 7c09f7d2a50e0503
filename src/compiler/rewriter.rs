//! Query rewriter
//!
//! Maps (verb, key, value, filter) to the canonical command string the
//! controller evaluates. `put`, `get` and `delete` degrade to the intact KV
//! form when no filter is attached; the metadata and regulator verbs always
//! carry the filter argument.

use std::fmt;

use crate::query::{parse, Filter, QueryError, QueryResult, Verb};

/// Canonical wire-ready command
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledCommand(String);

impl CompiledCommand {
    /// Wrap an already-canonical command string
    pub(crate) fn new(command: String) -> Self {
        Self(command)
    }

    /// Command text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Command bytes, as framed on the wire
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consume into the owned string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CompiledCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<[u8]> for CompiledCommand {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Compile one operation into its canonical command
///
/// # Errors
///
/// - `MissingKey` if `key` is empty
/// - `MissingValue` if `verb` is `put` and no value is given
pub fn compile(
    verb: Verb,
    key: &str,
    value: Option<&str>,
    filter: &Filter,
) -> QueryResult<CompiledCommand> {
    if key.is_empty() {
        return Err(QueryError::MissingKey(verb));
    }

    let command = match verb {
        Verb::Put => {
            let value = value
                .filter(|v| !v.is_empty())
                .ok_or_else(|| QueryError::MissingValue(key.to_string()))?;
            format!("{} {} {}{}", verb.wire_name(), key, value, filter)
        }
        Verb::Get | Verb::Delete | Verb::PutM | Verb::GetM | Verb::DeleteM | Verb::GetLogs => {
            format!("{} {}{}", verb.wire_name(), key, filter)
        }
    };

    Ok(CompiledCommand::new(command))
}

/// Parse and compile one trace line
pub fn compile_line(line: &str) -> QueryResult<CompiledCommand> {
    let parsed = parse(line)?;
    compile(
        parsed.verb,
        parsed.key.as_deref().unwrap_or_default(),
        parsed.value.as_deref(),
        &parsed.filter,
    )
}
