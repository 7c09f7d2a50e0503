//! Query verbs
//!
//! The verb set is closed. Unknown verbs are rejected while parsing, so the
//! compiler only ever dispatches over these variants.

use std::fmt;
use std::str::FromStr;

use super::errors::QueryError;

/// Operation requested by a query line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Store a value, optionally attaching policy metadata
    Put,
    /// Read a value, subject to the filter
    Get,
    /// Remove a value, subject to the filter
    Delete,
    /// Update policy metadata of an existing key
    PutM,
    /// Read policy metadata
    GetM,
    /// Remove policy metadata
    DeleteM,
    /// Fetch audit logs for a key
    GetLogs,
}

impl Verb {
    /// Every verb, in declaration order
    pub const ALL: [Verb; 7] = [
        Verb::Put,
        Verb::Get,
        Verb::Delete,
        Verb::PutM,
        Verb::GetM,
        Verb::DeleteM,
        Verb::GetLogs,
    ];

    /// Lowercase spelling accepted in trace files
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Put => "put",
            Verb::Get => "get",
            Verb::Delete => "delete",
            Verb::PutM => "putm",
            Verb::GetM => "getm",
            Verb::DeleteM => "deletem",
            Verb::GetLogs => "getlogs",
        }
    }

    /// Spelling used in compiled commands sent to the controller
    pub fn wire_name(&self) -> &'static str {
        match self {
            Verb::GetLogs => "getLogs",
            other => other.as_str(),
        }
    }

    /// True for verbs that must carry a value
    pub fn requires_value(&self) -> bool {
        matches!(self, Verb::Put)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Verb {
    type Err = QueryError;

    /// Case-insensitive, so `getLogs` and `getlogs` are the same verb
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Verb::ALL
            .iter()
            .copied()
            .find(|verb| verb.as_str() == lowered)
            .ok_or_else(|| QueryError::UnsupportedVerb(s.trim().to_string()))
    }
}
