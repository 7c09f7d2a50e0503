//! Query parse and compile errors
//!
//! Error codes:
//! - POLICY_QUERY_MALFORMED
//! - POLICY_QUERY_UNSUPPORTED_PREDICATE
//! - POLICY_QUERY_UNSUPPORTED_VERB
//! - POLICY_QUERY_MISSING_KEY
//! - POLICY_QUERY_MISSING_VALUE
//!
//! Every query error is fatal: a trace that fails to compile is an invalid
//! trace, and the run must not start.

use thiserror::Error;

use super::verb::Verb;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while turning a trace line into a compiled command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Structural problem: missing parentheses, empty segment, no `query(...)`
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    /// Predicate name outside the recognized set
    #[error("unsupported predicate '{0}'")]
    UnsupportedPredicate(String),

    /// Verb outside the closed verb set
    #[error("unsupported query verb '{0}'")]
    UnsupportedVerb(String),

    /// The query carries no key
    #[error("no key specified for {0} query")]
    MissingKey(Verb),

    /// A put query carries no value
    #[error("no value specified for put query on key '{0}'")]
    MissingValue(String),
}

impl QueryError {
    /// Shorthand for a malformed query error
    pub fn malformed(reason: impl Into<String>) -> Self {
        QueryError::MalformedQuery(reason.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::MalformedQuery(_) => "POLICY_QUERY_MALFORMED",
            QueryError::UnsupportedPredicate(_) => "POLICY_QUERY_UNSUPPORTED_PREDICATE",
            QueryError::UnsupportedVerb(_) => "POLICY_QUERY_UNSUPPORTED_VERB",
            QueryError::MissingKey(_) => "POLICY_QUERY_MISSING_KEY",
            QueryError::MissingValue(_) => "POLICY_QUERY_MISSING_VALUE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            QueryError::malformed("x").code(),
            "POLICY_QUERY_MALFORMED"
        );
        assert_eq!(
            QueryError::UnsupportedPredicate("fooBar".into()).code(),
            "POLICY_QUERY_UNSUPPORTED_PREDICATE"
        );
        assert_eq!(
            QueryError::MissingKey(Verb::Get).code(),
            "POLICY_QUERY_MISSING_KEY"
        );
    }

    #[test]
    fn test_display_names_offender() {
        let err = QueryError::UnsupportedPredicate("fooBar".into());
        assert!(err.to_string().contains("fooBar"));

        let err = QueryError::MissingKey(Verb::GetLogs);
        assert_eq!(err.to_string(), "no key specified for getlogs query");
    }
}
