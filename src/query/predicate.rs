//! Predicate names and compiled filters
//!
//! The recognized predicate set is a closed enum. A [`Filter`] keeps the
//! non-`query` predicates of one line in input order and renders them as the
//! `-name value` suffix understood by the controller.

use std::fmt;
use std::str::FromStr;

use super::errors::QueryError;

/// Recognized predicate names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateName {
    // Comparison operators
    Eq,
    Le,
    Lt,
    Ge,
    Gt,

    // Attribute predicates: the plain form sets metadata, the `Is` form
    // conditions the operation on existing metadata.
    SessionKey,
    SessionKeyIs,
    ObjExp,
    ObjExpIs,
    ObjPur,
    ObjPurIs,
    ObjOrig,
    ObjOrigIs,
    ObjShare,
    ObjShareIs,
    ObjObjections,
    ObjObjectionsIs,
    ObjOwner,
    ObjOwnerIs,

    // Control predicates
    Monitor,
    Query,
}

impl PredicateName {
    /// The whole recognized set
    pub const ALL: [PredicateName; 21] = [
        PredicateName::Eq,
        PredicateName::Le,
        PredicateName::Lt,
        PredicateName::Ge,
        PredicateName::Gt,
        PredicateName::SessionKey,
        PredicateName::SessionKeyIs,
        PredicateName::ObjExp,
        PredicateName::ObjExpIs,
        PredicateName::ObjPur,
        PredicateName::ObjPurIs,
        PredicateName::ObjOrig,
        PredicateName::ObjOrigIs,
        PredicateName::ObjShare,
        PredicateName::ObjShareIs,
        PredicateName::ObjObjections,
        PredicateName::ObjObjectionsIs,
        PredicateName::ObjOwner,
        PredicateName::ObjOwnerIs,
        PredicateName::Monitor,
        PredicateName::Query,
    ];

    /// Name as written in queries and in compiled filters
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateName::Eq => "eq",
            PredicateName::Le => "le",
            PredicateName::Lt => "lt",
            PredicateName::Ge => "ge",
            PredicateName::Gt => "gt",
            PredicateName::SessionKey => "sessionKey",
            PredicateName::SessionKeyIs => "sessionKeyIs",
            PredicateName::ObjExp => "objExp",
            PredicateName::ObjExpIs => "objExpIs",
            PredicateName::ObjPur => "objPur",
            PredicateName::ObjPurIs => "objPurIs",
            PredicateName::ObjOrig => "objOrig",
            PredicateName::ObjOrigIs => "objOrigIs",
            PredicateName::ObjShare => "objShare",
            PredicateName::ObjShareIs => "objShareIs",
            PredicateName::ObjObjections => "objObjections",
            PredicateName::ObjObjectionsIs => "objObjectionsIs",
            PredicateName::ObjOwner => "objOwner",
            PredicateName::ObjOwnerIs => "objOwnerIs",
            PredicateName::Monitor => "monitor",
            PredicateName::Query => "query",
        }
    }
}

impl fmt::Display for PredicateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PredicateName {
    type Err = QueryError;

    /// Exact, case-sensitive match against the recognized set
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PredicateName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| QueryError::UnsupportedPredicate(s.to_string()))
    }
}

/// One `-name value` token of a filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    /// Predicate name (never `query`)
    pub name: PredicateName,
    /// Predicate was written with a leading `!`
    pub negated: bool,
    /// Raw value with one level of quotes removed; opaque to this layer
    pub value: String,
}

impl FilterTerm {
    /// Create a term
    pub fn new(name: PredicateName, negated: bool, value: impl Into<String>) -> Self {
        Self {
            name,
            negated,
            value: value.into(),
        }
    }
}

impl fmt::Display for FilterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negation = if self.negated { "!" } else { "" };
        write!(f, " -{} {}{}", self.name, negation, self.value)
    }
}

/// Ordered filter built from the non-`query` predicates of a line
///
/// An empty filter means no policy is attached to the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    terms: Vec<FilterTerm>,
}

impl Filter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a term, keeping insertion order
    pub fn push(&mut self, term: FilterTerm) {
        self.terms.push(term);
    }

    /// Builder-style append
    pub fn with(mut self, name: PredicateName, negated: bool, value: impl Into<String>) -> Self {
        self.push(FilterTerm::new(name, negated, value));
        self
    }

    /// Returns true if no predicate is attached
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in insertion order
    pub fn terms(&self) -> &[FilterTerm] {
        &self.terms
    }
}

/// Renders `" -name value -name2 !value2"`; empty filters render as `""`
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for term in &self.terms {
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist_round_trip() {
        for name in PredicateName::ALL {
            assert_eq!(name.as_str().parse::<PredicateName>().unwrap(), name);
        }
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert_eq!(
            "fooBar".parse::<PredicateName>(),
            Err(QueryError::UnsupportedPredicate("fooBar".into()))
        );
        // Names are case-sensitive
        assert!("objpur".parse::<PredicateName>().is_err());
        assert!("monitorIs".parse::<PredicateName>().is_err());
    }

    #[test]
    fn test_empty_filter_renders_nothing() {
        assert_eq!(Filter::new().to_string(), "");
        assert!(Filter::new().is_empty());
    }

    #[test]
    fn test_filter_preserves_order_and_negation() {
        let filter = Filter::new()
            .with(PredicateName::SessionKeyIs, false, "user1")
            .with(PredicateName::ObjPurIs, true, "ads")
            .with(PredicateName::Monitor, false, "true");

        assert_eq!(
            filter.to_string(),
            " -sessionKeyIs user1 -objPurIs !ads -monitor true"
        );
        assert_eq!(filter.terms().len(), 3);
    }
}
