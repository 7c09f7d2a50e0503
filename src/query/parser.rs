//! Predicate parser
//!
//! A query line is a conjunction of predicates joined by `&`:
//!
//! ```text
//! query(put("k1","v1"))&objPur("ads,analytics")&!sessionKeyIs("user2")
//! ```
//!
//! Exactly one predicate is `query(...)`; it carries the verb and its
//! arguments. Every other predicate becomes a filter term in input order.
//! Disjunctions written as comma-separated values inside one predicate are
//! passed through untouched.

use super::errors::{QueryError, QueryResult};
use super::predicate::{Filter, FilterTerm, PredicateName};
use super::verb::Verb;

/// A parsed query line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Operation
    pub verb: Verb,
    /// Key, when the `query(...)` predicate carried one
    pub key: Option<String>,
    /// Value, when the `query(...)` predicate carried one
    pub value: Option<String>,
    /// Non-`query` predicates
    pub filter: Filter,
}

/// One `[!]name(value)` segment, borrowed from the input line
#[derive(Debug, PartialEq, Eq)]
struct RawPredicate<'a> {
    name: PredicateName,
    negated: bool,
    value: &'a str,
}

/// Verb and arguments taken from the `query(...)` predicate
#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    verb: Verb,
    key: Option<String>,
    value: Option<String>,
}

/// Parse one query line
///
/// # Errors
///
/// - `UnsupportedPredicate` for a name outside the recognized set
/// - `MalformedQuery` for missing parentheses, empty segments, or a missing,
///   duplicated or negated `query(...)` predicate
/// - `UnsupportedVerb` for a verb outside the closed set
/// - `MissingValue` for a `put` without a value
pub fn parse(line: &str) -> QueryResult<ParsedQuery> {
    let line = line.trim();
    if line.is_empty() {
        return Err(QueryError::malformed("empty query line"));
    }

    let mut invocation: Option<Invocation> = None;
    let mut filter = Filter::new();

    for segment in line.split('&') {
        let predicate = split_predicate(segment)?;

        if predicate.name != PredicateName::Query {
            filter.push(FilterTerm::new(
                predicate.name,
                predicate.negated,
                predicate.value,
            ));
            continue;
        }

        if predicate.negated {
            return Err(QueryError::malformed("the query predicate cannot be negated"));
        }
        if invocation.is_some() {
            return Err(QueryError::malformed(format!(
                "more than one query predicate in '{}'",
                line
            )));
        }
        invocation = Some(parse_invocation(predicate.value)?);
    }

    let Invocation { verb, key, value } = invocation.ok_or_else(|| {
        QueryError::malformed(format!("no query(...) predicate in '{}'", line))
    })?;

    if verb.requires_value() && value.is_none() {
        return Err(QueryError::MissingValue(key.unwrap_or_default()));
    }

    Ok(ParsedQuery {
        verb,
        key,
        value,
        filter,
    })
}

/// Split `[!]name(value)` into its parts and check the name
fn split_predicate(segment: &str) -> QueryResult<RawPredicate<'_>> {
    let segment = segment.trim();
    if segment.is_empty() {
        return Err(QueryError::malformed("empty predicate between '&'"));
    }

    let (open, close) = enclosing_parens(segment)
        .ok_or_else(|| QueryError::malformed(format!("unbalanced parentheses in '{}'", segment)))?;

    if !segment[close + 1..].trim().is_empty() {
        return Err(QueryError::malformed(format!(
            "unexpected text after ')' in '{}'",
            segment
        )));
    }

    let raw_name = segment[..open].trim();
    let (negated, name) = match raw_name.strip_prefix('!') {
        Some(rest) => (true, rest.trim()),
        None => (false, raw_name),
    };
    if name.is_empty() {
        return Err(QueryError::malformed(format!(
            "predicate without a name in '{}'",
            segment
        )));
    }

    Ok(RawPredicate {
        name: name.parse()?,
        negated,
        value: strip_quotes(&segment[open + 1..close]),
    })
}

/// Extract verb, key and value from the value of `query(...)`
///
/// Accepts `get`, `get("k")` and `put("k","v")`.
fn parse_invocation(text: &str) -> QueryResult<Invocation> {
    let (verb_text, args) = match text.find('(') {
        None => (text, None),
        Some(_) => {
            let (open, close) = enclosing_parens(text).ok_or_else(|| {
                QueryError::malformed(format!("unbalanced parentheses in query({})", text))
            })?;
            (&text[..open], Some(&text[open + 1..close]))
        }
    };

    let verb_text = verb_text.trim();
    if verb_text.is_empty() {
        return Err(QueryError::malformed(format!(
            "no verb in query({})",
            text
        )));
    }
    let verb: Verb = verb_text.parse()?;

    let (key, value) = match args {
        None => (None, None),
        Some(args) => {
            let mut parts = args.splitn(2, ',');
            let key = parts.next().map(unquote_arg).filter(|k| !k.is_empty());
            let value = parts.next().map(unquote_arg).filter(|v| !v.is_empty());
            (key, value)
        }
    };

    Ok(Invocation {
        verb,
        key: key.map(str::to_string),
        value: value.map(str::to_string),
    })
}

/// Byte offsets of the first `(` and the last `)` after it
fn enclosing_parens(text: &str) -> Option<(usize, usize)> {
    let open = text.find('(')?;
    let close = text.rfind(')')?;
    (close > open).then_some((open, close))
}

/// Remove one level of enclosing double quotes
fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn unquote_arg(arg: &str) -> &str {
    strip_quotes(arg.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_with_key() {
        let parsed = parse(r#"query(get("k1"))"#).unwrap();
        assert_eq!(parsed.verb, Verb::Get);
        assert_eq!(parsed.key.as_deref(), Some("k1"));
        assert_eq!(parsed.value, None);
        assert!(parsed.filter.is_empty());
    }

    #[test]
    fn test_put_with_value_and_predicates() {
        let parsed =
            parse(r#"query(put("k1","v1"))&objPur("ads,analytics")&!sessionKeyIs("user2")"#)
                .unwrap();
        assert_eq!(parsed.verb, Verb::Put);
        assert_eq!(parsed.key.as_deref(), Some("k1"));
        assert_eq!(parsed.value.as_deref(), Some("v1"));
        assert_eq!(
            parsed.filter.to_string(),
            " -objPur ads,analytics -sessionKeyIs !user2"
        );
    }

    #[test]
    fn test_query_predicate_may_come_last() {
        let parsed = parse(r#"monitor("true")&query(getm("k"))"#).unwrap();
        assert_eq!(parsed.verb, Verb::GetM);
        assert_eq!(parsed.filter.to_string(), " -monitor true");
    }

    #[test]
    fn test_bare_verb_has_no_key() {
        let parsed = parse("query(get)&eq(x)").unwrap();
        assert_eq!(parsed.verb, Verb::Get);
        assert_eq!(parsed.key, None);
        assert_eq!(parsed.filter.to_string(), " -eq x");
    }

    #[test]
    fn test_every_filter_predicate() {
        for name in PredicateName::ALL
            .iter()
            .filter(|n| **n != PredicateName::Query)
        {
            let plain = parse(&format!("query(get)&{}(x)", name)).unwrap();
            assert_eq!(plain.verb, Verb::Get);
            assert_eq!(plain.filter.to_string(), format!(" -{} x", name));

            let negated = parse(&format!("query(get)&!{}(x)", name)).unwrap();
            assert_eq!(negated.filter.to_string(), format!(" -{} !x", name));
        }
    }

    #[test]
    fn test_value_with_commas_kept_whole() {
        let parsed = parse(r#"query(put("k","a,b,c"))"#).unwrap();
        assert_eq!(parsed.value.as_deref(), Some("a,b,c"));
    }

    #[test]
    fn test_disjunction_is_opaque() {
        let parsed = parse(r#"query(get("k"))&sessionKeyIs("a","b")"#).unwrap();
        assert_eq!(parsed.filter.terms()[0].value, r#"a","b"#);
    }

    #[test]
    fn test_verb_case_insensitive() {
        let parsed = parse(r#"query(getLogs("k"))"#).unwrap();
        assert_eq!(parsed.verb, Verb::GetLogs);
    }

    #[test]
    fn test_whitespace_trimmed() {
        let parsed = parse("  query(get(\"k\")) & objOrig(\"eu\")\n").unwrap();
        assert_eq!(parsed.filter.to_string(), " -objOrig eu");
    }

    #[test]
    fn test_unsupported_predicate() {
        assert_eq!(
            parse("fooBar(1)&query(get)"),
            Err(QueryError::UnsupportedPredicate("fooBar".into()))
        );
    }

    #[test]
    fn test_unsupported_verb() {
        assert_eq!(
            parse("query(exit)"),
            Err(QueryError::UnsupportedVerb("exit".into()))
        );
    }

    #[test]
    fn test_missing_parentheses() {
        assert!(matches!(
            parse("query(get(\"k\"))&objPur"),
            Err(QueryError::MalformedQuery(_))
        ));
        assert!(matches!(
            parse("query(get(\"k\""),
            Err(QueryError::MalformedQuery(_))
        ));
        assert!(matches!(parse("objPur)x("), Err(QueryError::MalformedQuery(_))));
    }

    #[test]
    fn test_missing_query_predicate() {
        assert!(matches!(
            parse("objPur(\"ads\")"),
            Err(QueryError::MalformedQuery(_))
        ));
    }

    #[test]
    fn test_duplicate_or_negated_query() {
        assert!(matches!(
            parse("query(get)&query(put(\"k\",\"v\"))"),
            Err(QueryError::MalformedQuery(_))
        ));
        assert!(matches!(
            parse("!query(get)"),
            Err(QueryError::MalformedQuery(_))
        ));
    }

    #[test]
    fn test_empty_segments() {
        assert!(matches!(parse(""), Err(QueryError::MalformedQuery(_))));
        assert!(matches!(
            parse("query(get)&"),
            Err(QueryError::MalformedQuery(_))
        ));
        assert!(matches!(
            parse("query()"),
            Err(QueryError::MalformedQuery(_))
        ));
    }

    #[test]
    fn test_put_requires_value() {
        assert_eq!(
            parse(r#"query(put("k1"))"#),
            Err(QueryError::MissingValue("k1".into()))
        );
        assert_eq!(
            parse(r#"query(put("k1",""))"#),
            Err(QueryError::MissingValue("k1".into()))
        );
    }

    #[test]
    fn test_strip_quotes_one_level() {
        assert_eq!(strip_quotes("\"\"x\"\""), "\"x\"");
        assert_eq!(strip_quotes("\""), "\"");
        assert_eq!(strip_quotes("plain"), "plain");
    }
}
