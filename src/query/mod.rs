//! Predicate query language
//!
//! Turns trace lines such as
//! `query(put("k","v"))&objExp("30")&!objShareIs("thirdparty")` into a verb,
//! key, optional value and an ordered [`Filter`]. Policy semantics are not
//! evaluated here; predicate values are opaque strings.

mod errors;
mod parser;
mod predicate;
mod verb;

pub use errors::{QueryError, QueryResult};
pub use parser::{parse, ParsedQuery};
pub use predicate::{Filter, FilterTerm, PredicateName};
pub use verb::Verb;
