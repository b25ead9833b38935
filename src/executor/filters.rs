//! Predicate evaluation against document bodies
//!
//! Comparisons go through `IndexKey`, the same keys field indexes are built
//! from, so a scan and an index lookup agree on every document.
//! A missing field never matches a comparison.

use regex::Regex;
use serde_json::{Map, Value};

use crate::index::IndexKey;
use crate::planner::{FieldPath, Predicate};

/// Evaluates predicates against documents
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a document body satisfies a predicate
    pub fn matches(body: &Map<String, Value>, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Compare { op, path, value } => match path.resolve(body) {
                Some(actual) => op.holds(&IndexKey::from_json(actual), value),
                None => false,
            },
            Predicate::Exists { path } => path.resolve(body).is_some(),
            Predicate::Matches { path, pattern } => {
                Self::regex_match(body, path, &format!("^(?:{})", pattern))
            }
            Predicate::Search { path, pattern } => Self::regex_match(body, path, pattern),
            Predicate::OneOf { path, values } => match path.resolve(body) {
                Some(actual) => values.contains(&IndexKey::from_json(actual)),
                None => false,
            },
            Predicate::Not(inner) => !Self::matches(body, inner),
            Predicate::And(a, b) => Self::matches(body, a) && Self::matches(body, b),
            Predicate::Or(a, b) => Self::matches(body, a) || Self::matches(body, b),
        }
    }

    /// Regex test on a string field; invalid patterns and non-strings never match
    fn regex_match(body: &Map<String, Value>, path: &FieldPath, pattern: &str) -> bool {
        let Some(Value::String(text)) = path.resolve(body) else {
            return false;
        };
        match Regex::new(pattern) {
            Ok(re) => re.is_match(text),
            Err(_) => false,
        }
    }
}
