//! Predicate AST
//!
//! Predicates are plain values: they derive `Eq` and `Hash` so the result
//! cache can key on them structurally. Literals are stored as `IndexKey`.

use std::fmt;
use std::ops;

use serde_json::{Map, Value};

use crate::executor::PredicateFilter;
use crate::index::IndexKey;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// field == value
    Eq,
    /// field != value
    Ne,
    /// field < value
    Lt,
    /// field <= value
    Le,
    /// field > value
    Gt,
    /// field >= value
    Ge,
}

impl CompareOp {
    /// Operator symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// Evaluate `actual op literal`.
    ///
    /// Equality compares keys. Ordering only holds between keys of the same
    /// orderable class (bool, number, string); anything else is no match.
    pub fn holds(&self, actual: &IndexKey, literal: &IndexKey) -> bool {
        match self {
            CompareOp::Eq => actual == literal,
            CompareOp::Ne => actual != literal,
            _ if !(actual.is_orderable() && actual.same_class(literal)) => false,
            CompareOp::Lt => actual < literal,
            CompareOp::Le => actual <= literal,
            CompareOp::Gt => actual > literal,
            CompareOp::Ge => actual >= literal,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Path to a (possibly nested) document field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Path to a top-level field
    pub fn new(field: impl Into<String>) -> Self {
        FieldPath(vec![field.into()])
    }

    /// Path extended by one nested segment
    pub fn child(mut self, field: impl Into<String>) -> Self {
        self.0.push(field.into());
        self
    }

    /// The field name if the path has exactly one segment
    pub fn single(&self) -> Option<&str> {
        match self.0.as_slice() {
            [field] => Some(field),
            _ => None,
        }
    }

    /// Follow the path into a document body
    pub fn resolve<'a>(&self, body: &'a Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        let mut current = body.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A condition evaluable against a document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// Single-field comparison against a literal
    Compare {
        op: CompareOp,
        path: FieldPath,
        value: IndexKey,
    },
    /// Field is present
    Exists { path: FieldPath },
    /// String field matches a regex anchored at its start
    Matches { path: FieldPath, pattern: String },
    /// String field contains a regex match anywhere
    Search { path: FieldPath, pattern: String },
    /// Field equals one of the listed values
    OneOf { path: FieldPath, values: Vec<IndexKey> },
    /// Negation
    Not(Box<Predicate>),
    /// Both hold
    And(Box<Predicate>, Box<Predicate>),
    /// Either holds
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Evaluate against a document body
    pub fn matches(&self, body: &Map<String, Value>) -> bool {
        PredicateFilter::matches(body, self)
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(other))
    }
}

impl ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.negate()
    }
}

impl ops::BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(rhs)
    }
}

impl ops::BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        self.or(rhs)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { op, path, value } => write!(f, "{} {} {}", path, op, value),
            Predicate::Exists { path } => write!(f, "exists({})", path),
            Predicate::Matches { path, pattern } => write!(f, "{} matches {:?}", path, pattern),
            Predicate::Search { path, pattern } => write!(f, "{} search {:?}", path, pattern),
            Predicate::OneOf { path, values } => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{} in [{}]", path, values.join(", "))
            }
            Predicate::Not(inner) => write!(f, "not ({})", inner),
            Predicate::And(a, b) => write!(f, "({}) and ({})", a, b),
            Predicate::Or(a, b) => write!(f, "({}) or ({})", a, b),
        }
    }
}

/// Predicate builder rooted at a field
///
/// ```ignore
/// let adults = field("age").ge(18) & field("address").at("city").eq("Oslo");
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    path: FieldPath,
}

/// Start a predicate on a top-level field
pub fn field(name: impl Into<String>) -> Field {
    Field {
        path: FieldPath::new(name),
    }
}

impl Field {
    /// Descend into a nested field
    pub fn at(self, name: impl Into<String>) -> Field {
        Field {
            path: self.path.child(name),
        }
    }

    fn compare(self, op: CompareOp, value: impl Into<Value>) -> Predicate {
        Predicate::Compare {
            op,
            path: self.path,
            value: IndexKey::from_json(&value.into()),
        }
    }

    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    pub fn lt(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Lt, value)
    }

    pub fn le(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Le, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Gt, value)
    }

    pub fn ge(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ge, value)
    }

    pub fn exists(self) -> Predicate {
        Predicate::Exists { path: self.path }
    }

    /// Regex match anchored at the start of the string
    pub fn matches(self, pattern: impl Into<String>) -> Predicate {
        Predicate::Matches {
            path: self.path,
            pattern: pattern.into(),
        }
    }

    /// Regex match anywhere in the string
    pub fn search(self, pattern: impl Into<String>) -> Predicate {
        Predicate::Search {
            path: self.path,
            pattern: pattern.into(),
        }
    }

    pub fn one_of<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::OneOf {
            path: self.path,
            values: values
                .into_iter()
                .map(|v| IndexKey::from_json(&v.into()))
                .collect(),
        }
    }
}
