//! BTreeMap-based field index
//!
//! A field index maps `IndexKey -> Vec<DocId>`, ids sorted ascending within a
//! key. Iteration follows key order, which is what range queries return.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Bound;

use serde_json::{Map, Value};

use super::errors::{IndexError, IndexResult};
use crate::planner::CompareOp;

/// Document identity assigned by the table
pub type DocId = u64;

/// Exact numeric key.
///
/// Integral values within `i128` are held as integers, so distinct JSON
/// integers never collapse onto one key. Everything else is held as a float.
/// Ordering compares the two forms by exact value; `1` and `1.0` are the
/// same key.
#[derive(Debug, Clone, Copy)]
pub struct NumberKey(Repr);

#[derive(Debug, Clone, Copy)]
enum Repr {
    Int(i128),
    /// Never NaN, never integral inside the `i128` range
    Float(f64),
}

/// 2^127, the first float magnitude outside the `i128` range
const INT_LIMIT: f64 = i128::MAX as f64;

impl NumberKey {
    pub fn from_int(v: i128) -> Self {
        NumberKey(Repr::Int(v))
    }

    /// `None` for NaN
    pub fn from_f64(v: f64) -> Option<Self> {
        if v.is_nan() {
            return None;
        }
        if v.fract() == 0.0 && v.abs() < INT_LIMIT {
            return Some(NumberKey(Repr::Int(v as i128)));
        }
        Some(NumberKey(Repr::Float(v)))
    }

    /// Nearest float; exact only below 2^53
    pub fn as_f64(&self) -> f64 {
        match self.0 {
            Repr::Int(i) => i as f64,
            Repr::Float(f) => f,
        }
    }

    pub fn to_json(&self) -> Value {
        match self.0 {
            Repr::Int(i) => {
                if let Ok(v) = i64::try_from(i) {
                    Value::from(v)
                } else if let Ok(v) = u64::try_from(i) {
                    Value::from(v)
                } else {
                    Value::from(i as f64)
                }
            }
            Repr::Float(f) => Value::from(f),
        }
    }
}

/// `f` is non-integral or outside the `i128` range, so it never equals `i`.
fn cmp_int_float(i: i128, f: f64) -> Ordering {
    if f >= INT_LIMIT {
        Ordering::Less
    } else if f <= -INT_LIMIT {
        Ordering::Greater
    } else if i <= f.floor() as i128 {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

impl Ord for NumberKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Repr::Int(a), Repr::Int(b)) => a.cmp(&b),
            (Repr::Float(a), Repr::Float(b)) => a.total_cmp(&b),
            (Repr::Int(a), Repr::Float(b)) => cmp_int_float(a, b),
            (Repr::Float(a), Repr::Int(b)) => cmp_int_float(b, a).reverse(),
        }
    }
}

impl PartialOrd for NumberKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NumberKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumberKey {}

impl Hash for NumberKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.0 {
            Repr::Int(i) => {
                state.write_u8(0);
                i.hash(state);
            }
            Repr::Float(f) => {
                state.write_u8(1);
                f.to_bits().hash(state);
            }
        }
    }
}

/// Index key derived from a JSON value.
///
/// Every JSON value has a key, so a document holding the field always lands
/// in the index. Ordering is total across classes:
/// Null < Bool < Number < String < Composite.
///
/// Integers and floats share the `Number` class and compare by exact numeric
/// value. Arrays and objects are keyed by their canonical JSON text and only
/// support equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    /// JSON null
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer or float
    Number(NumberKey),
    /// String value
    String(String),
    /// Array or object, canonical JSON text
    Composite(String),
}

impl IndexKey {
    /// Create a key from an integer
    pub fn from_int(v: i64) -> Self {
        IndexKey::Number(NumberKey::from_int(v.into()))
    }

    pub fn from_u64(v: u64) -> Self {
        IndexKey::Number(NumberKey::from_int(v.into()))
    }

    /// Create a key from a float. NaN keys as `Null`, the same value
    /// `serde_json` gives it.
    pub fn from_float(v: f64) -> Self {
        NumberKey::from_f64(v).map_or(IndexKey::Null, IndexKey::Number)
    }

    /// Create a key from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Create a key from any JSON value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => IndexKey::Null,
            Value::Bool(b) => IndexKey::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    IndexKey::from_int(i)
                } else if let Some(u) = n.as_u64() {
                    IndexKey::from_u64(u)
                } else {
                    IndexKey::from_float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => IndexKey::String(s.clone()),
            Value::Array(_) | Value::Object(_) => IndexKey::Composite(value.to_string()),
        }
    }

    /// Numeric value for `Number` keys, rounded to the nearest float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            IndexKey::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// Returns true if both keys belong to the same class
    pub fn same_class(&self, other: &IndexKey) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Returns true if keys of this class support `<`, `<=`, `>`, `>=`
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            IndexKey::Bool(_) | IndexKey::Number(_) | IndexKey::String(_)
        )
    }

    /// Smallest key of this class, for orderable classes
    fn class_floor(&self) -> Option<IndexKey> {
        match self {
            IndexKey::Bool(_) => Some(IndexKey::Bool(false)),
            IndexKey::Number(_) => Some(IndexKey::from_float(f64::NEG_INFINITY)),
            IndexKey::String(_) => Some(IndexKey::String(String::new())),
            IndexKey::Null | IndexKey::Composite(_) => None,
        }
    }

    /// JSON value this key was derived from (integral floats come back as
    /// integers)
    pub fn to_json(&self) -> Value {
        match self {
            IndexKey::Null => Value::Null,
            IndexKey::Bool(b) => Value::Bool(*b),
            IndexKey::Number(n) => n.to_json(),
            IndexKey::String(s) => Value::String(s.clone()),
            IndexKey::Composite(text) => serde_json::from_str(text).unwrap_or(Value::Null),
        }
    }
}

impl From<&Value> for IndexKey {
    fn from(value: &Value) -> Self {
        IndexKey::from_json(value)
    }
}

impl From<Value> for IndexKey {
    fn from(value: Value) -> Self {
        IndexKey::from_json(&value)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::String(s) => write!(f, "{:?}", s),
            IndexKey::Composite(text) => f.write_str(text),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// Sorted index over one document field.
///
/// Holds document ids, never document bodies; callers resolve ids against the
/// table.
#[derive(Debug, Clone)]
pub struct FieldIndex {
    field: String,
    tree: BTreeMap<IndexKey, Vec<DocId>>,
    len: usize,
}

impl FieldIndex {
    /// Creates an empty index over `field`
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            tree: BTreeMap::new(),
            len: 0,
        }
    }

    /// Name of the indexed field
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Extract this index's key from a document body
    pub fn key_of(&self, body: &Map<String, Value>) -> IndexResult<IndexKey> {
        body.get(&self.field)
            .map(IndexKey::from_json)
            .ok_or_else(|| IndexError::missing_field(&self.field))
    }

    /// Add a document under its key.
    ///
    /// Fails with `MissingField` if the body lacks the indexed field; the
    /// index is left unchanged in that case.
    pub fn add(&mut self, id: DocId, body: &Map<String, Value>) -> IndexResult<()> {
        let key = self.key_of(body)?;
        self.insert_key(key, id);
        Ok(())
    }

    fn insert_key(&mut self, key: IndexKey, id: DocId) {
        let ids = self.tree.entry(key).or_default();
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
            self.len += 1;
        }
    }

    /// Remove one occurrence of a document, located by its key.
    ///
    /// Returns false if the document was not indexed under that key.
    pub fn remove(&mut self, id: DocId, body: &Map<String, Value>) -> bool {
        let Ok(key) = self.key_of(body) else {
            return false;
        };
        let Some(ids) = self.tree.get_mut(&key) else {
            return false;
        };
        let removed = match ids.binary_search(&id) {
            Ok(pos) => {
                ids.remove(pos);
                self.len -= 1;
                true
            }
            Err(_) => false,
        };
        if ids.is_empty() {
            self.tree.remove(&key);
        }
        removed
    }

    /// All documents whose key satisfies `key op value`, in key order.
    ///
    /// Agrees with [`CompareOp::holds`]: ordering operators stay within the
    /// value's class, `!=` spans every other key.
    pub fn range(&self, op: CompareOp, value: &IndexKey) -> Vec<DocId> {
        match op {
            CompareOp::Eq => self.lookup_eq(value),
            CompareOp::Ne => {
                let below = self
                    .tree
                    .range::<IndexKey, _>((Bound::Unbounded, Bound::Excluded(value)));
                let above = self
                    .tree
                    .range::<IndexKey, _>((Bound::Excluded(value), Bound::Unbounded));
                below
                    .chain(above)
                    .flat_map(|(_, ids)| ids.iter().copied())
                    .collect()
            }
            CompareOp::Lt | CompareOp::Le => {
                let Some(floor) = value.class_floor() else {
                    return Vec::new();
                };
                let upper = if op == CompareOp::Le {
                    Bound::Included(value)
                } else {
                    Bound::Excluded(value)
                };
                self.tree
                    .range::<IndexKey, _>((Bound::Included(&floor), upper))
                    .flat_map(|(_, ids)| ids.iter().copied())
                    .collect()
            }
            CompareOp::Gt | CompareOp::Ge => {
                if !value.is_orderable() {
                    return Vec::new();
                }
                let lower = if op == CompareOp::Ge {
                    Bound::Included(value)
                } else {
                    Bound::Excluded(value)
                };
                self.tree
                    .range::<IndexKey, _>((lower, Bound::Unbounded))
                    .take_while(|(key, _)| key.same_class(value))
                    .flat_map(|(_, ids)| ids.iter().copied())
                    .collect()
            }
        }
    }

    /// All documents whose key equals `key`
    pub fn lookup_eq(&self, key: &IndexKey) -> Vec<DocId> {
        self.tree.get(key).cloned().unwrap_or_default()
    }

    /// `(key, id)` pairs in key order
    pub fn entries(&self) -> impl Iterator<Item = (&IndexKey, DocId)> + '_ {
        self.tree
            .iter()
            .flat_map(|(key, ids)| ids.iter().map(move |id| (key, *id)))
    }

    /// Every indexed id, in key order
    pub fn ids(&self) -> Vec<DocId> {
        self.entries().map(|(_, id)| id).collect()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
        self.len = 0;
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
