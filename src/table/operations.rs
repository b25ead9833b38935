//! Document updates
//!
//! An `Update` either merges fields into the document or runs a caller
//! function over it. The helpers below build common transforms.
//!
//! ```ignore
//! table.update(operations::increment("visits"), Some(&field("id").eq(7)), None)?;
//! ```

use std::fmt;

use serde_json::{Map, Number, Value};

use super::errors::{TableError, TableResult};

/// Function applied to a document body in place
pub type Transform<'a> = Box<dyn Fn(&mut Map<String, Value>) + 'a>;

/// Change applied to every selected document
pub enum Update<'a> {
    /// Set every field of the object, keeping the others
    Fields(Value),
    /// Run a function over the body
    Transform(Transform<'a>),
}

impl<'a> Update<'a> {
    pub fn transform(f: impl Fn(&mut Map<String, Value>) + 'a) -> Self {
        Update::Transform(Box::new(f))
    }

    /// Fails when a field update is not a JSON object
    pub fn validate(&self) -> TableResult<()> {
        match self {
            Update::Fields(Value::Object(_)) | Update::Transform(_) => Ok(()),
            Update::Fields(other) => Err(TableError::invalid_document(other)),
        }
    }

    /// Apply to a body in place
    pub fn apply(&self, body: &mut Map<String, Value>) {
        match self {
            Update::Fields(Value::Object(fields)) => {
                for (key, value) in fields {
                    body.insert(key.clone(), value.clone());
                }
            }
            Update::Fields(_) => {}
            Update::Transform(f) => f(body),
        }
    }
}

impl fmt::Debug for Update<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Update::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl From<Value> for Update<'_> {
    fn from(fields: Value) -> Self {
        Update::Fields(fields)
    }
}

impl From<Map<String, Value>> for Update<'_> {
    fn from(fields: Map<String, Value>) -> Self {
        Update::Fields(Value::Object(fields))
    }
}

/// Remove a field
pub fn delete(field: impl Into<String>) -> Update<'static> {
    let field = field.into();
    Update::transform(move |body| {
        body.remove(&field);
    })
}

/// Set a field to a value
pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Update<'static> {
    let field = field.into();
    let value = value.into();
    Update::transform(move |body| {
        body.insert(field.clone(), value.clone());
    })
}

/// Add one to a numeric field
pub fn increment(field: impl Into<String>) -> Update<'static> {
    add(field, 1)
}

/// Subtract one from a numeric field
pub fn decrement(field: impl Into<String>) -> Update<'static> {
    add(field, -1)
}

/// Add `n` to a numeric field
pub fn add(field: impl Into<String>, n: impl Into<Value>) -> Update<'static> {
    shift(field.into(), n.into(), false)
}

/// Subtract `n` from a numeric field
pub fn subtract(field: impl Into<String>, n: impl Into<Value>) -> Update<'static> {
    shift(field.into(), n.into(), true)
}

fn shift(field: String, delta: Value, negate: bool) -> Update<'static> {
    Update::transform(move |body| {
        let (Some(Value::Number(current)), Value::Number(delta)) = (body.get(&field), &delta)
        else {
            return;
        };
        if let Some(result) = shift_number(current, delta, negate) {
            body.insert(field.clone(), Value::Number(result));
        }
    })
}

/// Integer arithmetic while both sides are integers and it does not
/// overflow, float arithmetic otherwise.
fn shift_number(current: &Number, delta: &Number, negate: bool) -> Option<Number> {
    if let (Some(a), Some(b)) = (current.as_i64(), delta.as_i64()) {
        let sum = if negate { a.checked_sub(b) } else { a.checked_add(b) };
        if let Some(sum) = sum {
            return Some(Number::from(sum));
        }
    }

    let a = current.as_f64()?;
    let b = delta.as_f64()?;
    Number::from_f64(if negate { a - b } else { a + b })
}
