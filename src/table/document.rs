//! Stored documents

use serde::Serialize;
use serde_json::{Map, Value};

pub use crate::index::DocId;

/// A document body together with the id the table assigned to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: DocId,
    pub body: Map<String, Value>,
}

impl Document {
    pub fn new(id: DocId, body: Map<String, Value>) -> Self {
        Self { id, body }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }

    /// The body as a JSON object, without the id
    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}
