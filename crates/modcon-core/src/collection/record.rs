//! Opaque record values served by the dashboard backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModconError, Result};

/// One moderatable record.
///
/// The console never interprets a record beyond the handful of fields actions
/// need to build a mutation or a navigation target, so the backing value is
/// kept as a JSON object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Builds a record from an arbitrary JSON value. Non-objects are rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(ModconError::Serialization {
                format: "JSON".to_string(),
                message: format!("expected record object, got {}", type_name(&other)),
            }),
        }
    }

    /// Record identifier: `id`, falling back to the storage key `_id`.
    pub fn id(&self) -> Option<String> {
        ["id", "_id"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(scalar_to_string))
    }

    /// Like [`Record::id`] but an error when absent.
    pub fn require_id(&self) -> Result<String> {
        self.id()
            .ok_or_else(|| ModconError::not_found("record field", "id"))
    }

    /// Looks up a dotted path such as `owner.id`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// String value at a dotted path. Numbers are rendered.
    pub fn str_at(&self, path: &str) -> Option<String> {
        self.get(path).and_then(scalar_to_string)
    }

    /// Like [`Record::str_at`] but an error when absent.
    pub fn require_str(&self, path: &str) -> Result<String> {
        self.str_at(path)
            .ok_or_else(|| ModconError::not_found("record field", path))
    }

    /// Boolean field; anything other than `true` reads as false.
    pub fn flag(&self, field: &str) -> bool {
        matches!(self.get(field), Some(Value::Bool(true)))
    }

    /// Whether `field` holds a nested object (e.g. a timeout's `bot`).
    pub fn has_object(&self, field: &str) -> bool {
        matches!(self.get(field), Some(Value::Object(_)))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
