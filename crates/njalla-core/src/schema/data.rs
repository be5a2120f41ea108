//! Field storage for a single resource instance

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// A single field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer field
    Int(i64),
    /// String field
    String(String),
}

impl Value {
    /// The kind of this value
    pub fn kind(&self) -> super::FieldKind {
        match self {
            Value::Int(_) => super::FieldKind::Int,
            Value::String(_) => super::FieldKind::String,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// Identity and field values of one resource instance
///
/// An instance without an ID does not exist remotely. Resources clear
/// the ID when a read finds the remote object gone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    id: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

impl ResourceData {
    /// Create empty data with no identity
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// The resource identity, if the resource exists
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether an identity is set
    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    /// Set the resource identity
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Clear the resource identity, marking it absent remotely
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Set a field
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Raw field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a field
    pub fn unset(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Typed string lookup
    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.fields.get(key) {
            Some(Value::String(v)) => Ok(v),
            Some(other) => Err(Error::invalid_input(format!(
                "field {key} must be a string, got {other}"
            ))),
            None => Err(Error::invalid_input(format!("field {key} is not set"))),
        }
    }

    /// Typed integer lookup
    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.fields.get(key) {
            Some(Value::Int(v)) => Ok(*v),
            Some(other) => Err(Error::invalid_input(format!(
                "field {key} must be an integer, got {other}"
            ))),
            None => Err(Error::invalid_input(format!("field {key} is not set"))),
        }
    }

    /// Iterate fields in key order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_lifecycle() {
        let mut data = ResourceData::new();
        assert!(!data.has_id());

        data.set_id("42");
        assert_eq!(data.id(), Some("42"));

        data.clear_id();
        assert_eq!(data.id(), None);
    }

    #[test]
    fn test_typed_getters() {
        let data = ResourceData::new()
            .with("domain", "example.com")
            .with("ttl", 3600i64);

        assert_eq!(data.get_str("domain").unwrap(), "example.com");
        assert_eq!(data.get_int("ttl").unwrap(), 3600);

        assert!(matches!(data.get_int("domain"), Err(Error::InvalidInput(_))));
        assert!(matches!(data.get_str("ttl"), Err(Error::InvalidInput(_))));
        assert!(matches!(data.get_str("missing"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_serde_shape() {
        let mut data = ResourceData::new().with("ttl", 60i64).with("name", "@");
        data.set_id("7");

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "7", "fields": {"name": "@", "ttl": 60}})
        );

        let back: ResourceData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }
}
